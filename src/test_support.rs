//! 测试用的本地假上游：表情包列表接口和图片服务器。

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, MethodRouter},
    Json, Router,
};
use serde_json::{json, Value};

pub const IMAGE_BYTES: &[u8] = b"\xFF\xD8\xFF\xE0fake-jpeg-payload\xFF\xD9";

/// 在 127.0.0.1 的随机端口启动服务，返回 `http://host:port`
pub async fn spawn_upstream<F>(build: F) -> String
where
    F: FnOnce(&str) -> Router,
{
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let router = build(&base);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    base
}

pub fn json_route(body: Value) -> MethodRouter {
    get(move || {
        let body = body.clone();
        async move { Json(body) }
    })
}

/// 每次命中都会计数的 JSON 接口
pub fn counted_json_route(body: Value, hits: Arc<AtomicUsize>) -> MethodRouter {
    get(move || {
        hits.fetch_add(1, Ordering::SeqCst);
        let body = body.clone();
        async move { Json(body) }
    })
}

/// 图片地址指向同一个假上游的 `/images/<n>.jpg`
pub fn meme_list(base: &str, names: &[&str]) -> Value {
    let memes: Vec<Value> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            json!({
                "id": (i + 1).to_string(),
                "name": name,
                "url": format!("{base}/images/{}.jpg", i + 1),
                "width": 500,
                "height": 500,
                "box_count": 2,
                "captions": 1000
            })
        })
        .collect();
    Value::Array(memes)
}

async fn serve_image(Path(file): Path<String>) -> impl IntoResponse {
    match file.as_str() {
        "missing.jpg" => (StatusCode::NOT_FOUND, Vec::<u8>::new()).into_response(),
        "empty.jpg" => (StatusCode::OK, [(header::CONTENT_TYPE, "image/jpeg")], Vec::<u8>::new())
            .into_response(),
        _ => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "image/jpeg")],
            IMAGE_BYTES.to_vec(),
        )
            .into_response(),
    }
}

pub fn image_router() -> Router {
    Router::new().route("/images/:file", get(serve_image))
}

const TRICKLE_CHUNK: usize = 512;
const TRICKLE_CHUNKS: usize = 20;
pub const TRICKLE_LEN: usize = TRICKLE_CHUNK * TRICKLE_CHUNKS;

/// 逐块慢速返回图片的原始 HTTP 服务：路径以 `b.jpg` 结尾时全是 `B`，否则全是 `A`
pub async fn spawn_trickle_server() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 2048];
                let Ok(n) = socket.read(&mut buf).await else {
                    return;
                };
                let request = String::from_utf8_lossy(&buf[..n]);
                let request_line = request.lines().next().unwrap_or_default();
                let fill = if request_line.contains("b.jpg") { b'B' } else { b'A' };
                let head = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: image/jpeg\r\ncontent-length: {TRICKLE_LEN}\r\nconnection: close\r\n\r\n"
                );
                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                for _ in 0..TRICKLE_CHUNKS {
                    if socket.write_all(&[fill; TRICKLE_CHUNK]).await.is_err() {
                        return;
                    }
                    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                }
            });
        }
    });
    base
}
