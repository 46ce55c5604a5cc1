use axum::{
    extract::ConnectInfo,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{OnResponse, TraceLayer},
};
use tracing::{info, Level, Span};

use crate::config::Config;
use crate::handlers;
use crate::openapi;
use crate::services::upstream::UpstreamClient;
use crate::utils::error::Result;

/// 所有请求共享的只读状态
#[derive(Debug)]
pub struct AppState {
    pub config: Arc<Config>,
    pub upstream: UpstreamClient,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Result<Arc<Self>> {
        let upstream = UpstreamClient::new(config.upstream.timeout_secs)?;
        Ok(Arc::new(Self { config, upstream }))
    }
}

#[derive(Clone)]
struct CustomOnResponse;

impl<B> OnResponse<B> for CustomOnResponse {
    fn on_response(self, response: &axum::response::Response<B>, latency: Duration, span: &Span) {
        let status = response.status();
        info!(parent: span,
            status = %status,
            latency = ?latency,
            "响应完成"
        );
    }
}

fn client_ip<B>(request: &axum::http::Request<B>, config: &Config) -> String {
    if config.server.proxy.enabled {
        request
            .headers()
            .get(&config.server.proxy.ip_header)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    } else {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

// 构建应用路由
pub fn build_router(state: Arc<AppState>) -> Router {
    // 配置 CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let config = Arc::clone(&state.config);

    Router::new()
        .route("/", get(|| async { axum::response::Redirect::to("/swagger-ui") }))
        .route("/memes", get(handlers::meme::list_memes))
        .route("/memes/archive", post(handlers::meme::archive))
        .route("/memes/health", get(handlers::meme::health_check))
        .route("/metrics", get(handlers::meme::get_metrics))
        .merge(openapi::swagger_ui())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(move |request: &axum::http::Request<_>| {
                    let remote_addr = client_ip(request, &config);

                    tracing::span!(
                        Level::INFO,
                        "请求",
                        method = %request.method(),
                        uri = %request.uri(),
                        ip = %remote_addr,
                    )
                })
                .on_response(CustomOnResponse),
        )
        .layer(cors)
        .with_state(state)
}
