use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::metrics::{ARCHIVE_RUNS, REQUEST_COUNTER, RESPONSE_TIME};
use crate::models::meme::Meme;
use crate::services::archive::{archive_memes, ArchiveReport};
use crate::utils::error::{ErrorBody, Result};

#[derive(Deserialize, ToSchema, utoipa::IntoParams)]
pub struct ArchiveQuery {
    /// 名称过滤关键字，缺省使用配置中的值
    #[schema(example = "The ")]
    keyword: Option<String>,
}

/// 获取上游表情包列表
#[utoipa::path(
    get,
    path = "/memes",
    tag = "memes",
    responses(
        (status = 200, description = "上游 data.memes 原样返回", body = [Meme]),
        (status = 500, description = "服务器内部错误", body = ErrorBody)
    )
)]
pub async fn list_memes(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    REQUEST_COUNTER.inc();
    let _timer = crate::metrics::Timer::new(&RESPONSE_TIME);

    let url = state.config.upstream.meme_url()?;
    let memes = state.upstream.fetch_route_memes(url).await?;

    info!(
        count = memes.as_array().map(Vec::len).unwrap_or_default(),
        "Serving meme list"
    );
    Ok(Json(memes))
}

/// 拉取、加密缓存表情包列表并随机下载一张图片
#[utoipa::path(
    post,
    path = "/memes/archive",
    tag = "memes",
    params(ArchiveQuery),
    responses(
        (status = 200, description = "归档完成", body = ArchiveReport),
        (status = 500, description = "服务器内部错误", body = ErrorBody)
    )
)]
pub async fn archive(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ArchiveQuery>,
) -> Result<Json<ArchiveReport>> {
    REQUEST_COUNTER.inc();
    let _timer = crate::metrics::Timer::new(&RESPONSE_TIME);

    let report = archive_memes(&state.upstream, &state.config, query.keyword.as_deref()).await?;
    ARCHIVE_RUNS.inc();

    info!(
        total = report.total,
        matched = report.matched,
        image_bytes = report.image_bytes,
        "Archive completed"
    );
    Ok(Json(report))
}

/// 健康检查
#[utoipa::path(
    get,
    path = "/memes/health",
    tag = "memes",
    responses(
        (status = 200, description = "服务健康")
    )
)]
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// 获取Prometheus指标
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "monitoring",
    responses(
        (status = 200, description = "Prometheus metrics", content_type = "text/plain")
    )
)]
pub async fn get_metrics() -> impl IntoResponse {
    let metrics = crate::metrics::get_metrics();
    (StatusCode::OK, [("Content-Type", "text/plain; charset=utf-8")], metrics)
}
