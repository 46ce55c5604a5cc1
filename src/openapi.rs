use axum::Router;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::app::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "meme-relay",
        description = "上游表情包接口中转服务"
    ),
    paths(
        crate::handlers::meme::list_memes,
        crate::handlers::meme::archive,
        crate::handlers::meme::health_check,
        crate::handlers::meme::get_metrics
    ),
    components(
        schemas(
            crate::models::meme::Meme,
            crate::handlers::meme::ArchiveQuery,
            crate::utils::error::ErrorBody,
            crate::services::archive::ArchiveReport
        )
    ),
    tags(
        (name = "memes", description = "表情包相关API"),
        (name = "monitoring", description = "监控指标")
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> Router<Arc<AppState>> {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
