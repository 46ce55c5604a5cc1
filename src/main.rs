use std::net::SocketAddr;
use std::time::SystemTime;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::utils::error::AppError;

mod app;
mod config;
mod crypto;
mod handlers;
mod metrics;
mod models;
mod openapi;
mod services;
mod utils;

#[cfg(test)]
mod test_support;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 中的 MEME_URL 等变量
    dotenvy::dotenv().ok();

    // 初始化指标
    metrics::init_metrics()?;
    metrics::set_service_start_time(SystemTime::now());

    // 加载配置文件
    let config = config::Config::load_from_file("config.yml")?;

    // 确保日志目录存在
    std::fs::create_dir_all(&config.logging.directory)?;

    // 设置文件日志appender
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&config.logging.file_prefix)
        .filename_suffix("log")
        .build(&config.logging.directory)?;

    // 初始化日志系统
    let log_level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(log_level))
        .with(tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_target(false))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .init();

    tracing::info!("日志系统初始化完成");
    tracing::info!("Configuration loaded successfully");
    if config.upstream.meme_url().is_err() {
        tracing::warn!("MEME_URL 未配置，/memes 请求将返回 500");
    }

    let state = app::AppState::new(config.clone())?;
    let app = app::build_router(state);

    // 设置服务器地址
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid address: {}", e)))?;

    // 启动服务器
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("服务器启动在 {}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>()
    ).await?;

    Ok(())
}
