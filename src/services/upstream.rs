use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::metrics::UPSTREAM_FAILURES;
use crate::models::meme::Meme;
use crate::utils::error::{AppError, Result};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// 上游表情包接口客户端，进程内共享一个连接池
#[derive(Clone, Debug)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// 发起一次 GET，非 2xx 视为网络错误，不重试
    pub async fn get(&self, url: &str) -> Result<reqwest::Response> {
        debug!(%url, "GET upstream");
        let result = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        result.map_err(|e| {
            UPSTREAM_FAILURES.inc();
            warn!(%url, error = %e, "上游请求失败");
            AppError::from(e)
        })
    }

    /// 返回完整的响应体
    pub async fn read_meme_json(&self, url: &str) -> Result<Value> {
        let body = self.get(url).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// 响应体顶层的 `memes`，保留上游的全部字段
    pub async fn fetch_meme_values(&self, url: &str) -> Result<Value> {
        let mut body = self.read_meme_json(url).await?;
        let memes = body
            .get_mut("memes")
            .map(Value::take)
            .ok_or_else(|| AppError::Parse("response has no `memes` field".to_string()))?;

        Ok(memes)
    }

    /// 响应体顶层的 `memes` 数组
    pub async fn fetch_memes(&self, url: &str) -> Result<Vec<Meme>> {
        let memes = self.fetch_meme_values(url).await?;
        Ok(serde_json::from_value(memes)?)
    }

    /// `GET /memes` 使用的 `data.memes`，原样透传
    pub async fn fetch_route_memes(&self, url: &str) -> Result<Value> {
        let mut body = self.read_meme_json(url).await?;
        let memes = body
            .pointer_mut("/data/memes")
            .map(Value::take)
            .ok_or_else(|| AppError::Parse("response has no `data.memes` field".to_string()))?;

        Ok(memes)
    }
}
