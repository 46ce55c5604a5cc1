use std::path::Path;

use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::utils::error::Result;

/// 把加密后的 JSON 写入文件，文件存在时整体覆盖
pub async fn write_encrypted_payload(path: impl AsRef<Path>, payload: &str) -> Result<()> {
    let path = path.as_ref();
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(payload.as_bytes()).await?;
    file.sync_all().await?;

    debug!(path = %path.display(), bytes = payload.len(), "加密 JSON 已写入缓存");
    Ok(())
}
