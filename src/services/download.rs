use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::metrics::DOWNLOADED_BYTES;
use crate::models::meme::Meme;
use crate::services::upstream::UpstreamClient;
use crate::utils::error::{AppError, Result};

pub const IMAGE_FILE_NAME: &str = "random_meme.jpg";

#[derive(Debug, Clone, Serialize)]
pub struct DownloadedImage {
    pub meme_id: String,
    pub path: PathBuf,
    pub bytes: u64,
    pub sha256: String,
}

/// 均匀随机选一个表情包
pub fn pick_random(memes: &[Meme]) -> Result<&Meme> {
    if memes.is_empty() {
        return Err(AppError::Validation("No memes found in the response".to_string()));
    }
    Ok(&memes[fastrand::usize(..memes.len())])
}

/// 随机下载一张表情包图片到 `<directory>/random_meme.jpg`
///
/// 每次下载先写入同目录下独立的临时文件，落盘后再原子替换目标文件，
/// 所以目标文件始终是某一次完整的下载。失败时临时文件随 drop 删除。
pub async fn download_random_image(
    upstream: &UpstreamClient,
    memes: &[Meme],
    directory: impl AsRef<Path>,
) -> Result<DownloadedImage> {
    let meme = pick_random(memes)?;
    let directory = directory.as_ref();
    let target = directory.join(IMAGE_FILE_NAME);

    let staging = tempfile::Builder::new()
        .prefix(".random_meme-")
        .suffix(".part")
        .tempfile_in(directory)?;
    let file = tokio::fs::File::from_std(staging.reopen()?);

    let (bytes, sha256) = stream_into(upstream, &meme.url, file).await?;

    staging
        .persist(&target)
        .map_err(|e| AppError::Io(e.error))?;
    DOWNLOADED_BYTES.inc_by(bytes as f64);

    info!(
        meme_id = %meme.id,
        url = %meme.url,
        bytes,
        path = %target.display(),
        "随机表情包下载完成"
    );

    Ok(DownloadedImage {
        meme_id: meme.id.clone(),
        path: target,
        bytes,
        sha256,
    })
}

async fn stream_into(
    upstream: &UpstreamClient,
    url: &str,
    mut file: tokio::fs::File,
) -> Result<(u64, String)> {
    let mut response = upstream.get(url).await?;
    let mut hasher = Sha256::new();
    let mut written: u64 = 0;

    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        hasher.update(&chunk);
        written += chunk.len() as u64;
    }

    if written == 0 {
        return Err(AppError::Network(format!(
            "Failed to download meme image: empty body from {url}"
        )));
    }

    file.flush().await?;
    file.sync_all().await?;

    let digest = hasher.finalize();
    let sha256: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    Ok((written, sha256))
}
