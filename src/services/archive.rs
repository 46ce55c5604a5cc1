use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::info;
use utoipa::ToSchema;

use crate::config::Config;
use crate::crypto::{decrypt_json, encrypt_json};
use crate::models::meme::Meme;
use crate::services::{
    cache::write_encrypted_payload, download::download_random_image, filter::filter_by_name,
    locations::log_file_locations, upstream::UpstreamClient,
};
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ArchiveReport {
    /// 上游返回的表情包总数
    #[schema(example = 100)]
    pub total: usize,
    /// 名称包含关键字的数量
    #[schema(example = 7)]
    pub matched: usize,
    #[schema(example = "The ")]
    pub keyword: String,
    #[schema(value_type = String, example = "/tmp/memes.json.enc")]
    pub encrypted_json_path: PathBuf,
    #[schema(value_type = String, example = "/tmp/random_meme.jpg")]
    pub image_path: PathBuf,
    #[schema(example = 52311)]
    pub image_bytes: u64,
    pub image_sha256: String,
    #[schema(example = "2024-01-01T00:00:00Z")]
    pub archived_at: String,
}

/// 拉取列表 -> 统计/过滤 -> 加密 -> 写缓存 -> 下载随机图片 -> 记录位置
///
/// 所有配置项在发起任何网络请求之前校验。
pub async fn archive_memes(
    upstream: &UpstreamClient,
    config: &Config,
    keyword: Option<&str>,
) -> Result<ArchiveReport> {
    let url = config.upstream.meme_url()?;
    let key = config.archive.key()?;
    let iv = config.archive.iv()?;
    let keyword = keyword.unwrap_or(config.archive.keyword.as_str());
    let directory = config.archive.directory();

    tokio::fs::create_dir_all(&directory).await?;

    // 缓存原始 JSON，类型化的副本只用于过滤和下载
    let raw = upstream.fetch_meme_values(url).await?;
    let memes: Vec<Meme> = serde_json::from_value(raw.clone())?;
    let matched = filter_by_name(&memes, keyword).len();
    info!(total = memes.len(), matched, keyword, "表情包列表已获取");

    let encrypted = encrypt_json(&raw, key, iv)?;
    let encrypted_json_path = directory.join(&config.archive.json_filename);
    write_encrypted_payload(&encrypted_json_path, &encrypted).await?;
    verify_cache(&encrypted_json_path, &raw, key, iv).await?;

    let image = download_random_image(upstream, &memes, &directory).await?;

    log_file_locations(&encrypted_json_path, &image.path);

    let archived_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| AppError::Internal(format!("Failed to format timestamp: {}", e)))?;

    Ok(ArchiveReport {
        total: memes.len(),
        matched,
        keyword: keyword.to_string(),
        encrypted_json_path,
        image_path: image.path,
        image_bytes: image.bytes,
        image_sha256: image.sha256,
        archived_at,
    })
}

/// 回读缓存文件，确认能用同一组 key/iv 解密回原始 JSON
async fn verify_cache(path: &Path, expected: &Value, key: &str, iv: &str) -> Result<()> {
    let cached = tokio::fs::read_to_string(path).await?;
    let decrypted: Value = serde_json::from_str(&decrypt_json(&cached, key, iv)?)?;
    if &decrypted != expected {
        return Err(AppError::Crypto(format!(
            "cached payload at {} does not decrypt to the fetched list",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{counted_json_route, image_router, meme_list, spawn_upstream};
    use serde_json::json;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    const KEY: &str = "12345678901234567890123456789012";
    const IV: &str = "1234567890123456";

    async fn upstream_with(names: &'static [&'static str], hits: Arc<AtomicUsize>) -> String {
        spawn_upstream(move |base| {
            let body = json!({ "memes": meme_list(base, names) });
            image_router().route("/get_memes", counted_json_route(body, hits))
        })
        .await
    }

    fn config_for(base: &str, dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.upstream.meme_url = Some(format!("{base}/get_memes"));
        config.archive.key = Some(KEY.to_string());
        config.archive.iv = Some(IV.to_string());
        config.archive.directory = Some(dir.to_string_lossy().into_owned());
        config
    }

    #[tokio::test]
    async fn archives_list_and_image() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = upstream_with(
            &["The Meme 1", "Meme 2", "Another Meme", "The Last Meme"],
            hits.clone(),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&base, dir.path());

        let report = archive_memes(&UpstreamClient::new(5).unwrap(), &config, None)
            .await
            .unwrap();

        assert_eq!(report.total, 4);
        assert_eq!(report.matched, 2);
        assert_eq!(report.keyword, "The ");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(report.image_path.ends_with("random_meme.jpg"));
        assert!(std::fs::metadata(&report.image_path).unwrap().len() > 0);

        let cached = std::fs::read_to_string(&report.encrypted_json_path).unwrap();
        let memes: Vec<Meme> = serde_json::from_str(&decrypt_json(&cached, KEY, IV).unwrap()).unwrap();
        assert_eq!(memes.len(), 4);
        assert_eq!(memes[3].name, "The Last Meme");
    }

    #[tokio::test]
    async fn cache_keeps_fields_the_model_does_not_know() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = upstream_with(&["The Meme 1", "Meme 2"], hits).await;
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&base, dir.path());

        let report = archive_memes(&UpstreamClient::new(5).unwrap(), &config, None)
            .await
            .unwrap();

        let cached = std::fs::read_to_string(&report.encrypted_json_path).unwrap();
        let decrypted: Value = serde_json::from_str(&decrypt_json(&cached, KEY, IV).unwrap()).unwrap();
        assert_eq!(decrypted[0]["captions"], 1000);
        assert_eq!(decrypted[1]["captions"], 1000);
        assert_eq!(decrypted, meme_list(&base, &["The Meme 1", "Meme 2"]));
    }

    #[tokio::test]
    async fn verify_cache_rejects_a_mismatched_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memes.json.enc");
        let written = json!([{ "id": "1", "name": "Meme 1", "url": "u" }]);
        write_encrypted_payload(&path, &encrypt_json(&written, KEY, IV).unwrap())
            .await
            .unwrap();

        verify_cache(&path, &written, KEY, IV).await.unwrap();

        let err = verify_cache(&path, &json!([]), KEY, IV).await.unwrap_err();
        assert!(matches!(err, AppError::Crypto(_)));
    }

    #[tokio::test]
    async fn keyword_argument_overrides_config() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = upstream_with(&["The Meme 1", "Meme 2", "Another Meme"], hits).await;
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&base, dir.path());

        let report = archive_memes(&UpstreamClient::new(5).unwrap(), &config, Some("meme"))
            .await
            .unwrap();

        assert_eq!(report.matched, 3);
        assert_eq!(report.keyword, "meme");
    }

    #[tokio::test]
    async fn missing_configuration_fails_before_fetching() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = upstream_with(&["Meme 1"], hits.clone()).await;
        let dir = tempfile::tempdir().unwrap();

        let mut config = config_for(&base, dir.path());
        config.archive.key = None;
        let err = archive_memes(&UpstreamClient::new(5).unwrap(), &config, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let mut config = config_for(&base, dir.path());
        config.upstream.meme_url = None;
        let err = archive_memes(&UpstreamClient::new(5).unwrap(), &config, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_listing_is_a_validation_error() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = upstream_with(&[], hits).await;
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&base, dir.path());

        let err = archive_memes(&UpstreamClient::new(5).unwrap(), &config, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(!dir.path().join("random_meme.jpg").exists());
    }
}
