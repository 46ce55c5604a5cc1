use crate::utils::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProxyConfig {
    pub enabled: bool,
    pub ip_header: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub proxy: ProxyConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// 表情包列表接口地址，启动时不校验，首次使用时才报错
    #[serde(default)]
    pub meme_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// 为空时使用系统临时目录
    pub directory: Option<String>,
    pub json_filename: String,
    pub keyword: String,
    pub key: Option<String>,
    pub iv: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub directory: String,
    pub file_prefix: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            file_prefix: "meme-relay".to_string(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ip_header: "x-forwarded-for".to_string(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            meme_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            directory: None,
            json_filename: "memes.json.enc".to_string(),
            keyword: "The ".to_string(),
            key: None,
            iv: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                proxy: ProxyConfig::default(),
            },
            upstream: UpstreamConfig::default(),
            archive: ArchiveConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl UpstreamConfig {
    /// 读取上游表情包接口地址
    pub fn meme_url(&self) -> Result<&str> {
        non_empty(self.meme_url.as_ref())
            .ok_or_else(|| AppError::Config("MEME_URL environment variable not set".to_string()))
    }
}

impl ArchiveConfig {
    pub fn key(&self) -> Result<&str> {
        non_empty(self.key.as_ref())
            .ok_or_else(|| AppError::Config("MEME_CACHE_KEY not set".to_string()))
    }

    pub fn iv(&self) -> Result<&str> {
        non_empty(self.iv.as_ref())
            .ok_or_else(|| AppError::Config("MEME_CACHE_IV not set".to_string()))
    }

    pub fn directory(&self) -> PathBuf {
        non_empty(self.directory.as_ref())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        let path = path.as_ref();

        // 如果配置文件不存在
        if !path.exists() {
            // 检查示例配置文件是否存在
            let example_path = path.with_extension("yml.example");

            if example_path.exists() {
                tracing::info!("从示例配置创建新的配置文件");
                fs::copy(&example_path, path)
                    .map_err(|e| AppError::Config(format!("复制示例配置文件失败: {}", e)))?;
            } else {
                // 如果示例配置不存在，创建默认配置
                tracing::info!("配置文件不存在，创建默认配置");
                let config = Config::default();
                let config_str = serde_yaml::to_string(&config)
                    .map_err(|e| AppError::Config(format!("序列化默认配置失败: {}", e)))?;

                // 确保目录存在
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        fs::create_dir_all(parent)
                            .map_err(|e| AppError::Config(format!("创建配置目录失败: {}", e)))?;
                    }
                }

                fs::write(path, config_str)
                    .map_err(|e| AppError::Config(format!("写入默认配置文件失败: {}", e)))?;

                tracing::info!("默认配置文件已创建: {:?}", path);
            }
        }

        // 读取现有配置
        let config_str = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::from_yaml(&config_str)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());

        // 验证配置
        config.validate()?;

        Ok(Arc::new(config))
    }

    pub fn from_yaml(source: &str) -> Result<Self> {
        serde_yaml::from_str(source)
            .map_err(|e| AppError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// 环境变量优先于配置文件
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("MEME_URL") {
            self.upstream.meme_url = Some(url);
        }
        if let Some(key) = lookup("MEME_CACHE_KEY") {
            self.archive.key = Some(key);
        }
        if let Some(iv) = lookup("MEME_CACHE_IV") {
            self.archive.iv = Some(iv);
        }
        if let Some(dir) = lookup("MEME_ARCHIVE_DIR") {
            self.archive.directory = Some(dir);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::Config("Server port must be greater than 0".to_string()));
        }

        if self.server.host.is_empty() {
            return Err(AppError::Config("Server host cannot be empty".to_string()));
        }

        if self.upstream.timeout_secs == 0 {
            return Err(AppError::Config("Upstream timeout must be greater than 0".to_string()));
        }

        if self.archive.json_filename.trim().is_empty() {
            return Err(AppError::Config("Archive json_filename cannot be empty".to_string()));
        }

        Ok(())
    }
}
