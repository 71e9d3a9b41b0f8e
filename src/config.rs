use crate::error::{AppError, AppResult, ConfigError, FileError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 服务端根地址
    pub base_url: String,
    /// 表单原生提交的 action 路径
    pub submit_path: String,
    /// 加载表单的最大尝试次数（含首次）
    pub max_load_attempts: usize,
    /// 两次尝试之间的固定间隔（毫秒）
    pub retry_delay_ms: u64,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 每个表单保留的加载记录条数
    pub attempt_history_capacity: usize,
    /// 删除行时的淡出时长（毫秒），仅供界面层使用
    pub removal_fade_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            submit_path: "/submit".to_string(),
            max_load_attempts: 3,
            retry_delay_ms: 1000,
            request_timeout_secs: 10,
            attempt_history_capacity: 10,
            removal_fade_ms: 300,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            base_url: std::env::var("FORM_BUILDER_BASE_URL").unwrap_or(default.base_url),
            submit_path: std::env::var("FORM_BUILDER_SUBMIT_PATH").unwrap_or(default.submit_path),
            max_load_attempts: std::env::var("FORM_BUILDER_MAX_LOAD_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_load_attempts),
            retry_delay_ms: std::env::var("FORM_BUILDER_RETRY_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_delay_ms),
            request_timeout_secs: std::env::var("FORM_BUILDER_REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            attempt_history_capacity: std::env::var("FORM_BUILDER_HISTORY_CAPACITY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.attempt_history_capacity),
            removal_fade_ms: std::env::var("FORM_BUILDER_REMOVAL_FADE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.removal_fade_ms),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 从 TOML 文件加载配置，缺省项取默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            AppError::File(FileError::TomlParseFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 检查配置取值
    pub fn validate(&self) -> AppResult<()> {
        if self.max_load_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_load_attempts".to_string(),
                reason: "至少需要尝试 1 次".to_string(),
            }
            .into());
        }
        if self.attempt_history_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "attempt_history_capacity".to_string(),
                reason: "容量必须大于 0".to_string(),
            }
            .into());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "base_url".to_string(),
                reason: format!("不是 http(s) 地址: {}", self.base_url),
            }
            .into());
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
