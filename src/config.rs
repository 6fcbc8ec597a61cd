use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::orchestrator::RetryPolicy;

/// 持久存储后端
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// 本地目录，每章一个 JSON 文件
    File,
    /// 远程键值服务
    Http,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(StoreBackend::File),
            "http" => Ok(StoreBackend::Http),
            other => Err(ConfigError::Invalid {
                field: "store_backend".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 主语言（静态经文的语言）
    pub primary_language: String,
    /// 静态经文 JSON 路径
    pub corpus_path: String,
    // --- 持久存储 ---
    pub store_backend: StoreBackend,
    pub store_dir: String,
    pub store_base_url: String,
    /// 交互式读取的超时（秒），0 表示不限时
    pub store_timeout_secs: u64,
    /// 批量存在性检查的超时（秒），0 表示不限时
    pub batch_store_timeout_secs: u64,
    /// 非主语言原文 API
    pub canonical_api_base_url: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 批量重试 ---
    pub retry_base_delay_ms: u64,
    pub max_attempts: u32,
    pub inter_chapter_delay_ms: u64,
    // --- 日志 ---
    pub log_filter: String,
    /// 批量任务日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            primary_language: "pt".to_string(),
            corpus_path: "data/corpus_pt.json".to_string(),
            store_backend: StoreBackend::File,
            store_dir: "fluid_store".to_string(),
            store_base_url: "http://127.0.0.1:8787".to_string(),
            store_timeout_secs: 5,
            batch_store_timeout_secs: 0,
            canonical_api_base_url: "https://bible-api.com".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            retry_base_delay_ms: 2000,
            max_attempts: 5,
            inter_chapter_delay_ms: 2000,
            log_filter: "info".to_string(),
            output_log_file: "batch_log.txt".to_string(),
        }
    }
}

impl Config {
    /// 默认值 + 环境变量
    pub fn from_env() -> Self {
        Self::default().overlay_env()
    }

    /// 读取 TOML 配置文件（可选），再用环境变量覆盖
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                toml::from_str(&text).map_err(|source| ConfigError::Parse {
                    path: path.display().to_string(),
                    source,
                })?
            }
            None => Self::default(),
        };

        let config = base.overlay_env();
        config.validate()?;
        Ok(config)
    }

    fn overlay_env(self) -> Self {
        let default = self;
        Self {
            primary_language: std::env::var("PRIMARY_LANGUAGE").unwrap_or(default.primary_language),
            corpus_path: std::env::var("CORPUS_PATH").unwrap_or(default.corpus_path),
            store_backend: std::env::var("STORE_BACKEND").ok().and_then(|v| v.parse().ok()).unwrap_or(default.store_backend),
            store_dir: std::env::var("STORE_DIR").unwrap_or(default.store_dir),
            store_base_url: std::env::var("STORE_BASE_URL").unwrap_or(default.store_base_url),
            store_timeout_secs: std::env::var("STORE_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.store_timeout_secs),
            batch_store_timeout_secs: std::env::var("BATCH_STORE_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.batch_store_timeout_secs),
            canonical_api_base_url: std::env::var("CANONICAL_API_BASE_URL").unwrap_or(default.canonical_api_base_url),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            retry_base_delay_ms: std::env::var("RETRY_BASE_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_base_delay_ms),
            max_attempts: std::env::var("MAX_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_attempts),
            inter_chapter_delay_ms: std::env::var("INTER_CHAPTER_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.inter_chapter_delay_ms),
            log_filter: std::env::var("LOG_FILTER").unwrap_or(default.log_filter),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }

    /// 检查取值范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        if crate::models::key::normalize_language(&self.primary_language).is_err() {
            return Err(ConfigError::Invalid {
                field: "primary_language".to_string(),
                value: self.primary_language.clone(),
            });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "max_attempts".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_attempts: self.max_attempts,
            inter_chapter_delay: Duration::from_millis(self.inter_chapter_delay_ms),
        }
    }

    /// 交互式读取超时
    pub fn store_timeout(&self) -> Option<Duration> {
        secs_or_none(self.store_timeout_secs)
    }

    /// 批量存在性检查超时
    pub fn batch_store_timeout(&self) -> Option<Duration> {
        secs_or_none(self.batch_store_timeout_secs)
    }
}

fn secs_or_none(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_batch_policy() {
        let config = Config::default();
        let policy = config.retry_policy();
        assert_eq!(policy.base_delay, Duration::from_secs(2));
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(config.store_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.batch_store_timeout(), None);
    }

    #[test]
    fn toml_fills_missing_fields_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            primary_language = "en"
            store_backend = "http"
            max_attempts = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.primary_language, "en");
        assert_eq!(config.store_backend, StoreBackend::Http);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.store_timeout_secs, 5);
        assert_eq!(config.corpus_path, "data/corpus_pt.json");
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let config = Config {
            max_attempts: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field, .. }) if field == "max_attempts"
        ));
    }

    #[test]
    fn primary_language_must_be_a_language_code() {
        let config = Config {
            primary_language: "../pt".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field, .. }) if field == "primary_language"
        ));
    }

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("HTTP".parse::<StoreBackend>().unwrap(), StoreBackend::Http);
        assert!("s3".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Config::load(Some(Path::new("/nonexistent/biblia.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
