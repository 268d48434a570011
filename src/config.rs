use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// API 키를 읽는 비밀 저장소 (환경 변수)
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("API key not configured (set OPENAI_API_KEY or CART_OCR__VISION__API_KEY)")]
    MissingApiKey,

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub vision: VisionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 비전 모델 호출 설정
#[derive(Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    pub base_url: String,
    pub model: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

// api_key는 로그에 남기지 않음
impl fmt::Debug for VisionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_retries", &self.max_retries)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl VisionConfig {
    /// 설정 값이 없으면 비밀 저장소(환경 변수)에서 읽음
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
            .ok_or(ConfigError::MissingApiKey)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            vision: VisionConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                model: DEFAULT_MODEL.to_string(),
                max_retries: 2,
                timeout_secs: 60,
                api_key: None,
            },
        }
    }
}

impl AppConfig {
    /// 기본값 → cart-ocr.toml (선택) → CART_OCR__* 환경 변수 순으로 덮어씀
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("cart-ocr")
    }

    pub fn load_from(file_stem: &str) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let settings = config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port as i64)?
            .set_default("vision.base_url", defaults.vision.base_url)?
            .set_default("vision.model", defaults.vision.model)?
            .set_default("vision.max_retries", defaults.vision.max_retries as i64)?
            .set_default("vision.timeout_secs", defaults.vision.timeout_secs as i64)?
            .add_source(config::File::with_name(file_stem).required(false))
            .add_source(
                config::Environment::with_prefix("CART_OCR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: AppConfig = settings.try_deserialize()?;
        if cfg.vision.model.trim().is_empty() {
            return Err(ConfigError::Invalid("vision.model must not be empty".to_string()));
        }
        Ok(cfg)
    }
}
