use crate::core::auto_tag::DEFAULT_TAG_COLOR;
use crate::utils::error::{DashError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            // Vite dev server
            cors_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "https://ssapi.shipstation.com/v2".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// 對上游同時最多幾個請求；帳號有速率限制，預設 1
    pub max_in_flight: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { max_in_flight: 1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub auto_tag_color: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            auto_tag_color: DEFAULT_TAG_COLOR.to_string(),
        }
    }
}

impl AppConfig {
    /// 先找 TOML 檔，沒有就退回環境變數（對應舊佈署的 dotenv 設定）
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Self::from_env()
        }
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DashError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DashError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SS_API_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 環境變數設定：SS_BASE_URL / SS_API_KEY / PORT / CORS_ORIGIN
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("SS_API_KEY").ok();
        let api_key = validation::validate_required_field("SS_API_KEY", &api_key)?.clone();

        let mut config = Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig {
                base_url: std::env::var("SS_BASE_URL").unwrap_or_else(|_| default_base_url()),
                api_key,
                timeout_seconds: default_timeout_seconds(),
            },
            batch: BatchConfig::default(),
            webhook: WebhookConfig::default(),
        };

        if let Ok(port) = std::env::var("PORT") {
            config.server.port =
                port.parse()
                    .map_err(|_| DashError::InvalidConfigValueError {
                        field: "PORT".to_string(),
                        value: port.clone(),
                        reason: "Port must be a number between 1 and 65535".to_string(),
                    })?;
        }

        if let Ok(origins) = std::env::var("CORS_ORIGIN") {
            config.server.cors_origins = origins
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect();
        }

        Ok(config)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("upstream.base_url", &self.upstream.base_url)?;
        validation::validate_non_empty_string("upstream.api_key", &self.upstream.api_key)?;
        validation::validate_positive_number(
            "upstream.timeout_seconds",
            self.upstream.timeout_seconds as usize,
            1,
        )?;
        validation::validate_positive_number("batch.max_in_flight", self.batch.max_in_flight, 1)?;
        validation::validate_non_empty_string("webhook.auto_tag_color", &self.webhook.auto_tag_color)?;
        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
