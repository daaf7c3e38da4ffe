use crate::error::{to_env_var, ConfigError};
use crate::sse::StreamFraming;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;
use tickertalk::{
    prompt::PromptVariant,
    providers::configs::{CompletionConfig, DEFAULT_MAX_ROUNDS, DEFAULT_MODEL, THESYS_HOST},
    tools::{market::ALPHA_VANTAGE_HOST, MarketDataConfig, DEFAULT_TOOLS},
};

/// Conventional variable names for the two upstream keys
const THESYS_API_KEY: &str = "THESYS_API_KEY";
const ALPHAVANTAGE_API_KEY: &str = "ALPHAVANTAGE_API_KEY";

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub framing: StreamFraming,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            framing: StreamFraming::default(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ConfigError::InvalidAddress(addr))
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionSettings {
    #[serde(default = "default_completion_host")]
    pub host: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
}

#[derive(Debug, Deserialize)]
pub struct MarketSettings {
    #[serde(default = "default_market_host")]
    pub host: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct PromptSettings {
    #[serde(default)]
    pub variant: PromptVariant,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub completion: CompletionSettings,
    pub market: MarketSettings,
    #[serde(default)]
    pub prompt: PromptSettings,
    #[serde(default = "default_tools")]
    pub tools: Vec<String>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        // Start with default configuration
        let mut builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("completion.host", default_completion_host())?
            .set_default("completion.model", default_model())?
            .set_default("market.host", default_market_host())?;

        // The conventional key variables sit below everything else
        if let Ok(key) = std::env::var(THESYS_API_KEY) {
            builder = builder.set_default("completion.api_key", key)?;
        }
        if let Ok(key) = std::env::var(ALPHAVANTAGE_API_KEY) {
            builder = builder.set_default("market.api_key", key)?;
        }

        let config = builder
            .add_source(File::with_name("tickertalk").required(false))
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix("TICKERTALK")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("tools")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Self = config.try_deserialize().map_err(|err| {
            tracing::debug!("Configuration error: {:?}", &err);
            ConfigError::Other(err)
        })?;
        settings.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if is_blank(&self.completion.api_key) {
            return Err(ConfigError::MissingEnvVar {
                env_var: format!("{} or {}", to_env_var("completion.api_key"), THESYS_API_KEY),
            });
        }
        if is_blank(&self.market.api_key) {
            return Err(ConfigError::MissingEnvVar {
                env_var: format!("{} or {}", to_env_var("market.api_key"), ALPHAVANTAGE_API_KEY),
            });
        }
        if self.completion.max_rounds == 0 {
            return Err(ConfigError::InvalidValue {
                env_var: to_env_var("completion.max_rounds"),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.market.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                env_var: to_env_var("market.timeout_secs"),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(self)
    }
}

fn is_blank(key: &Option<String>) -> bool {
    key.as_deref().map_or(true, |key| key.trim().is_empty())
}

impl CompletionSettings {
    pub fn into_config(self) -> CompletionConfig {
        CompletionConfig {
            host: self.host,
            api_key: self.api_key.unwrap_or_default(),
            model: self.model,
            max_rounds: self.max_rounds,
        }
    }
}

impl MarketSettings {
    pub fn into_config(self) -> MarketDataConfig {
        MarketDataConfig {
            host: self.host,
            api_key: self.api_key.unwrap_or_default(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_completion_host() -> String {
    THESYS_HOST.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_rounds() -> usize {
    DEFAULT_MAX_ROUNDS
}

fn default_market_host() -> String {
    ALPHA_VANTAGE_HOST.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_tools() -> Vec<String> {
    DEFAULT_TOOLS.iter().map(|name| name.to_string()).collect()
}
