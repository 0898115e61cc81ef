use std::path::PathBuf;
use std::time::Duration;

use eyre::Result;
use log::debug;
use serde::Deserialize;

pub const DEFAULT_MODEL: &str = "sonar";
pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_LANG: &str = "en";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const API_KEY_ENV: &str = "PERPLEXITY_API_KEY";

const DEFAULT_INFERENCE_TIMEOUT_SECS: u64 = 90;
const DEFAULT_TRANSCRIPT_TIMEOUT_SECS: u64 = 30;

/// Optional on-disk overrides
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub preferred_lang: Option<String>,
    pub inference_timeout_secs: Option<u64>,
    pub transcript_timeout_secs: Option<u64>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl Config {
    /// Load config from ~/.config/ytbias/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytbias")
        .join("config.toml")
}

/// Settings for the chat-completion provider
#[derive(Debug, Clone)]
pub struct InferenceSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.05,
            max_tokens: 2500,
            timeout: Duration::from_secs(DEFAULT_INFERENCE_TIMEOUT_SECS),
        }
    }
}

/// Process-wide settings, resolved once at startup and never mutated
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub preferred_lang: String,
    pub transcript_timeout: Duration,
    pub inference: InferenceSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            preferred_lang: DEFAULT_LANG.to_string(),
            transcript_timeout: Duration::from_secs(DEFAULT_TRANSCRIPT_TIMEOUT_SECS),
            inference: InferenceSettings::default(),
        }
    }
}

/// Values given on the command line; these win over the config file
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub model: Option<String>,
    pub lang: Option<String>,
    pub api_key: Option<String>,
}

impl Settings {
    pub fn resolve(config: Config, overrides: Overrides) -> Self {
        let defaults = Settings::default();
        let inference = InferenceSettings {
            api_key: overrides.api_key.filter(|k| !k.trim().is_empty()),
            base_url: config.base_url.unwrap_or(defaults.inference.base_url),
            model: overrides.model.or(config.model).unwrap_or(defaults.inference.model),
            timeout: config
                .inference_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.inference.timeout),
            ..defaults.inference
        };

        Self {
            host: overrides.host.or(config.host).unwrap_or(defaults.host),
            port: overrides.port.or(config.port).unwrap_or(defaults.port),
            preferred_lang: overrides.lang.or(config.preferred_lang).unwrap_or(defaults.preferred_lang),
            transcript_timeout: config
                .transcript_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.transcript_timeout),
            inference,
        }
    }
}
