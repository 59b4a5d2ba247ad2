#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::utils::error::{Result, SaverError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub use toml_config::FileConfig;

pub const ENV_CHAT_KEY: &str = "AZURE_OPENAI_KEY";
pub const ENV_CHAT_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const ENV_CHAT_DEPLOYMENT: &str = "AZURE_OPENAI_DEPLOYMENT";
pub const ENV_CHAT_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
pub const ENV_OCR_KEY: &str = "AZURE_OCR_KEY";
pub const ENV_OCR_ENDPOINT: &str = "AZURE_OCR_ENDPOINT";
pub const ENV_POLL_ATTEMPTS: &str = "GROCERY_SAVER_POLL_ATTEMPTS";
pub const ENV_POLL_INTERVAL_MS: &str = "GROCERY_SAVER_POLL_INTERVAL_MS";

/// Secret that never shows up in `Debug` output or logs.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("ApiKey(<unset>)")
        } else {
            f.write_str("ApiKey(***)")
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    pub endpoint: String,
    pub deployment: String,
    pub api_key: ApiKey,
    pub api_version: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            deployment: String::new(),
            api_key: ApiKey::default(),
            api_version: "2024-02-01".to_string(),
            temperature: 0.2,
            timeout_seconds: 60,
        }
    }
}

impl ChatConfig {
    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Validate for ChatConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("chat.endpoint", &self.endpoint)?;
        validation::validate_non_empty_string("chat.deployment", &self.deployment)?;
        validation::validate_non_empty_secret("chat.api_key", self.api_key.expose())?;
        validation::validate_non_empty_string("chat.api_version", &self.api_version)?;
        validation::validate_range("chat.temperature", self.temperature, 0.0, 2.0)?;
        validation::validate_positive_number("chat.timeout_seconds", self.timeout_seconds, 1)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrConfig {
    pub endpoint: String,
    pub api_key: ApiKey,
    pub poll_attempts: u32,
    pub poll_interval_millis: u64,
    pub submit_timeout_seconds: u64,
    pub poll_timeout_seconds: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: ApiKey::default(),
            poll_attempts: 60,
            poll_interval_millis: 1000,
            submit_timeout_seconds: 60,
            poll_timeout_seconds: 30,
        }
    }
}

impl OcrConfig {
    pub fn analyze_url(&self) -> String {
        format!("{}/vision/v3.2/read/analyze", self.endpoint.trim_end_matches('/'))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_millis)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_seconds)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_seconds)
    }
}

impl Validate for OcrConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("ocr.endpoint", &self.endpoint)?;
        validation::validate_non_empty_secret("ocr.api_key", self.api_key.expose())?;
        validation::validate_positive_number("ocr.poll_attempts", u64::from(self.poll_attempts), 1)?;
        validation::validate_positive_number("ocr.submit_timeout_seconds", self.submit_timeout_seconds, 1)?;
        validation::validate_positive_number("ocr.poll_timeout_seconds", self.poll_timeout_seconds, 1)?;
        Ok(())
    }
}

/// Built once at startup and handed to each client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaverConfig {
    pub chat: ChatConfig,
    pub ocr: OcrConfig,
}

impl SaverConfig {
    /// Defaults, then the optional TOML file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::load_with(path, &env)
    }

    pub fn load_with(path: Option<&Path>, env: &HashMap<String, String>) -> Result<Self> {
        let mut config = SaverConfig::default();

        if let Some(path) = path {
            tracing::debug!("Loading configuration file {}", path.display());
            FileConfig::from_file(path)?.apply_to(&mut config);
        }

        config.apply_env(env)?;
        Ok(config)
    }

    /// Empty variables are treated as unset.
    pub fn apply_env(&mut self, env: &HashMap<String, String>) -> Result<()> {
        let get = |key: &str| {
            env.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        if let Some(v) = get(ENV_CHAT_KEY) {
            self.chat.api_key = ApiKey::new(v);
        }
        if let Some(v) = get(ENV_CHAT_ENDPOINT) {
            self.chat.endpoint = v;
        }
        if let Some(v) = get(ENV_CHAT_DEPLOYMENT) {
            self.chat.deployment = v;
        }
        if let Some(v) = get(ENV_CHAT_API_VERSION) {
            self.chat.api_version = v;
        }
        if let Some(v) = get(ENV_OCR_KEY) {
            self.ocr.api_key = ApiKey::new(v);
        }
        if let Some(v) = get(ENV_OCR_ENDPOINT) {
            self.ocr.endpoint = v;
        }
        if let Some(v) = get(ENV_POLL_ATTEMPTS) {
            self.ocr.poll_attempts = parse_env_number(ENV_POLL_ATTEMPTS, &v)?;
        }
        if let Some(v) = get(ENV_POLL_INTERVAL_MS) {
            self.ocr.poll_interval_millis = parse_env_number(ENV_POLL_INTERVAL_MS, &v)?;
        }

        Ok(())
    }

    pub fn validate_for_text(&self) -> Result<()> {
        self.chat.validate()
    }

    pub fn validate_for_receipt(&self) -> Result<()> {
        self.chat.validate()?;
        self.ocr.validate()
    }
}

impl Validate for SaverConfig {
    fn validate(&self) -> Result<()> {
        self.validate_for_receipt()
    }
}

fn parse_env_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| SaverError::InvalidConfigValueError {
            field: name.to_string(),
            value: value.to_string(),
            reason: format!("Expected a whole number: {}", e),
        })
}
