use crate::config::{ApiKey, SaverConfig};
use crate::utils::error::{Result, SaverError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional settings file. Every field may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub chat: Option<ChatSection>,
    pub ocr: Option<OcrSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatSection {
    pub endpoint: Option<String>,
    pub deployment: Option<String>,
    pub api_key: Option<String>,
    pub api_version: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OcrSection {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub poll_attempts: Option<u32>,
    pub poll_interval_millis: Option<u64>,
    pub submit_timeout_seconds: Option<u64>,
    pub poll_timeout_seconds: Option<u64>,
}

impl FileConfig {
    /// Loads the configuration file at `path`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| SaverError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from TOML text after `${VAR}` substitution.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SaverError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` placeholders (e.g. `${AZURE_OPENAI_KEY}`) with environment values.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SaverError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Overlays the values present in the file onto `config`.
    pub fn apply_to(self, config: &mut SaverConfig) {
        if let Some(chat) = self.chat {
            if let Some(v) = chat.endpoint {
                config.chat.endpoint = v;
            }
            if let Some(v) = chat.deployment {
                config.chat.deployment = v;
            }
            if let Some(v) = chat.api_key.filter(|k| !is_unresolved(k)) {
                config.chat.api_key = ApiKey::new(v);
            }
            if let Some(v) = chat.api_version {
                config.chat.api_version = v;
            }
            if let Some(v) = chat.temperature {
                config.chat.temperature = v;
            }
            if let Some(v) = chat.timeout_seconds {
                config.chat.timeout_seconds = v;
            }
        }

        if let Some(ocr) = self.ocr {
            if let Some(v) = ocr.endpoint {
                config.ocr.endpoint = v;
            }
            if let Some(v) = ocr.api_key.filter(|k| !is_unresolved(k)) {
                config.ocr.api_key = ApiKey::new(v);
            }
            if let Some(v) = ocr.poll_attempts {
                config.ocr.poll_attempts = v;
            }
            if let Some(v) = ocr.poll_interval_millis {
                config.ocr.poll_interval_millis = v;
            }
            if let Some(v) = ocr.submit_timeout_seconds {
                config.ocr.submit_timeout_seconds = v;
            }
            if let Some(v) = ocr.poll_timeout_seconds {
                config.ocr.poll_timeout_seconds = v;
            }
        }
    }
}

/// A `${VAR}` placeholder whose variable was not set.
fn is_unresolved(value: &str) -> bool {
    value.starts_with("${") && value.ends_with('}')
}
