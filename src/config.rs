//! Configuration loading
//!
//! Layered in precedence order: built-in defaults, then an optional TOML
//! file (explicit path or the platform config dir), then a small set of
//! environment overrides for containerized deployments.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub stt: SttConfig,
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    #[serde(default = "default_llm_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_llm_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SttConfig {
    #[serde(default = "default_stt_url")]
    pub base_url: String,
    #[serde(default = "default_stt_model")]
    pub model: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_stage_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TtsConfig {
    #[serde(default = "default_tts_backend")]
    pub backend: String,
    #[serde(default = "default_rate")]
    pub rate: u32,
    #[serde(default = "default_volume")]
    pub volume: f64,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_tts_model")]
    pub model: String,
    #[serde(default = "default_speed")]
    pub speed: f64,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_stage_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversationConfig {
    /// Soft bound on messages per window; unbounded when absent
    #[serde(default)]
    pub max_messages: Option<usize>,
    /// Overrides the built-in system prompt for new sessions
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_llm_url() -> String {
    "http://127.0.0.1:1234/v1".to_string()
}
fn default_llm_model() -> String {
    "qwen/qwen3-4b-2507".to_string()
}
fn default_max_tokens() -> u32 {
    150
}
fn default_temperature() -> f64 {
    0.7
}
fn default_llm_timeout() -> u64 {
    60
}
fn default_health_timeout() -> u64 {
    10
}
fn default_stt_url() -> String {
    "http://127.0.0.1:9000".to_string()
}
fn default_stt_model() -> String {
    "tiny".to_string()
}
fn default_language() -> String {
    "es".to_string()
}
fn default_stage_timeout() -> u64 {
    30
}
fn default_tts_backend() -> String {
    "espeak".to_string()
}
fn default_rate() -> u32 {
    175
}
fn default_volume() -> f64 {
    0.9
}
fn default_tts_model() -> String {
    "tts-1".to_string()
}
fn default_speed() -> f64 {
    1.0
}
fn default_sweep_interval() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_url(),
            model: default_llm_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            request_timeout_secs: default_llm_timeout(),
            health_timeout_secs: default_health_timeout(),
        }
    }
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            base_url: default_stt_url(),
            model: default_stt_model(),
            language: default_language(),
            request_timeout_secs: default_stage_timeout(),
        }
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            backend: default_tts_backend(),
            rate: default_rate(),
            volume: default_volume(),
            voice: None,
            base_url: None,
            model: default_tts_model(),
            speed: default_speed(),
            request_timeout_secs: default_stage_timeout(),
            api_key: None,
        }
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_messages: None,
            system_prompt: None,
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path or the default location
    ///
    /// With no explicit path, a missing default file is not an error; the
    /// built-in defaults apply.
    ///
    /// # Errors
    ///
    /// Fails when an explicit path cannot be read, when the TOML is
    /// malformed, or when validation rejects a value.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config file");
                Self::from_file(path)?
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => {
                    tracing::debug!(path = %path.display(), "loading config file");
                    Self::from_file(&path)?
                }
                _ => Self::default(),
            },
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Ok(toml::from_str(&raw)?)
    }

    /// Platform config file: `~/.config/arca/gateway.toml` on Linux
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "arca").map(|dirs| dirs.config_dir().join("gateway.toml"))
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("ARCA_LLM_URL") {
            self.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("ARCA_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(url) = std::env::var("ARCA_STT_URL") {
            self.stt.base_url = url;
        }
        if let Ok(port) = std::env::var("ARCA_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            } else {
                tracing::warn!(value = %port, "ignoring non-numeric ARCA_PORT");
            }
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, url) in [("llm.base_url", &self.llm.base_url), ("stt.base_url", &self.stt.base_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::Config(format!(
                    "{name} must start with http:// or https://, got '{url}'"
                )));
            }
        }
        if let Some(url) = &self.tts.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::Config(format!(
                    "tts.base_url must start with http:// or https://, got '{url}'"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.base_url, "http://127.0.0.1:1234/v1");
        assert_eq!(config.stt.language, "es");
        assert_eq!(config.tts.backend, "espeak");
        assert!(config.conversation.max_messages.is_none());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let raw = r#"
            [server]
            port = 9090

            [conversation]
            max_messages = 20
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.conversation.max_messages, Some(20));
        assert_eq!(config.llm.model, "qwen/qwen3-4b-2507");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let raw = r#"
            [server]
            prot = 9090
        "#;
        assert!(toml::from_str::<Config>(raw).is_err());
    }

    #[test]
    fn validation_rejects_bare_url() {
        let mut config = Config::default();
        config.llm.base_url = "localhost:1234".to_string();
        assert!(config.validate().is_err());
    }
}
