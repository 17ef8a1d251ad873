//! Application configuration.
//!
//! Values come from built-in defaults, an optional TOML file and
//! `CALLBRIDGE__SECTION__KEY` environment variables, in increasing precedence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gateway::{BasicAuth, DEFAULT_BRIDGE_SIP_URI};
use crate::orchestrator::OrchestratorConfig;
use crate::types::AccountId;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "CALLBRIDGE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub media: MediaConfig,
    pub telephony: TelephonyConfig,
    pub gateway: GatewayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Public URL the telephony service uses to reach this process.
    pub base_callback_url: String,
    /// Directory with the browser client, served at `/` and `/public`.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 5000,
            base_callback_url: "http://localhost:5000/".to_string(),
            static_dir: None,
        }
    }
}

/// Media-session service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub base_url: String,
    pub account_id: String,
    pub username: String,
    pub password: String,
    /// Billing tag applied to created sessions.
    pub session_tag: String,
    pub sip_uri: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.webrtc.bandwidth.com/v1".to_string(),
            account_id: String::new(),
            username: String::new(),
            password: String::new(),
            session_tag: "customer_123".to_string(),
            sip_uri: DEFAULT_BRIDGE_SIP_URI.to_string(),
        }
    }
}

/// Telephony service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelephonyConfig {
    pub base_url: String,
    pub account_id: String,
    pub username: String,
    pub password: String,
    pub application_id: String,
    /// Caller id for outbound calls. Must be a number the account may call from.
    pub from_number: String,
    pub to_number: String,
    pub call_timeout_secs: u32,
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            base_url: "https://voice.bandwidth.com/api/v2".to_string(),
            account_id: String::new(),
            username: String::new(),
            password: String::new(),
            application_id: String::new(),
            from_number: String::new(),
            to_number: String::new(),
            call_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub request_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional TOML file plus environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        let built = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(built.try_deserialize()?)
    }

    /// Parse configuration from TOML text, without environment overrides.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let built = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;
        Ok(built.try_deserialize()?)
    }

    /// Default configuration rendered as TOML.
    pub fn default_toml() -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }

    /// Reject configurations that cannot place or bridge a call.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("media.account_id", &self.media.account_id),
            ("media.username", &self.media.username),
            ("media.password", &self.media.password),
            ("telephony.account_id", &self.telephony.account_id),
            ("telephony.username", &self.telephony.username),
            ("telephony.password", &self.telephony.password),
            ("telephony.application_id", &self.telephony.application_id),
            ("telephony.from_number", &self.telephony.from_number),
            ("telephony.to_number", &self.telephony.to_number),
            ("server.base_callback_url", &self.server.base_callback_url),
        ];

        match required.into_iter().find(|(_, value)| value.trim().is_empty()) {
            Some((key, _)) => Err(ConfigError::Missing(key)),
            None => Ok(()),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway.request_timeout_ms)
    }

    pub fn media_auth(&self) -> BasicAuth {
        BasicAuth {
            username: self.media.username.clone(),
            password: self.media.password.clone(),
        }
    }

    pub fn telephony_auth(&self) -> BasicAuth {
        BasicAuth {
            username: self.telephony.username.clone(),
            password: self.telephony.password.clone(),
        }
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            media_account: AccountId::new(self.media.account_id.clone()),
            telephony_account: AccountId::new(self.telephony.account_id.clone()),
            billing_tag: self.media.session_tag.clone(),
            application_id: self.telephony.application_id.clone(),
            callback_base_url: self.server.base_callback_url.clone(),
            call_timeout_secs: self.telephony.call_timeout_secs,
            bridge_sip_uri: self.media.sip_uri.clone(),
            request_timeout: self.request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const COMPLETE: &str = r#"
[server]
port = 8080
base_callback_url = "https://bridge.example.com/"

[media]
account_id = "9900000"
username = "media-user"
password = "media-pass"

[telephony]
account_id = "9900000"
username = "voice-user"
password = "voice-pass"
application_id = "app-1"
from_number = "+15550001111"
to_number = "+15550002222"
"#;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.media.session_tag, "customer_123");
        assert_eq!(config.telephony.call_timeout_secs, 30);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_from_toml_fills_missing_with_defaults() {
        let config = AppConfig::from_toml(COMPLETE).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.telephony.from_number, "+15550001111");
        assert_eq!(config.media.sip_uri, DEFAULT_BRIDGE_SIP_URI);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_names_missing_key() {
        let mut config = AppConfig::from_toml(COMPLETE).unwrap();
        config.telephony.application_id = String::new();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("telephony.application_id")));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(COMPLETE.as_bytes()).unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.media.account_id, "9900000");
        assert_eq!(config.orchestrator().application_id, "app-1");
    }

    #[test]
    fn test_default_toml_round_trips() {
        let text = AppConfig::default_toml().unwrap();
        let parsed = AppConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.server.port, 5000);
        assert_eq!(parsed.gateway.request_timeout_ms, 10_000);
    }
}
