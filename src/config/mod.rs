//! Configuration management
//!
//! Layered: built-in defaults, then `config/default` and `config/local`
//! (both optional), then `STAFFCALL__*` environment variables, e.g.
//! `STAFFCALL__BACKEND__BASE_URL`.

use config::{ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub routes: RoutesConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    /// Bearer token attached to every request
    pub api_token: Option<String>,
    /// Per-request timeout; none when unset
    pub request_timeout_secs: Option<u64>,
    pub endpoints: EndpointsConfig,
}

/// Path templates. `{callId}` and `{meetingId}` are substituted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointsConfig {
    pub default_call: String,
    pub call_token: String,
    pub meeting: String,
    pub meeting_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutesConfig {
    pub meeting_list: String,
    pub landing: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            default_call: "/calls/default".to_string(),
            call_token: "/calls/{callId}/token".to_string(),
            meeting: "/meetings/{meetingId}".to_string(),
            meeting_status: "/meetings/{meetingId}/status".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: "http://localhost:8080/api".to_string(),
                api_token: None,
                request_timeout_secs: None,
                endpoints: EndpointsConfig::default(),
            },
            routes: RoutesConfig {
                meeting_list: "/meetings".to_string(),
                landing: "/".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let endpoints = &defaults.backend.endpoints;

        config::Config::builder()
            .set_default("backend.base_url", defaults.backend.base_url.clone())?
            .set_default("backend.api_token", None::<String>)?
            .set_default("backend.request_timeout_secs", None::<u64>)?
            .set_default("backend.endpoints.default_call", endpoints.default_call.clone())?
            .set_default("backend.endpoints.call_token", endpoints.call_token.clone())?
            .set_default("backend.endpoints.meeting", endpoints.meeting.clone())?
            .set_default("backend.endpoints.meeting_status", endpoints.meeting_status.clone())?
            .set_default("routes.meeting_list", defaults.routes.meeting_list.clone())?
            .set_default("routes.landing", defaults.routes.landing.clone())?
            .set_default("logging.level", defaults.logging.level.clone())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .prefix("STAFFCALL")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}
