use std::time::Duration;

use serde::Deserialize;

use crate::infrastructure::observability::ObservabilityConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
    pub upstream: UpstreamSettings,
    pub session: SessionSettings,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Route cache settings
///
/// The backend itself is chosen from `KV_URL`/`KV_TOKEN`, not from here.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// How long entries are kept after going stale
    pub stale_window_secs: u64,
    /// When set, a bypass request must carry this value
    pub bypass_secret: Option<String>,
}

/// External service endpoints and client settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamSettings {
    pub npm_registry_url: String,
    pub jsdelivr_cdn_url: String,
    pub jsdelivr_data_url: String,
    pub github_api_url: String,
    pub github_token: Option<String>,
    pub jsr_url: String,
    pub gravatar_url: String,
    pub constellation_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub ttl_days: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            stale_window_secs: 86_400,
            bypass_secret: None,
        }
    }
}

impl CacheSettings {
    pub fn stale_window(&self) -> Duration {
        Duration::from_secs(self.stale_window_secs)
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            npm_registry_url: "https://registry.npmjs.org".to_string(),
            jsdelivr_cdn_url: "https://cdn.jsdelivr.net".to_string(),
            jsdelivr_data_url: "https://data.jsdelivr.com".to_string(),
            github_api_url: "https://api.github.com".to_string(),
            github_token: None,
            jsr_url: "https://jsr.io".to_string(),
            gravatar_url: "https://www.gravatar.com".to_string(),
            constellation_url: "https://constellation.microcosm.blue".to_string(),
            timeout_secs: 10,
            user_agent: concat!("npmx-api/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl UpstreamSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Points every service at one base URL, used by tests against a mock server
    pub fn all_at(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();

        Self {
            npm_registry_url: base.clone(),
            jsdelivr_cdn_url: base.clone(),
            jsdelivr_data_url: base.clone(),
            github_api_url: base.clone(),
            jsr_url: base.clone(),
            gravatar_url: base.clone(),
            constellation_url: base,
            ..Default::default()
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: "npmx_session".to_string(),
            ttl_days: 30,
        }
    }
}

impl SessionSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_days * 86_400)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
