use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Connection settings for the hosted detection agent.
///
/// Only produced when both the URL and the API key are configured.
#[derive(Clone)]
pub struct AgentSettings {
    pub url: String,
    pub api_key: String,
    pub model: String,
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for AgentSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSettings")
            .field("url", &self.url)
            .field("api_key", &"[redacted]")
            .field("model", &self.model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Engine-wide detection defaults applied when a caller omits an option.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectSettings {
    pub radius_km: f64,
    pub max_alternatives: usize,
    pub deadline_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_cell_meters: f64,
}

impl Default for DetectSettings {
    fn default() -> Self {
        Self {
            radius_km: 50.0,
            max_alternatives: 3,
            deadline_ms: 8_000,
            cache_ttl_secs: 30,
            cache_cell_meters: 50.0,
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub venues_path: PathBuf,
    pub agent_url: Option<String>,
    pub agent_api_key: Option<String>,
    pub agent_model: String,
    pub agent_request_timeout_secs: u64,
    pub detect: DetectSettings,
    pub rate_limit_per_minute: usize,
}

impl AppConfig {
    /// Agent settings, or `None` when the AI path is not configured.
    ///
    /// Both `SAILVENUE_AGENT_URL` and `SAILVENUE_AGENT_API_KEY` must be set
    /// and non-blank.
    #[must_use]
    pub fn agent(&self) -> Option<AgentSettings> {
        let url = self.agent_url.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let api_key = self
            .agent_api_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())?;

        Some(AgentSettings {
            url: url.to_string(),
            api_key: api_key.to_string(),
            model: self.agent_model.clone(),
            request_timeout_secs: self.agent_request_timeout_secs,
        })
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("venues_path", &self.venues_path)
            .field("agent_url", &self.agent_url)
            .field(
                "agent_api_key",
                &self.agent_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("agent_model", &self.agent_model)
            .field(
                "agent_request_timeout_secs",
                &self.agent_request_timeout_secs,
            )
            .field("detect", &self.detect)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish()
    }
}
