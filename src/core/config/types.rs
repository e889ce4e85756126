use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Settings {
    pub(super) runtime: RuntimeSettings,
    pub(super) api: ApiSettings,
    pub(super) supabase: SupabaseSettings,
    pub(super) polling: PollingSettings,
    pub(super) telemetry: TelemetrySettings,
}

/// Connection settings for the grading REST API.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub(crate) base_url: String,
    pub(crate) request_timeout_seconds: u64,
    pub(crate) connect_timeout_seconds: u64,
}

impl ApiSettings {
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:8000/v1";

    /// Settings pointing at `base_url` with the default timeouts.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout_seconds: 30,
            connect_timeout_seconds: 10,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Debug, Clone)]
pub struct SupabaseSettings {
    pub(crate) url: Option<String>,
    pub(crate) anon_key: Option<String>,
}

impl SupabaseSettings {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: Some(url.into().trim_end_matches('/').to_string()),
            anon_key: Some(anon_key.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollingSettings {
    pub(crate) interval_ms: u64,
}

impl PollingSettings {
    pub const DEFAULT_INTERVAL_MS: u64 = 3000;

    pub fn from_millis(interval_ms: u64) -> Self {
        Self { interval_ms: interval_ms.max(1) }
    }

    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self { interval_ms: Self::DEFAULT_INTERVAL_MS }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetrySettings {
    pub(crate) log_level: String,
    pub(crate) json: bool,
    pub(crate) prometheus_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub(crate) environment: Environment,
    pub(crate) require_supabase: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Staging,
    Test,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Test => "test",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("invalid url for {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },
    #[error("missing required setting: {0}")]
    MissingSecret(&'static str),
}
