mod parsing;
mod settings;
mod types;

pub use types::{
    ApiSettings, ConfigError, Environment, PollingSettings, RuntimeSettings, Settings,
    SupabaseSettings, TelemetrySettings,
};
