use super::parsing::{
    env_first, env_optional, env_or_default, parse_bool, parse_environment, parse_http_url,
    parse_u64,
};
use super::types::{
    ApiSettings, ConfigError, PollingSettings, RuntimeSettings, Settings, SupabaseSettings,
    TelemetrySettings,
};

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            parse_environment(env_first(&["AUTOGRADE_ENV", "ENVIRONMENT"]));
        let require_supabase = env_optional("AUTOGRADE_REQUIRE_SUPABASE")
            .map(|value| parse_bool(&value))
            .unwrap_or(true);

        let api_url = env_first(&["AUTOGRADE_API_URL", "NEXT_PUBLIC_API_URL"])
            .unwrap_or_else(|| ApiSettings::DEFAULT_BASE_URL.to_string());
        let request_timeout_seconds = parse_u64(
            "AUTOGRADE_REQUEST_TIMEOUT_SECONDS",
            env_or_default("AUTOGRADE_REQUEST_TIMEOUT_SECONDS", "30"),
        )?;
        let connect_timeout_seconds = parse_u64(
            "AUTOGRADE_CONNECT_TIMEOUT_SECONDS",
            env_or_default("AUTOGRADE_CONNECT_TIMEOUT_SECONDS", "10"),
        )?;

        let supabase_url = env_first(&["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"]);
        let supabase_anon_key = env_first(&["SUPABASE_ANON_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY"]);

        let poll_interval_ms = parse_u64(
            "AUTOGRADE_POLL_INTERVAL_MS",
            env_or_default("AUTOGRADE_POLL_INTERVAL_MS", "3000"),
        )?;

        let log_level = env_or_default("AUTOGRADE_LOG_LEVEL", "info");
        let json =
            env_optional("AUTOGRADE_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            runtime: RuntimeSettings { environment, require_supabase },
            api: ApiSettings {
                base_url: parse_http_url("AUTOGRADE_API_URL", &api_url)?,
                request_timeout_seconds,
                connect_timeout_seconds,
            },
            supabase: SupabaseSettings { url: supabase_url, anon_key: supabase_anon_key },
            polling: PollingSettings { interval_ms: poll_interval_ms },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub fn supabase(&self) -> &SupabaseSettings {
        &self.supabase
    }

    pub fn polling(&self) -> &PollingSettings {
        &self.polling
    }

    pub fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "AUTOGRADE_POLL_INTERVAL_MS",
                value: "0".to_string(),
            });
        }

        if self.api.request_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "AUTOGRADE_REQUEST_TIMEOUT_SECONDS",
                value: "0".to_string(),
            });
        }

        if let Some(url) = &self.supabase.url {
            parse_http_url("NEXT_PUBLIC_SUPABASE_URL", url)?;
        }

        if !self.runtime.require_supabase {
            return Ok(());
        }

        if self.supabase.url.is_none() {
            return Err(ConfigError::MissingSecret("NEXT_PUBLIC_SUPABASE_URL"));
        }
        if self.supabase.anon_key.is_none() {
            return Err(ConfigError::MissingSecret("NEXT_PUBLIC_SUPABASE_ANON_KEY"));
        }

        Ok(())
    }
}
