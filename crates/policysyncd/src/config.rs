//! Validated daemon configuration, read from environment variables at
//! process init.

use std::time::Duration;

use thiserror::Error;

use fabsync_apic::ApicConfig;
use fabsync_store::StoreConfig;

/// Session validity window: refresh just inside the controller's timeout.
const DEFAULT_SESSION_REFRESH_SECS: u64 = 270;

/// Messages pulled per poll cycle.
const DEFAULT_STREAM_BATCH_SIZE: usize = 128;

/// Errors from configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Event stream connection settings.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub host: String,
    pub port: u16,
    /// Topic (list key) the change events arrive on
    pub topic: String,
    /// Messages pulled per poll cycle
    pub batch_size: usize,
}

/// The validated configuration record the daemon starts from.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub tenant: String,
    pub application_profile: String,
    pub store: StoreConfig,
    pub stream: StreamConfig,
    pub controller: ApicConfig,
    /// Interval between session refreshes
    pub session_refresh: Duration,
}

impl SyncConfig {
    /// Reads and validates the configuration from process environment
    /// variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let required = |var: &'static str| -> Result<String, ConfigError> {
            lookup(var)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let tenant = required("TENANT_NAME")?;
        let application_profile = required("AP_NAME")?;

        let store = StoreConfig::new(required("STORE_HOST")?, parse(&lookup, "STORE_PORT")?);

        let stream = StreamConfig {
            host: required("STREAM_HOST")?,
            port: parse(&lookup, "STREAM_PORT")?,
            topic: required("STREAM_TOPIC")?,
            batch_size: match lookup("STREAM_BATCH_SIZE") {
                Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "STREAM_BATCH_SIZE",
                    value: raw,
                })?,
                None => DEFAULT_STREAM_BATCH_SIZE,
            },
        };

        let controller = ApicConfig {
            base_url: required("APIC_URL")?.trim_end_matches('/').to_string(),
            username: required("APIC_USERNAME")?,
            password: required("APIC_PASSWORD")?,
            tenant: tenant.clone(),
            application_profile: application_profile.clone(),
        };

        let session_refresh = match lookup("SESSION_REFRESH_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|_| ConfigError::Invalid {
                var: "SESSION_REFRESH_SECS",
                value: raw,
            })?),
            None => Duration::from_secs(DEFAULT_SESSION_REFRESH_SECS),
        };

        Ok(Self {
            tenant,
            application_profile,
            store,
            stream,
            controller,
            session_refresh,
        })
    }
}

fn parse<F>(lookup: &F, var: &'static str) -> Result<u16, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    let raw = lookup(var)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(var))?;
    raw.parse()
        .map_err(|_| ConfigError::Invalid { var, value: raw })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_env(var: &'static str) -> Option<String> {
        let value = match var {
            "TENANT_NAME" => "prod",
            "AP_NAME" => "web-app",
            "STORE_HOST" => "127.0.0.1",
            "STORE_PORT" => "6379",
            "STREAM_HOST" => "127.0.0.1",
            "STREAM_PORT" => "6380",
            "STREAM_TOPIC" => "topology-events",
            "APIC_URL" => "https://apic.example.com/",
            "APIC_USERNAME" => "admin",
            "APIC_PASSWORD" => "secret",
            _ => return None,
        };
        Some(value.to_string())
    }

    #[test]
    fn test_full_config_parses_with_defaults() {
        let config = SyncConfig::from_lookup(full_env).unwrap();
        assert_eq!(config.tenant, "prod");
        assert_eq!(config.application_profile, "web-app");
        assert_eq!(config.stream.topic, "topology-events");
        assert_eq!(config.stream.batch_size, DEFAULT_STREAM_BATCH_SIZE);
        assert_eq!(config.session_refresh, Duration::from_secs(270));
        // trailing slash is stripped so path joins stay clean
        assert_eq!(config.controller.base_url, "https://apic.example.com");
        assert_eq!(config.controller.tenant, "prod");
    }

    #[test]
    fn test_missing_variable_is_rejected() {
        let err = SyncConfig::from_lookup(|var| {
            if var == "TENANT_NAME" {
                None
            } else {
                full_env(var)
            }
        })
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("TENANT_NAME"));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let err = SyncConfig::from_lookup(|var| {
            if var == "STREAM_TOPIC" {
                Some(String::new())
            } else {
                full_env(var)
            }
        })
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("STREAM_TOPIC"));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = SyncConfig::from_lookup(|var| {
            if var == "STORE_PORT" {
                Some("not-a-port".to_string())
            } else {
                full_env(var)
            }
        })
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: "STORE_PORT",
                value: "not-a-port".to_string()
            }
        );
    }

    #[test]
    fn test_session_refresh_override() {
        let config = SyncConfig::from_lookup(|var| {
            if var == "SESSION_REFRESH_SECS" {
                Some("60".to_string())
            } else {
                full_env(var)
            }
        })
        .unwrap();
        assert_eq!(config.session_refresh, Duration::from_secs(60));
    }
}
