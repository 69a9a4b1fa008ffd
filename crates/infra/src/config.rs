//! Configuration loading and representation.
//!
//! Settings come from environment variables, read once at startup.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: '{value}' ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Which remote backend to talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// Process-local store (dev/test only).
    Memory,
    Postgres { database_url: String },
    Rest { base_url: String, api_key: String },
}

/// Infrastructure settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfraConfig {
    pub backend: BackendConfig,
    /// Upper bound for a single remote call (connection acquire or HTTP request).
    pub remote_timeout: Duration,
}

impl InfraConfig {
    /// Read configuration from the process environment.
    ///
    /// - `HARVEST_BACKEND`: `memory` (default), `postgres` or `rest`
    /// - `DATABASE_URL`: required for `postgres`
    /// - `HARVEST_REST_URL`, `HARVEST_REST_KEY`: required for `rest`
    /// - `HARVEST_REMOTE_TIMEOUT_SECS`: defaults to 10
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`InfraConfig::from_env`], reading through `lookup` instead.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let kind = lookup("HARVEST_BACKEND").unwrap_or_else(|| "memory".to_string());
        let backend = match kind.trim().to_ascii_lowercase().as_str() {
            "memory" => BackendConfig::Memory,
            "postgres" => BackendConfig::Postgres {
                database_url: required("DATABASE_URL")?,
            },
            "rest" => BackendConfig::Rest {
                base_url: required("HARVEST_REST_URL")?,
                api_key: required("HARVEST_REST_KEY")?,
            },
            _ => {
                return Err(ConfigError::Invalid {
                    name: "HARVEST_BACKEND",
                    value: kind,
                    reason: "expected memory, postgres or rest".to_string(),
                });
            }
        };

        let remote_timeout = match lookup("HARVEST_REMOTE_TIMEOUT_SECS") {
            None => Duration::from_secs(DEFAULT_REMOTE_TIMEOUT_SECS),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "HARVEST_REMOTE_TIMEOUT_SECS",
                        value: raw,
                        reason: "expected a positive number of seconds".to_string(),
                    });
                }
            },
        };

        Ok(Self {
            backend,
            remote_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_to_memory_backend() {
        let config = InfraConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.backend, BackendConfig::Memory);
        assert_eq!(config.remote_timeout, Duration::from_secs(10));
    }

    #[test]
    fn postgres_requires_database_url() {
        let err = InfraConfig::from_lookup(lookup(&[("HARVEST_BACKEND", "postgres")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn rest_backend_reads_url_and_key() {
        let config = InfraConfig::from_lookup(lookup(&[
            ("HARVEST_BACKEND", "REST"),
            ("HARVEST_REST_URL", "https://project.example"),
            ("HARVEST_REST_KEY", "anon"),
            ("HARVEST_REMOTE_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(
            config.backend,
            BackendConfig::Rest {
                base_url: "https://project.example".to_string(),
                api_key: "anon".to_string(),
            }
        );
        assert_eq!(config.remote_timeout, Duration::from_secs(3));
    }

    #[test]
    fn rejects_unknown_backend_and_bad_timeout() {
        assert!(matches!(
            InfraConfig::from_lookup(lookup(&[("HARVEST_BACKEND", "sqlite")])),
            Err(ConfigError::Invalid { name: "HARVEST_BACKEND", .. })
        ));
        assert!(matches!(
            InfraConfig::from_lookup(lookup(&[("HARVEST_REMOTE_TIMEOUT_SECS", "0")])),
            Err(ConfigError::Invalid { name: "HARVEST_REMOTE_TIMEOUT_SECS", .. })
        ));
    }
}
