//! Load database config from the process environment (and `.env`, when present).

use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_USER: &str = "DB_USER";
pub const ENV_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_DATABASE: &str = "DB_NAME";
pub const ENV_HOST: &str = "DB_HOST";
pub const ENV_PORT: &str = "DB_PORT";
pub const ENV_POOL_MIN: &str = "DB_POOL_MIN";
pub const ENV_POOL_MAX: &str = "DB_POOL_MAX";
pub const ENV_ACQUIRE_TIMEOUT: &str = "DB_ACQUIRE_TIMEOUT_SECS";

impl DatabaseConfig {
    /// Read `DB_*` variables after loading `.env`. Fails on missing credentials or invalid bounds.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` uses the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let credentials = Credentials {
            user: required(ENV_USER)?,
            // Empty passwords are legal; kept verbatim.
            password: lookup(ENV_PASSWORD).unwrap_or_default(),
            database: required(ENV_DATABASE)?,
            host: required(ENV_HOST)?,
            port: parse_or(ENV_PORT, get(ENV_PORT), DEFAULT_PORT)?,
        };
        let pool = PoolSettings {
            min_connections: parse_or(ENV_POOL_MIN, get(ENV_POOL_MIN), DEFAULT_MIN_CONNECTIONS)?,
            max_connections: parse_or(ENV_POOL_MAX, get(ENV_POOL_MAX), DEFAULT_MAX_CONNECTIONS)?,
            acquire_timeout: match get(ENV_ACQUIRE_TIMEOUT) {
                Some(v) => Duration::from_secs(parse_value(ENV_ACQUIRE_TIMEOUT, &v)?),
                None => DEFAULT_ACQUIRE_TIMEOUT,
            },
        };
        let config = DatabaseConfig { credentials, pool };
        validate(&config)?;
        Ok(config)
    }
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(v) => parse_value(var, &v),
        None => Ok(default),
    }
}

fn parse_value<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: format!("{}: {}", raw, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("DB_USER", "app"),
        ("DB_PASSWORD", "pw"),
        ("DB_NAME", "catalog"),
        ("DB_HOST", "db.internal"),
    ];

    #[test]
    fn applies_defaults() {
        let c = DatabaseConfig::from_lookup(env(BASE)).unwrap();
        assert_eq!(c.credentials.port, 5432);
        assert_eq!(c.credentials.target(), "db.internal:5432/catalog");
        assert_eq!(c.pool, PoolSettings::default());
    }

    #[test]
    fn reads_pool_overrides() {
        let mut pairs = BASE.to_vec();
        pairs.extend([
            ("DB_PORT", "6543"),
            ("DB_POOL_MIN", "2"),
            ("DB_POOL_MAX", "4"),
            ("DB_ACQUIRE_TIMEOUT_SECS", "9"),
        ]);
        let c = DatabaseConfig::from_lookup(env(&pairs)).unwrap();
        assert_eq!(c.credentials.port, 6543);
        assert_eq!(c.pool.min_connections, 2);
        assert_eq!(c.pool.max_connections, 4);
        assert_eq!(c.pool.acquire_timeout, Duration::from_secs(9));
    }

    #[test]
    fn missing_host_is_reported() {
        let pairs: Vec<_> = BASE.iter().copied().filter(|(k, _)| *k != "DB_HOST").collect();
        assert!(matches!(
            DatabaseConfig::from_lookup(env(&pairs)),
            Err(ConfigError::Missing("DB_HOST"))
        ));
    }

    #[test]
    fn bad_port_is_reported() {
        let mut pairs = BASE.to_vec();
        pairs.push(("DB_PORT", "ninety"));
        assert!(matches!(
            DatabaseConfig::from_lookup(env(&pairs)),
            Err(ConfigError::Invalid { var: "DB_PORT", .. })
        ));
    }

    #[test]
    fn inverted_pool_bounds_fail_validation() {
        let mut pairs = BASE.to_vec();
        pairs.extend([("DB_POOL_MIN", "8"), ("DB_POOL_MAX", "3")]);
        assert!(matches!(
            DatabaseConfig::from_lookup(env(&pairs)),
            Err(ConfigError::Validation(_))
        ));
    }
}
