//! Config validation: pool bounds and required credential parts.

use crate::config::DatabaseConfig;
use crate::error::ConfigError;

pub fn validate(config: &DatabaseConfig) -> Result<(), ConfigError> {
    let pool = &config.pool;
    if pool.max_connections == 0 {
        return Err(ConfigError::Validation("max_connections must be at least 1".into()));
    }
    if pool.min_connections > pool.max_connections {
        return Err(ConfigError::Validation(format!(
            "min_connections ({}) exceeds max_connections ({})",
            pool.min_connections, pool.max_connections
        )));
    }
    if pool.acquire_timeout.is_zero() {
        return Err(ConfigError::Validation("acquire_timeout must be positive".into()));
    }
    let creds = &config.credentials;
    if creds.host.trim().is_empty() {
        return Err(ConfigError::Validation("host must not be empty".into()));
    }
    if creds.database.trim().is_empty() {
        return Err(ConfigError::Validation("database must not be empty".into()));
    }
    if creds.port == 0 {
        return Err(ConfigError::Validation("port must not be 0".into()));
    }
    Ok(())
}
