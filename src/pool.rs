//! Connection manager: owns the process-wide PostgreSQL pool and its lifecycle.
//!
//! Built once at startup and handed to the store (no global state). Connections are
//! borrowed per operation through [`ConnectionManager::acquire`] and go back to the pool
//! when the guard drops, including when the awaiting future is cancelled.

use crate::config::{validate, DatabaseConfig};
use crate::error::{ConfigError, ConnectionError};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Postgres};
use std::sync::{PoisonError, RwLock};

enum PoolState {
    Unopened,
    Open(PgPool),
    Closed,
}

pub struct ConnectionManager {
    config: DatabaseConfig,
    state: RwLock<PoolState>,
}

impl ConnectionManager {
    /// Manager with no pool yet; call [`connect`](Self::connect) before use.
    pub fn new(config: DatabaseConfig) -> Result<Self, ConfigError> {
        validate(&config)?;
        Ok(ConnectionManager {
            config,
            state: RwLock::new(PoolState::Unopened),
        })
    }

    /// Create a manager and establish its pool. Unreachable hosts and rejected
    /// credentials fail here with [`ConnectionError::Connect`].
    pub async fn open(config: DatabaseConfig) -> Result<Self, ConnectionError> {
        let manager = Self::new(config)?;
        manager.connect().await?;
        Ok(manager)
    }

    /// Wrap an existing pool.
    pub fn with_pool(config: DatabaseConfig, pool: PgPool) -> Self {
        ConnectionManager {
            config,
            state: RwLock::new(PoolState::Open(pool)),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Establish the pool if not yet open and return a handle to it. One connection is
    /// opened eagerly so a bad target is reported now rather than on first use.
    pub async fn connect(&self) -> Result<PgPool, ConnectionError> {
        if let Some(settled) = self.settled() {
            return settled;
        }

        let creds = &self.config.credentials;
        let settings = &self.config.pool;
        let target = creds.target();
        let options = PgConnectOptions::new()
            .host(&creds.host)
            .port(creds.port)
            .username(&creds.user)
            .password(&creds.password)
            .database(&creds.database);
        let pool = PgPoolOptions::new()
            .min_connections(settings.min_connections)
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|source| {
                tracing::warn!(target_db = %target, error = %source, "database connect failed");
                ConnectionError::Connect {
                    target: target.clone(),
                    source,
                }
            })?;

        let rejected = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            match *state {
                PoolState::Open(ref existing) => Some(Ok(existing.clone())),
                PoolState::Closed => Some(Err(ConnectionError::Closed)),
                PoolState::Unopened => {
                    *state = PoolState::Open(pool.clone());
                    None
                }
            }
        };
        if let Some(result) = rejected {
            // Lost a race with a concurrent connect or close; keep the winner.
            pool.close().await;
            return result;
        }
        tracing::info!(
            target_db = %target,
            min = settings.min_connections,
            max = settings.max_connections,
            "database pool established"
        );
        Ok(pool)
    }

    /// `None` while unopened; otherwise the outcome `connect` must return.
    fn settled(&self) -> Option<Result<PgPool, ConnectionError>> {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            PoolState::Open(pool) => Some(Ok(pool.clone())),
            PoolState::Closed => Some(Err(ConnectionError::Closed)),
            PoolState::Unopened => None,
        }
    }

    /// Handle to the established pool.
    pub fn pool(&self) -> Result<PgPool, ConnectionError> {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            PoolState::Open(pool) if pool.is_closed() => Err(ConnectionError::Closed),
            PoolState::Open(pool) => Ok(pool.clone()),
            PoolState::Unopened => Err(ConnectionError::NotConnected),
            PoolState::Closed => Err(ConnectionError::Closed),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.pool().is_ok()
    }

    /// Borrow one connection, waiting at most the configured acquire timeout.
    pub async fn acquire(&self) -> Result<PoolConnection<Postgres>, ConnectionError> {
        let pool = self.pool()?;
        pool.acquire().await.map_err(ConnectionError::from_acquire)
    }

    /// Run a trivial query and return the server's version string.
    pub async fn health_check(&self) -> Result<String, ConnectionError> {
        let mut conn = self.acquire().await?;
        let version: String = sqlx::query_scalar("SELECT version()")
            .fetch_one(&mut *conn)
            .await
            .map_err(ConnectionError::HealthCheck)?;
        Ok(version)
    }

    /// Close every pooled connection. Further acquisitions fail with
    /// [`ConnectionError::Closed`]. No-op when never opened or already closed.
    pub async fn close(&self) {
        let pool = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            match std::mem::replace(&mut *state, PoolState::Closed) {
                PoolState::Open(pool) => pool,
                previous => {
                    *state = previous;
                    return;
                }
            }
        };
        pool.close().await;
        tracing::info!(target_db = %self.config.credentials.target(), "database pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, PoolSettings};
    use std::time::Duration;

    fn config(port: u16) -> DatabaseConfig {
        DatabaseConfig::new(Credentials {
            user: "invalid_user".into(),
            password: "invalid_password".into(),
            database: "invalid_db".into(),
            host: "127.0.0.1".into(),
            port,
        })
        .with_pool(PoolSettings {
            acquire_timeout: Duration::from_secs(2),
            ..PoolSettings::default()
        })
    }

    #[tokio::test]
    async fn unopened_manager_reports_not_connected() {
        let manager = ConnectionManager::new(config(5432)).unwrap();
        assert!(!manager.is_connected());
        assert!(matches!(manager.acquire().await, Err(ConnectionError::NotConnected)));
        assert!(matches!(manager.health_check().await, Err(ConnectionError::NotConnected)));
    }

    #[tokio::test]
    async fn close_is_idempotent_on_unopened_manager() {
        let manager = ConnectionManager::new(config(5432)).unwrap();
        manager.close().await;
        manager.close().await;
        assert!(matches!(manager.pool(), Err(ConnectionError::NotConnected)));
    }

    #[tokio::test]
    async fn unreachable_target_surfaces_connect_error() {
        let err = ConnectionManager::open(config(1)).await.err().expect("connect should fail");
        match err {
            ConnectionError::Connect { target, .. } => assert_eq!(target, "127.0.0.1:1/invalid_db"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn failed_connect_leaves_no_pool() {
        let manager = ConnectionManager::new(config(1)).unwrap();
        assert!(manager.connect().await.is_err());
        assert!(!manager.is_connected());
        assert!(matches!(manager.health_check().await, Err(ConnectionError::NotConnected)));
    }

    #[tokio::test]
    async fn closed_manager_refuses_acquire_and_reconnect() {
        let cfg = config(1);
        let pool = PgPoolOptions::new()
            .connect_lazy_with(PgConnectOptions::new().host("127.0.0.1").port(1));
        let manager = ConnectionManager::with_pool(cfg, pool);
        assert!(manager.is_connected());
        manager.close().await;
        manager.close().await;
        assert!(matches!(manager.acquire().await, Err(ConnectionError::Closed)));
        assert!(matches!(manager.connect().await, Err(ConnectionError::Closed)));
    }

    #[test]
    fn new_rejects_invalid_bounds() {
        let cfg = config(5432).with_pool(PoolSettings {
            min_connections: 3,
            max_connections: 1,
            ..PoolSettings::default()
        });
        assert!(ConnectionManager::new(cfg).is_err());
    }
}
