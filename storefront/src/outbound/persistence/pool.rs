//! Single-connection MySQL pool built on `sqlx`.
//!
//! The program is strictly sequential, so the pool never holds more than one
//! connection. Going through a pool still buys scoped checkout: a transaction
//! begun with [`DbPool::begin`] owns the connection and rolls back when it is
//! dropped uncommitted.

use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::{MySql, Transaction};

/// Errors that can occur during pool operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// Failed to open the connection.
    #[error("failed to connect to {host}:{port}: {message}")]
    Connect {
        host: String,
        port: u16,
        message: String,
    },
}

/// Configuration for the database connection.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use storefront::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::new("localhost", 3306, "app")
///     .with_password(Some("secret".to_owned()))
///     .with_acquire_timeout(Duration::from_secs(5));
/// assert_eq!(config.host(), "localhost");
/// ```
#[derive(Clone)]
pub struct PoolConfig {
    host: String,
    port: u16,
    username: String,
    password: Option<String>,
    acquire_timeout: Duration,
}

impl PoolConfig {
    /// Create a new configuration for the given server and user.
    ///
    /// The acquire timeout defaults to 30 seconds.
    pub fn new(host: impl Into<String>, port: u16, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: None,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// Set the password used to authenticate.
    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    /// Set how long to wait for the connection to become available.
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Server host name.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Server port.
    pub fn port(&self) -> u16 {
        self.port
    }

    fn connect_options(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username);
        match &self.password {
            Some(password) => options.password(password),
            None => options,
        }
    }
}

impl std::fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

/// Connection pool limited to a single MySQL connection.
#[derive(Clone)]
pub struct DbPool {
    inner: MySqlPool,
}

impl DbPool {
    /// Open the connection described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Connect` when the server is unreachable or rejects
    /// the credentials.
    pub async fn connect(config: &PoolConfig) -> Result<Self, PoolError> {
        let inner = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(config.connect_options())
            .await
            .map_err(|err| PoolError::Connect {
                host: config.host.clone(),
                port: config.port,
                message: err.to_string(),
            })?;
        Ok(Self { inner })
    }

    /// Begin a transaction on the pooled connection.
    ///
    /// # Errors
    ///
    /// Returns the driver error when checkout or `BEGIN` fails.
    pub async fn begin(&self) -> Result<Transaction<'static, MySql>, sqlx::Error> {
        self.inner.begin().await
    }

    /// Borrow the underlying `sqlx` pool for one-off statements.
    pub fn inner(&self) -> &MySqlPool {
        &self.inner
    }

    /// Close the connection gracefully.
    pub async fn close(&self) {
        self.inner.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_config_default_values() {
        let config = PoolConfig::new("localhost", 3306, "app");

        assert_eq!(config.host(), "localhost");
        assert_eq!(config.port(), 3306);
        assert!(config.password.is_none());
        assert_eq!(config.acquire_timeout, Duration::from_secs(30));
    }

    #[rstest]
    fn pool_config_builder_pattern() {
        let config = PoolConfig::new("db.internal", 3307, "app")
            .with_password(Some("hunter2".to_owned()))
            .with_acquire_timeout(Duration::from_secs(5));

        assert_eq!(config.password.as_deref(), Some("hunter2"));
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
    }

    #[rstest]
    fn debug_output_redacts_password() {
        let config = PoolConfig::new("localhost", 3306, "app")
            .with_password(Some("hunter2".to_owned()));

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[rstest]
    fn connect_error_names_the_server() {
        let err = PoolError::Connect {
            host: "localhost".to_owned(),
            port: 3306,
            message: "connection refused".to_owned(),
        };

        assert_eq!(
            err.to_string(),
            "failed to connect to localhost:3306: connection refused"
        );
    }
}
