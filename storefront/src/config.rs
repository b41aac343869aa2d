//! Connection configuration loaded via OrthoConfig.
//!
//! `StorefrontSettings` holds the layered values (`STOREFRONT_*` environment
//! variables or a config file). Credentials missing there fall back to the
//! legacy `MYSQLUSER` and `MYSQLPASS` variables.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{SchemaName, SchemaNameError};
use crate::outbound::persistence::PoolConfig;

/// Legacy variable naming the MySQL user.
pub const LEGACY_USER_ENV: &str = "MYSQLUSER";
/// Legacy variable holding the MySQL password.
pub const LEGACY_PASSWORD_ENV: &str = "MYSQLPASS";

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 3306;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Environment abstraction for credential fallback lookups.
pub trait CredentialEnv {
    /// Fetch a string value by name.
    fn string(&self, name: &str) -> Option<String>;
}

/// Environment access backed by the real process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCredentialEnv;

impl CredentialEnv for DefaultCredentialEnv {
    fn string(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Errors raised while resolving connection settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Layered configuration could not be loaded.
    #[error("failed to load configuration: {message}")]
    Load { message: String },
    /// No MySQL user was configured anywhere.
    #[error("no database user configured; set STOREFRONT_USER or {LEGACY_USER_ENV}")]
    MissingUser,
    /// The configured schema name is not a safe identifier.
    #[error("invalid schema name: {0}")]
    InvalidSchema(#[from] SchemaNameError),
    /// The acquire timeout must be positive.
    #[error("acquire timeout must be at least one second")]
    ZeroAcquireTimeout,
}

/// Layered configuration values for the storefront database connection.
///
/// `port` and `acquire_timeout_secs` carry defaults so the merged layer is
/// never empty when no `STOREFRONT_*` variable is set.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "STOREFRONT")]
pub struct StorefrontSettings {
    /// MySQL server host.
    pub host: Option<String>,
    /// MySQL server port.
    #[ortho_config(default = 3306)]
    pub port: u16,
    /// Schema holding the storefront tables.
    pub schema: Option<String>,
    /// Database user.
    pub user: Option<String>,
    /// Database password.
    pub password: Option<String>,
    /// Seconds to wait for the pooled connection.
    #[ortho_config(default = 30)]
    pub acquire_timeout_secs: u64,
}

impl Default for StorefrontSettings {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_PORT,
            schema: None,
            user: None,
            password: None,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl StorefrontSettings {
    /// Load settings from the environment and any config file.
    ///
    /// Command-line arguments are owned by the CLI, so only the program
    /// name is passed to the loader.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("storefront")]).map_err(|err| {
            ConfigError::Load {
                message: err.to_string(),
            }
        })
    }

    /// Resolve defaults and credential fallbacks.
    ///
    /// # Examples
    ///
    /// ```
    /// use storefront::config::{CredentialEnv, StorefrontSettings};
    ///
    /// struct Legacy;
    /// impl CredentialEnv for Legacy {
    ///     fn string(&self, name: &str) -> Option<String> {
    ///         (name == "MYSQLUSER").then(|| "shop".to_owned())
    ///     }
    /// }
    ///
    /// let settings = StorefrontSettings::default().resolve(&Legacy).expect("resolves");
    /// assert_eq!(settings.user(), "shop");
    /// assert_eq!(settings.port(), 3306);
    /// ```
    pub fn resolve<E: CredentialEnv>(&self, env: &E) -> Result<ConnectionSettings, ConfigError> {
        let user = self
            .user
            .clone()
            .or_else(|| env.string(LEGACY_USER_ENV))
            .filter(|user| !user.is_empty())
            .ok_or(ConfigError::MissingUser)?;
        let password = self
            .password
            .clone()
            .or_else(|| env.string(LEGACY_PASSWORD_ENV));
        let schema = match &self.schema {
            Some(raw) => SchemaName::new(raw.as_str())?,
            None => SchemaName::default(),
        };
        let acquire_timeout_secs = self.acquire_timeout_secs;
        if acquire_timeout_secs == 0 {
            return Err(ConfigError::ZeroAcquireTimeout);
        }

        Ok(ConnectionSettings {
            host: self
                .host
                .clone()
                .unwrap_or_else(|| DEFAULT_HOST.to_owned()),
            port: self.port,
            schema,
            user,
            password,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
        })
    }
}

/// Fully resolved connection parameters.
#[derive(Clone)]
pub struct ConnectionSettings {
    host: String,
    port: u16,
    schema: SchemaName,
    user: String,
    password: Option<String>,
    acquire_timeout: Duration,
}

impl ConnectionSettings {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn schema(&self) -> &SchemaName {
        &self.schema
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn acquire_timeout(&self) -> Duration {
        self.acquire_timeout
    }

    /// Pool configuration for these settings.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new(&self.host, self.port, &self.user)
            .with_password(self.password.clone())
            .with_acquire_timeout(self.acquire_timeout)
    }
}

impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("schema", &self.schema)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}
