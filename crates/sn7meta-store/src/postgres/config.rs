//! PostgreSQL configuration

use sqlx::postgres::PgConnectOptions;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::ports::OrphanKeyPolicy;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(String),

    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Where to connect: a URL or individual connection parameters
#[derive(Clone)]
pub enum ConnectionTarget {
    Url(String),
    Parts {
        host: String,
        port: u16,
        user: String,
        password: Option<String>,
        dbname: String,
    },
}

impl fmt::Debug for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionTarget::Url(_) => f.write_str("Url(<redacted>)"),
            ConnectionTarget::Parts { host, port, user, dbname, .. } => f
                .debug_struct("Parts")
                .field("host", host)
                .field("port", port)
                .field("user", user)
                .field("dbname", dbname)
                .finish_non_exhaustive(),
        }
    }
}

/// PostgreSQL connection and loader configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub target: ConnectionTarget,
    /// Connection pool configuration
    pub pool: PoolConfig,
    /// Handling of fact AOI keys with no `dim_aoi` row
    pub orphan_key_policy: OrphanKeyPolicy,
}

impl PostgresConfig {
    /// Load configuration from environment variables
    ///
    /// Requires DATABASE_URL to be set. Other settings use defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL".to_string()))?;
        Self::new(database_url).map_err(|_| ConfigError::Invalid {
            key: "DATABASE_URL".to_string(),
            reason: "cannot be empty".to_string(),
        })
    }

    /// Create a new configuration with the given database URL
    pub fn new(database_url: String) -> Result<Self, ConfigError> {
        let config = Self {
            target: ConnectionTarget::Url(database_url),
            pool: PoolConfig::default(),
            orphan_key_policy: OrphanKeyPolicy::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration from individual connection parameters
    pub fn from_parts(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: Option<String>,
        dbname: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            target: ConnectionTarget::Parts {
                host: host.into(),
                port,
                user: user.into(),
                password,
                dbname: dbname.into(),
            },
            pool: PoolConfig::default(),
            orphan_key_policy: OrphanKeyPolicy::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_orphan_key_policy(mut self, policy: OrphanKeyPolicy) -> Self {
        self.orphan_key_policy = policy;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.target {
            ConnectionTarget::Url(url) if url.trim().is_empty() => {
                return Err(invalid("database_url", "cannot be empty"));
            }
            ConnectionTarget::Parts { host, dbname, user, port, .. } => {
                if host.trim().is_empty() {
                    return Err(invalid("host", "cannot be empty"));
                }
                if user.trim().is_empty() {
                    return Err(invalid("user", "cannot be empty"));
                }
                if dbname.trim().is_empty() {
                    return Err(invalid("dbname", "cannot be empty"));
                }
                if *port == 0 {
                    return Err(invalid("port", "must be greater than 0"));
                }
            }
            ConnectionTarget::Url(_) => {}
        }

        self.pool.validate()
    }

    /// Build sqlx connection options
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        match &self.target {
            ConnectionTarget::Url(url) => {
                PgConnectOptions::from_str(url).map_err(|e| invalid("database_url", &e.to_string()))
            }
            ConnectionTarget::Parts { host, port, user, password, dbname } => {
                let options = PgConnectOptions::new().host(host).port(*port).username(user).database(dbname);
                Ok(match password {
                    Some(password) => options.password(password),
                    None => options,
                })
            }
        }
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { key: key.to_string(), reason: reason.to_string() }
}

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Maximum number of connections allowed
    pub max_connections: u32,
    /// Timeout for acquiring a connection from the pool
    pub acquire_timeout: Duration,
    /// Timeout for idle connections before they are closed
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

impl PoolConfig {
    /// Validate pool configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(invalid("pool.max_connections", "must be greater than 0"));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::Invalid {
                key: "pool.min_connections".to_string(),
                reason: format!(
                    "min_connections ({}) cannot be greater than max_connections ({})",
                    self.min_connections, self.max_connections
                ),
            });
        }

        Ok(())
    }
}
