use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::DbInfraError;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_USER: &str = "root";
pub const DEFAULT_DATABASE: &str = "projects";
pub const DEFAULT_CONNECTION_LIMIT: u32 = 15;
/// 0 means waiters are never turned away.
pub const DEFAULT_QUEUE_LIMIT: u32 = 0;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_KEEP_ALIVE_INITIAL_DELAY_MS: u64 = 0;
pub const DEFAULT_KEEP_ALIVE_INTERVAL_MS: u64 = 30_000;

/// Database backend behind the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbKind {
    /// Production backend, configured from `DB_*` variables
    MySql,
    /// Shared-cache in-memory SQLite, used by tests
    SqliteMemory,
}

impl From<DbKind> for sea_orm::DatabaseBackend {
    fn from(kind: DbKind) -> Self {
        match kind {
            DbKind::MySql => sea_orm::DatabaseBackend::MySql,
            DbKind::SqliteMemory => sea_orm::DatabaseBackend::Sqlite,
        }
    }
}

/// Secret string that never renders in `Debug` or `Display`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Pool configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub kind: DbKind,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Password,
    pub database: String,
    pub connection_limit: u32,
    pub queue_limit: u32,
    pub connect_timeout_ms: u64,
    pub keep_alive: bool,
    pub keep_alive_initial_delay_ms: u64,
    pub keep_alive_interval_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            kind: DbKind::MySql,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            password: Password::default(),
            database: DEFAULT_DATABASE.to_string(),
            connection_limit: DEFAULT_CONNECTION_LIMIT,
            queue_limit: DEFAULT_QUEUE_LIMIT,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            keep_alive: true,
            keep_alive_initial_delay_ms: DEFAULT_KEEP_ALIVE_INITIAL_DELAY_MS,
            keep_alive_interval_ms: DEFAULT_KEEP_ALIVE_INTERVAL_MS,
        }
    }
}

impl PoolConfig {
    /// Build the MySQL configuration from the process environment.
    pub fn from_env() -> Result<Self, DbInfraError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the MySQL configuration from an arbitrary variable lookup.
    /// Missing variables fall back to their defaults; malformed ones are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DbInfraError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |name: &str, default: String| lookup(name).unwrap_or(default);

        let config = Self {
            kind: DbKind::MySql,
            host: text("DB_HOST", defaults.host),
            port: parsed(&lookup, "DB_PORT", defaults.port)?,
            user: text("DB_USER", defaults.user),
            password: Password::new(text("DB_PASSWORD", String::new())),
            database: text("DB_NAME", defaults.database),
            connection_limit: parsed(&lookup, "DB_CONNECTION_LIMIT", defaults.connection_limit)?,
            queue_limit: parsed(&lookup, "DB_QUEUE_LIMIT", defaults.queue_limit)?,
            connect_timeout_ms: parsed(&lookup, "DB_CONNECT_TIMEOUT_MS", defaults.connect_timeout_ms)?,
            keep_alive: flag(&lookup, "DB_KEEP_ALIVE", defaults.keep_alive)?,
            keep_alive_initial_delay_ms: parsed(
                &lookup,
                "DB_KEEP_ALIVE_INITIAL_DELAY_MS",
                defaults.keep_alive_initial_delay_ms,
            )?,
            keep_alive_interval_ms: parsed(
                &lookup,
                "DB_KEEP_ALIVE_INTERVAL_MS",
                defaults.keep_alive_interval_ms,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// In-memory SQLite pool configuration for tests.
    pub fn sqlite_memory(connection_limit: u32) -> Self {
        Self {
            kind: DbKind::SqliteMemory,
            host: String::new(),
            port: 0,
            user: String::new(),
            database: ":memory:".to_string(),
            connection_limit,
            keep_alive: false,
            ..Self::default()
        }
    }

    pub fn with_queue_limit(mut self, queue_limit: u32) -> Self {
        self.queue_limit = queue_limit;
        self
    }

    pub fn with_connect_timeout_ms(mut self, connect_timeout_ms: u64) -> Self {
        self.connect_timeout_ms = connect_timeout_ms;
        self
    }

    pub fn validate(&self) -> Result<(), DbInfraError> {
        if self.connection_limit == 0 {
            return Err(DbInfraError::config(
                "DB_CONNECTION_LIMIT must be at least 1",
            ));
        }
        if self.keep_alive && self.keep_alive_interval_ms == 0 {
            return Err(DbInfraError::config(
                "DB_KEEP_ALIVE_INTERVAL_MS must be positive when keep-alive is enabled",
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn keep_alive_initial_delay(&self) -> Duration {
        Duration::from_millis(self.keep_alive_initial_delay_ms)
    }

    pub fn keep_alive_interval(&self) -> Duration {
        Duration::from_millis(self.keep_alive_interval_ms)
    }

    /// Connection target with the password left out, for logs.
    pub fn describe(&self) -> String {
        match self.kind {
            DbKind::MySql => format!(
                "mysql://{}@{}:{}/{}",
                self.user, self.host, self.port, self.database
            ),
            DbKind::SqliteMemory => "sqlite::memory:".to_string(),
        }
    }
}

fn parsed<F, T>(lookup: &F, name: &str, default: T) -> Result<T, DbInfraError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            DbInfraError::config(format!(
                "environment variable '{name}' has invalid value '{raw}'"
            ))
        }),
    }
}

fn flag<F>(lookup: &F, name: &str, default: bool) -> Result<bool, DbInfraError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(DbInfraError::config(format!(
                "environment variable '{name}' must be a boolean, got '{raw}'"
            ))),
        },
    }
}
