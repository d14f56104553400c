use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbInfraError {
    #[error("Configuration error: {message}")]
    Config { message: String },
    #[error("failed to establish database connection: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("timed out after {timeout_ms}ms establishing a database connection")]
    ConnectTimeout { timeout_ms: u64 },
    #[error("connection queue is full ({limit} callers already waiting)")]
    QueueFull { limit: u32 },
    #[error("connection pool is closed")]
    Closed,
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),
    #[error("accessor query failed: {0}")]
    Accessor(#[from] sea_orm::DbErr),
}

impl DbInfraError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Classify an error returned by the physical pool while leasing a connection.
    pub(crate) fn from_acquire(e: sqlx::Error, timeout_ms: u64) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => Self::ConnectTimeout { timeout_ms },
            sqlx::Error::PoolClosed => Self::Closed,
            other => Self::Connect(other),
        }
    }

    /// True for failures that mean the database could not be reached at all,
    /// as opposed to a statement that reached it and failed.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::Connect(_) | Self::ConnectTimeout { .. } | Self::QueueFull { .. } | Self::Closed
        )
    }
}
