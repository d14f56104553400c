//! Database pool configuration and connection management.
//! Used by the backend at startup and by its request handlers.

pub mod config;
pub mod error;
pub mod infra;

pub use config::db::{DbKind, Password, PoolConfig};
pub use error::DbInfraError;
pub use infra::db::{Accessor, DbPool, PoolStatus, PooledConnection};
