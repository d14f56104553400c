use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use sea_orm::{DatabaseConnection, SqlxMySqlConnector, SqlxSqliteConnector};
use serde_json::Value;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{MySql, Sqlite};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, trace};

use crate::config::db::{DbKind, PoolConfig};
use crate::error::DbInfraError;
use crate::infra::db::gate::{Gate, Slot};
use crate::infra::db::keep_alive;
use crate::infra::db::rows::{bind_params, mysql_unsigned, no_extra, row_to_json};

/// Physical sqlx pool behind the gate.
#[derive(Debug, Clone)]
pub(crate) enum Backend {
    MySql(MySqlPool),
    Sqlite(SqlitePool),
}

impl Backend {
    async fn lease(&self, timeout_ms: u64) -> Result<Leased, DbInfraError> {
        match self {
            Backend::MySql(pool) => pool
                .acquire()
                .await
                .map(Leased::MySql)
                .map_err(|e| DbInfraError::from_acquire(e, timeout_ms)),
            Backend::Sqlite(pool) => pool
                .acquire()
                .await
                .map(Leased::Sqlite)
                .map_err(|e| DbInfraError::from_acquire(e, timeout_ms)),
        }
    }

    fn size(&self) -> u32 {
        match self {
            Backend::MySql(pool) => pool.size(),
            Backend::Sqlite(pool) => pool.size(),
        }
    }

    fn num_idle(&self) -> usize {
        match self {
            Backend::MySql(pool) => pool.num_idle(),
            Backend::Sqlite(pool) => pool.num_idle(),
        }
    }

    async fn close(&self) {
        match self {
            Backend::MySql(pool) => pool.close().await,
            Backend::Sqlite(pool) => pool.close().await,
        }
    }
}

enum Leased {
    MySql(PoolConnection<MySql>),
    Sqlite(PoolConnection<Sqlite>),
}

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Connection limit from configuration
    pub limit: u32,
    /// Physical connections currently open
    pub size: u32,
    /// Open connections sitting idle in the physical pool
    pub idle: usize,
    /// Leases currently held (connections and accessor operations)
    pub in_use: u32,
    /// Callers queued for a free slot
    pub waiting: u32,
}

struct PoolInner {
    config: PoolConfig,
    gate: Gate,
    backend: Backend,
    orm: DatabaseConnection,
    _keep_alive: Option<DropGuard>,
    shutdown: CancellationToken,
}

/// Bounded pool of database connections shared by all request handlers.
///
/// Construct once at startup and hand clones to whoever needs the database;
/// clones share the same connections.
#[derive(Clone)]
pub struct DbPool {
    inner: Arc<PoolInner>,
}

impl fmt::Debug for DbPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbPool")
            .field("target", &self.inner.config.describe())
            .field("status", &self.status())
            .finish()
    }
}

impl DbPool {
    /// Build the pool. MySQL connections are opened lazily, so an unreachable
    /// server does not fail construction; only invalid configuration does.
    pub async fn connect(config: PoolConfig) -> Result<Self, DbInfraError> {
        config.validate()?;

        let backend = match config.kind {
            DbKind::MySql => {
                let options = MySqlConnectOptions::new()
                    .host(&config.host)
                    .port(config.port)
                    .username(&config.user)
                    .password(config.password.expose())
                    .database(&config.database);

                let pool = MySqlPoolOptions::new()
                    .min_connections(0)
                    .max_connections(config.connection_limit)
                    .acquire_timeout(config.connect_timeout())
                    .test_before_acquire(config.keep_alive)
                    .connect_lazy_with(options);
                Backend::MySql(pool)
            }
            DbKind::SqliteMemory => {
                // Every connection opened from these options shares one in-memory database;
                // it lives as long as one connection stays open.
                let options = SqliteConnectOptions::from_str("sqlite::memory:")
                    .map_err(|e| DbInfraError::config(format!("invalid SQLite options: {e}")))?
                    .foreign_keys(true);

                let pool = SqlitePoolOptions::new()
                    .min_connections(1)
                    .max_connections(config.connection_limit)
                    .acquire_timeout(config.connect_timeout())
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(options)
                    .await
                    .map_err(DbInfraError::Connect)?;
                Backend::Sqlite(pool)
            }
        };

        let orm = match &backend {
            Backend::MySql(pool) => SqlxMySqlConnector::from_sqlx_mysql_pool(pool.clone()),
            Backend::Sqlite(pool) => SqlxSqliteConnector::from_sqlx_sqlite_pool(pool.clone()),
        };

        let gate = Gate::new(config.connection_limit, config.queue_limit);
        let shutdown = CancellationToken::new();

        let keep_alive_guard = if config.keep_alive {
            keep_alive::spawn(
                backend.clone(),
                gate.clone(),
                config.keep_alive_initial_delay(),
                config.keep_alive_interval(),
                shutdown.child_token(),
            );
            Some(shutdown.clone().drop_guard())
        } else {
            None
        };

        info!(
            pool = "create",
            target = %config.describe(),
            limit = config.connection_limit,
            queue_limit = config.queue_limit,
            connect_timeout_ms = config.connect_timeout_ms,
            keep_alive = config.keep_alive,
            "database pool constructed"
        );

        Ok(Self {
            inner: Arc::new(PoolInner {
                config,
                gate,
                backend,
                orm,
                _keep_alive: keep_alive_guard,
                shutdown,
            }),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    pub fn kind(&self) -> DbKind {
        self.inner.config.kind
    }

    /// Lease one connection for the caller's exclusive use.
    ///
    /// Waits for a free slot while the pool is fully leased (or fails fast
    /// with [`DbInfraError::QueueFull`] when the queue limit is reached), then
    /// opens or reuses a physical connection within the connect timeout.
    pub async fn acquire(&self) -> Result<PooledConnection, DbInfraError> {
        let start = Instant::now();
        let slot = self.inner.gate.enter().await?;
        let conn = self
            .inner
            .backend
            .lease(self.inner.config.connect_timeout_ms)
            .await?;
        trace!(
            pool = "acquire",
            waited_ms = start.elapsed().as_millis() as u64,
            in_use = self.inner.gate.in_use()
        );
        Ok(PooledConnection { conn, _slot: slot })
    }

    /// Hand a leased connection back. Dropping it has the same effect; this
    /// exists so call sites can make the release point explicit.
    pub fn release(&self, conn: PooledConnection) {
        drop(conn);
        trace!(pool = "release", in_use = self.inner.gate.in_use());
    }

    /// Run one parameterized statement on a temporarily leased connection and
    /// return its rows as JSON objects. The connection goes back to the pool
    /// whether or not the statement succeeds.
    pub async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>, DbInfraError> {
        let mut conn = self.acquire().await?;
        let result = conn.query(sql, params).await;
        self.release(conn);
        result
    }

    /// Admit one ORM operation under the same limit and queue policy as
    /// [`DbPool::acquire`].
    pub async fn accessor(&self) -> Result<Accessor<'_>, DbInfraError> {
        let slot = self.inner.gate.enter().await?;
        Ok(Accessor {
            conn: &self.inner.orm,
            _slot: slot,
        })
    }

    /// One acquire / `SELECT 1` / release cycle. Logs the outcome and
    /// returns whether the database answered; never an error.
    pub async fn probe(&self) -> bool {
        let start = Instant::now();
        match self.query("SELECT 1 AS ok", &[]).await {
            Ok(_) => {
                info!(
                    pool = "probe",
                    ok = true,
                    target = %self.inner.config.describe(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "database reachable"
                );
                true
            }
            Err(e) => {
                error!(
                    pool = "probe",
                    ok = false,
                    target = %self.inner.config.describe(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "database unreachable at startup; continuing"
                );
                false
            }
        }
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            limit: self.inner.gate.limit(),
            size: self.inner.backend.size(),
            idle: self.inner.backend.num_idle(),
            in_use: self.inner.gate.in_use(),
            waiting: self.inner.gate.waiting(),
        }
    }

    /// Stop the keep-alive task, turn away current and future waiters, and
    /// close every physical connection once its lease ends.
    pub async fn close(&self) {
        self.inner.shutdown.cancel();
        self.inner.gate.close();
        self.inner.backend.close().await;
        debug!(pool = "close", target = %self.inner.config.describe());
    }

    pub fn is_closed(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }
}

/// A connection leased from [`DbPool`]. Released when dropped.
pub struct PooledConnection {
    conn: Leased,
    _slot: Slot,
}

impl fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.conn {
            Leased::MySql(_) => DbKind::MySql,
            Leased::Sqlite(_) => DbKind::SqliteMemory,
        };
        f.debug_struct("PooledConnection").field("kind", &kind).finish()
    }
}

impl PooledConnection {
    /// Run a statement and collect its rows as JSON objects.
    pub async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Value>, DbInfraError> {
        match &mut self.conn {
            Leased::MySql(conn) => {
                let rows = bind_params(sqlx::query::<MySql>(sql), params)
                    .fetch_all(&mut **conn)
                    .await
                    .map_err(DbInfraError::Query)?;
                Ok(rows.iter().map(|row| row_to_json(row, mysql_unsigned)).collect())
            }
            Leased::Sqlite(conn) => {
                let rows = bind_params(sqlx::query::<Sqlite>(sql), params)
                    .fetch_all(&mut **conn)
                    .await
                    .map_err(DbInfraError::Query)?;
                Ok(rows.iter().map(|row| row_to_json(row, no_extra)).collect())
            }
        }
    }

    /// Run a statement that returns no rows; yields the affected row count.
    pub async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DbInfraError> {
        match &mut self.conn {
            Leased::MySql(conn) => bind_params(sqlx::query::<MySql>(sql), params)
                .execute(&mut **conn)
                .await
                .map(|done| done.rows_affected())
                .map_err(DbInfraError::Query),
            Leased::Sqlite(conn) => bind_params(sqlx::query::<Sqlite>(sql), params)
                .execute(&mut **conn)
                .await
                .map(|done| done.rows_affected())
                .map_err(DbInfraError::Query),
        }
    }
}

/// Admitted access to the ORM connection. Holds a pool slot until dropped.
pub struct Accessor<'p> {
    conn: &'p DatabaseConnection,
    _slot: Slot,
}

impl Deref for Accessor<'_> {
    type Target = DatabaseConnection;

    fn deref(&self) -> &Self::Target {
        self.conn
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    async fn sqlite_pool(limit: u32) -> DbPool {
        DbPool::connect(PoolConfig::sqlite_memory(limit))
            .await
            .expect("in-memory pool")
    }

    #[tokio::test]
    async fn query_returns_rows_as_objects() {
        let pool = sqlite_pool(2).await;
        let rows = pool.query("SELECT 1 AS status", &[]).await.unwrap();
        assert_eq!(rows, vec![json!({"status": 1})]);
        assert_eq!(pool.status().in_use, 0);
    }

    #[tokio::test]
    async fn query_binds_json_params() {
        let pool = sqlite_pool(1).await;
        let rows = pool
            .query(
                "SELECT ? AS n, ? AS s, ? AS f, ? AS missing",
                &[json!(42), json!("hi"), json!(1.5), Value::Null],
            )
            .await
            .unwrap();
        assert_eq!(rows, vec![json!({"n": 42, "s": "hi", "f": 1.5, "missing": null})]);
    }

    #[tokio::test]
    async fn failed_query_still_releases_connection() {
        let pool = sqlite_pool(1).await;
        let err = pool.query("SELECT * FROM no_such_table", &[]).await;
        assert!(matches!(err, Err(DbInfraError::Query(_))));
        assert_eq!(pool.status().in_use, 0);

        // The single slot is free again.
        let rows = pool.query("SELECT 2 AS two", &[]).await.unwrap();
        assert_eq!(rows[0]["two"], 2);
    }

    #[tokio::test]
    async fn leased_connection_runs_multiple_statements() {
        let pool = sqlite_pool(2).await;
        let mut conn = pool.acquire().await.unwrap();
        conn.execute("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT NOT NULL)", &[])
            .await
            .unwrap();
        let inserted = conn
            .execute("INSERT INTO notes (id, body) VALUES (?, ?), (?, ?)", &[
                json!(1),
                json!("first"),
                json!(2),
                json!("second"),
            ])
            .await
            .unwrap();
        assert_eq!(inserted, 2);
        let rows = conn
            .query("SELECT body FROM notes ORDER BY id", &[])
            .await
            .unwrap();
        assert_eq!(rows, vec![json!({"body": "first"}), json!({"body": "second"})]);
        assert_eq!(pool.status().in_use, 1);
        pool.release(conn);
        assert_eq!(pool.status().in_use, 0);
    }

    #[tokio::test]
    async fn lease_dropped_on_error_path_is_released() {
        let pool = sqlite_pool(1).await;

        async fn fails_midway(pool: &DbPool) -> Result<(), DbInfraError> {
            let mut conn = pool.acquire().await?;
            conn.query("SELECT broken syntax here", &[]).await?;
            Ok(())
        }

        assert!(fails_midway(&pool).await.is_err());
        assert_eq!(pool.status().in_use, 0);
        assert!(pool.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn accessor_holds_a_slot() {
        let pool = sqlite_pool(1).await;
        let accessor = pool.accessor().await.unwrap();
        assert_eq!(pool.status().in_use, 1);

        let blocked = tokio::time::timeout(Duration::from_millis(50), pool.acquire()).await;
        assert!(blocked.is_err(), "acquire should wait while the accessor is held");

        drop(accessor);
        assert!(pool.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn probe_reports_reachable_database() {
        let pool = sqlite_pool(1).await;
        assert!(pool.probe().await);
        assert_eq!(pool.status().in_use, 0);
    }

    #[tokio::test]
    async fn closed_pool_rejects_acquire() {
        let pool = sqlite_pool(1).await;
        pool.close().await;
        assert!(pool.is_closed());
        assert!(matches!(pool.acquire().await, Err(DbInfraError::Closed)));
        assert!(matches!(pool.query("SELECT 1", &[]).await, Err(DbInfraError::Closed)));
    }

    #[tokio::test]
    async fn mysql_pool_construction_does_not_touch_the_network() {
        let config = PoolConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            keep_alive: false,
            ..PoolConfig::default()
        };
        let pool = DbPool::connect(config).await.expect("lazy pool");
        assert_eq!(pool.kind(), DbKind::MySql);
        assert_eq!(pool.status().size, 0);
    }

    #[tokio::test]
    async fn unreachable_mysql_surfaces_error_without_retrying_forever() {
        let config = PoolConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            keep_alive: false,
            ..PoolConfig::default()
        }
        .with_connect_timeout_ms(300);
        let pool = DbPool::connect(config).await.unwrap();

        let outcome = tokio::time::timeout(Duration::from_secs(5), pool.query("SELECT 1", &[]))
            .await
            .expect("connect timeout must bound the attempt");
        let err = outcome.unwrap_err();
        assert!(err.is_connectivity(), "got: {err}");
        assert!(!pool.probe().await);
        assert_eq!(pool.status().in_use, 0);
    }
}
