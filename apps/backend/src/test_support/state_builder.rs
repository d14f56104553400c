use db_infra::{DbPool, PoolConfig};

use crate::error::AppError;
use crate::infra::state::build_state;
use crate::state::app_state::AppState;
use crate::test_support::schema::create_schema;

/// Builder for creating test AppState instances
pub struct TestStateBuilder {
    pool_config: PoolConfig,
}

impl TestStateBuilder {
    /// In-memory SQLite with room for a few concurrent requests.
    pub fn new() -> Self {
        Self {
            pool_config: PoolConfig::sqlite_memory(4),
        }
    }

    pub fn with_connection_limit(mut self, limit: u32) -> Self {
        self.pool_config.connection_limit = limit;
        self
    }

    /// Use an arbitrary pool configuration, e.g. an unreachable MySQL host.
    /// No schema is created for non-SQLite pools.
    pub fn with_pool_config(mut self, config: PoolConfig) -> Self {
        self.pool_config = config;
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let is_sqlite = self.pool_config.kind == db_infra::DbKind::SqliteMemory;
        let pool = DbPool::connect(self.pool_config).await?;

        if is_sqlite {
            create_schema(&pool).await?;
        }

        build_state().with_pool(pool).without_probe().build().await
    }
}

impl Default for TestStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a new test state builder
///
/// # Example
/// ```rust,no_run
/// use projects_api::test_support::create_test_state;
///
/// # async fn example() -> Result<(), projects_api::AppError> {
/// let state = create_test_state().build().await?;
/// # Ok(())
/// # }
/// ```
pub fn create_test_state() -> TestStateBuilder {
    TestStateBuilder::new()
}
