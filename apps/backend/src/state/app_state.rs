use db_infra::DbPool;

/// Application state shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The process-wide connection pool; clones share its connections
    pub pool: DbPool,
}

impl AppState {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}
