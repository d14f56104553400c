use db_infra::{DbPool, PoolConfig};

use crate::error::AppError;
use crate::state::app_state::AppState;

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    pool_config: Option<PoolConfig>,
    pool: Option<DbPool>,
    probe: bool,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            pool_config: None,
            pool: None,
            probe: true,
        }
    }

    /// Construct a fresh pool from `config` at build time.
    pub fn with_pool_config(mut self, config: PoolConfig) -> Self {
        self.pool_config = Some(config);
        self
    }

    /// Use an already constructed pool.
    pub fn with_pool(mut self, pool: DbPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Skip the startup connectivity probe.
    pub fn without_probe(mut self) -> Self {
        self.probe = false;
        self
    }

    /// Build the state. Invalid pool configuration is an error; an
    /// unreachable database is not. The probe runs detached and only logs,
    /// so the server can bind and serve `/api/health` while it is pending.
    pub async fn build(self) -> Result<AppState, AppError> {
        let pool = match (self.pool, self.pool_config) {
            (Some(pool), _) => pool,
            (None, Some(config)) => DbPool::connect(config).await?,
            (None, None) => return Err(AppError::config("no database pool configured")),
        };

        if self.probe {
            let probe_pool = pool.clone();
            tokio::spawn(async move {
                probe_pool.probe().await;
            });
        }

        Ok(AppState::new(pool))
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
