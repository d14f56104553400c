mod gate;
mod keep_alive;
pub mod pool;
mod rows;

pub use pool::{Accessor, DbPool, PoolStatus, PooledConnection};
