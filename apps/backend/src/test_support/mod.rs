//! Test harness shared by unit and integration tests.
//!
//! Stage 1 builds an [`AppState`](crate::state::AppState) over an in-memory
//! SQLite pool with the schema created from the entities; stage 2 turns it
//! into an initialized Actix test service wired with the production routes
//! and middleware.

pub mod app_builder;
pub mod fixtures;
pub mod schema;
pub mod state_builder;

pub use app_builder::create_test_app;
pub use fixtures::{seed_project, seed_subproject};
pub use schema::create_schema;
pub use state_builder::create_test_state;
