#![allow(dead_code)]

use projects_api::test_support::{create_test_state, seed_project, seed_subproject};
use projects_api::AppState;

// Logging is auto-installed for every test binary
#[ctor::ctor]
fn init_logging() {
    backend_test_support::logging::init();
}

/// Project 1 with subprojects "Beta" (id 10) and "Alpha" (id 11), inserted
/// in that order; project 2 exists with none.
pub async fn alpha_beta_state() -> AppState {
    let state = create_test_state().build().await.expect("test state");
    let pool = state.pool();
    seed_project(pool, 1, "Platform").await.expect("seed project 1");
    seed_project(pool, 2, "Empty").await.expect("seed project 2");
    seed_subproject(pool, 10, 1, "Beta", Some("second by name"))
        .await
        .expect("seed Beta");
    seed_subproject(pool, 11, 1, "Alpha", None)
        .await
        .expect("seed Alpha");
    state
}
