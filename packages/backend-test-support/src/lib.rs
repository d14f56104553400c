//! Backend test support utilities
//!
//! Shared by the backend's integration tests: unified logging initialization
//! and assertions for the JSON error contract.

pub mod error_body;
pub mod logging;
