//! Database infrastructure - pooling, admission control and diagnostics.

pub mod db;
