//! Process-wide tracing subscriber for the server binary.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application and pool events at info; framework and driver chatter only
/// when it is a warning.
const DEFAULT_FILTER: &str = "info,projects_api=info,db_infra=info,actix_web=info,sqlx=warn,sea_orm=warn";

/// `RUST_LOG` when set and valid, otherwise [`DEFAULT_FILTER`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install JSON-formatted output. Fails if a subscriber is already set.
pub fn init_tracing() -> Result<(), tracing_subscriber::util::TryInitError> {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_ansi(false)
        .json();

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .try_init()
}
