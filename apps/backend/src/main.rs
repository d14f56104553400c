use actix_web::{web, App, HttpServer};
use db_infra::PoolConfig;
use projects_api::config::ServerConfig;
use projects_api::infra::state::build_state;
use projects_api::middleware::request_trace::RequestTrace;
use projects_api::middleware::structured_logger::StructuredLogger;
use projects_api::routes;
use projects_api::telemetry;
use tracing::{error, info};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = telemetry::init_tracing() {
        eprintln!("failed to install tracing subscriber: {e}");
    }

    // Configuration is read once here; bad values abort startup.
    let server = match ServerConfig::from_env() {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "invalid server configuration");
            std::process::exit(1);
        }
    };
    let pool_config = match PoolConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid database configuration");
            std::process::exit(1);
        }
    };

    // The startup probe runs in the background: an unreachable database is
    // logged and never delays binding, so /api/health can report it.
    let app_state = match build_state().with_pool_config(pool_config).build().await {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "failed to build application state");
            std::process::exit(1);
        }
    };
    let pool = app_state.pool().clone();

    info!(host = %server.host, port = server.port, "starting projects-api");

    let data = web::Data::new(app_state);

    let result = HttpServer::new(move || {
        App::new()
            .wrap(StructuredLogger)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind(server.bind_addr())?
    .run()
    .await;

    pool.close().await;
    info!("database pool closed");

    result
}
