use actix_web::{web, HttpResponse};
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;
use crate::state::app_state::AppState;

const LIVENESS_QUERY: &str = "SELECT 1 AS status";

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    results: Vec<Value>,
}

/// Round-trip one trivial statement through the pool. Any pool or query
/// failure becomes a 503 so the endpoint reports an outage instead of hanging.
async fn health(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let results = app_state
        .pool()
        .query(LIVENESS_QUERY, &[])
        .await
        .map_err(AppError::unavailable)?;

    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "UP",
        results,
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").to(health));
}
