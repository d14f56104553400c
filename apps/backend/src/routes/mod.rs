use actix_web::web;

use crate::error::AppError;

pub mod health;
pub mod subprojects;

/// Register every application route plus the JSON 404 fallback.
///
/// Shared by `main.rs` and the test harness so both serve identical paths.
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Health check: /api/health (any method)
    health::configure_routes(cfg);

    // Subproject lookup: /api/subprojects/**
    cfg.service(web::scope("/api/subprojects").configure(subprojects::configure_routes));

    cfg.default_service(web::to(not_found));
}

async fn not_found() -> Result<actix_web::HttpResponse, AppError> {
    Err(AppError::NotFound)
}
