use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::error::AppError;
use crate::extractors::ProjectId;
use crate::repos::subprojects::{self, Subproject};
use crate::state::app_state::AppState;

#[derive(Debug, Serialize)]
struct SubprojectsResponse {
    status: &'static str,
    subprojects: Vec<Subproject>,
}

async fn by_project(
    project_id: ProjectId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let subprojects = subprojects::list_for_project(app_state.pool(), project_id.0)
        .await
        .map_err(|e| AppError::internal("Error loading subprojects", e))?;

    Ok(HttpResponse::Ok().json(SubprojectsResponse {
        status: "success",
        subprojects,
    }))
}

async fn method_not_allowed() -> Result<HttpResponse, AppError> {
    Err(AppError::MethodNotAllowed)
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // The segment may be empty so "/by-project/" reaches the id check.
    cfg.service(
        web::resource("/by-project/{project_id:[^/]*}")
            .route(web::get().to(by_project))
            .default_service(web::to(method_not_allowed)),
    );
}
