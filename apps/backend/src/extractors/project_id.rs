use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const INVALID_PROJECT_ID: &str = "Invalid Project ID";

/// Project id taken from the `{project_id}` path segment.
///
/// Accepts any base-10 `i64`; empty, fractional or non-numeric segments are
/// rejected with a validation error.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ProjectId(pub i64);

impl ProjectId {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        raw.parse::<i64>()
            .map(ProjectId)
            .map_err(|_| AppError::invalid(INVALID_PROJECT_ID))
    }
}

impl FromRequest for ProjectId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let raw = req.match_info().get("project_id").unwrap_or_default();
        ready(ProjectId::parse(raw))
    }
}
