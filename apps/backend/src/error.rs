use std::fmt::Display;

use actix_web::error::ResponseError;
use actix_web::http::{header, StatusCode};
use actix_web::HttpResponse;
use db_infra::DbInfraError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::trace_ctx;

/// JSON body of every error response. `status` is omitted for 405.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    pub message: String,
}

/// Every failure a handler can produce. Each variant renders exactly one
/// response shape; internal detail is logged and never sent to the client.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Validation error: {message}")]
    Validation { message: String },
    #[error("Not found")]
    NotFound,
    #[error("{message}: {detail}")]
    Internal {
        message: &'static str,
        detail: String,
    },
    #[error("Database unavailable: {detail}")]
    Unavailable { detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// A 500 whose client-facing message is `message`; `cause` is only logged.
    pub fn internal(message: &'static str, cause: impl Display) -> Self {
        Self::Internal {
            message,
            detail: cause.to_string(),
        }
    }

    pub fn unavailable(cause: impl Display) -> Self {
        Self::Unavailable {
            detail: cause.to_string(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            AppError::MethodNotAllowed => ErrorBody {
                status: None,
                message: "Method Not Allowed".to_string(),
            },
            AppError::Validation { message } => ErrorBody {
                status: Some("error"),
                message: message.clone(),
            },
            AppError::NotFound => ErrorBody {
                status: Some("error"),
                message: "Not Found".to_string(),
            },
            AppError::Internal { message, .. } => ErrorBody {
                status: Some("error"),
                message: (*message).to_string(),
            },
            AppError::Unavailable { .. } => ErrorBody {
                status: Some("DOWN"),
                message: "Database unavailable".to_string(),
            },
            AppError::Config { .. } => ErrorBody {
                status: Some("error"),
                message: "Internal Server Error".to_string(),
            },
        }
    }
}

impl From<DbInfraError> for AppError {
    fn from(e: DbInfraError) -> Self {
        match e {
            DbInfraError::Config { message } => AppError::config(message),
            e if e.is_connectivity() => AppError::unavailable(e),
            e => AppError::internal("Internal Server Error", e),
        }
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(e: sea_orm::DbErr) -> Self {
        AppError::internal("Internal Server Error", format!("db error: {e}"))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status();
        let trace_id = trace_ctx::trace_id();

        if status.is_server_error() {
            error!(trace_id = %trace_id, http.status_code = status.as_u16(), error = %self);
        }

        let mut builder = HttpResponse::build(status);
        builder.insert_header(("x-trace-id", trace_id));
        if matches!(self, AppError::MethodNotAllowed) {
            builder.insert_header((header::ALLOW, "GET"));
        }
        builder.json(self.body())
    }
}
