use std::future::{ready, Ready};
use std::time::Instant;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::StatusCode;
use actix_web::{web, Error as ActixError, HttpMessage, HttpRequest};
use db_infra::PoolStatus;
use futures_util::future::LocalBoxFuture;
use tracing::{error, info, warn, Level};

use crate::state::app_state::AppState;
use crate::trace_ctx::TraceId;

/// Emits one `request_completed` event per request, at a level chosen by
/// status class, with the pool occupancy at completion. Must wrap outside
/// [`super::RequestTrace`] to see the trace id.
pub struct StructuredLogger;

impl<S, B> Transform<S, ServiceRequest> for StructuredLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type InitError = ();
    type Transform = StructuredLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(StructuredLoggerMiddleware { service }))
    }
}

pub struct StructuredLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for StructuredLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();

        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;

            let record = match &result {
                Ok(res) => Completion::from_request(res.status(), res.request()),
                Err(err) => Completion::bare(err.as_response_error().status_code()),
            };
            record.emit(&method, &path, start.elapsed().as_micros() as u64);

            result
        })
    }
}

/// What is known about a request once its response exists.
#[derive(Debug)]
struct Completion {
    status: StatusCode,
    trace_id: String,
    route: String,
    pool: Option<PoolStatus>,
}

impl Completion {
    fn from_request(status: StatusCode, req: &HttpRequest) -> Self {
        let trace_id = req
            .extensions()
            .get::<TraceId>()
            .map(|id| id.as_str().to_owned())
            .unwrap_or_else(|| "unknown".to_string());
        let pool = req
            .app_data::<web::Data<AppState>>()
            .map(|state| state.pool().status());
        Self {
            status,
            trace_id,
            route: req.match_pattern().unwrap_or_default(),
            pool,
        }
    }

    fn bare(status: StatusCode) -> Self {
        Self {
            status,
            trace_id: "unknown".to_string(),
            route: String::new(),
            pool: None,
        }
    }

    fn level(&self) -> Level {
        if self.status.is_server_error() {
            Level::ERROR
        } else if self.status.is_client_error() {
            Level::WARN
        } else {
            Level::INFO
        }
    }

    fn emit(&self, method: &str, path: &str, duration_us: u64) {
        let status_code = self.status.as_u16();
        let (in_use, waiting) = self.pool.map_or((0, 0), |p| (p.in_use, p.waiting));
        let (trace_id, route) = (&self.trace_id, &self.route);

        let level = self.level();
        if level == Level::ERROR {
            error!(http.method=%method, url.path=%path, http.route=%route, http.status_code=%status_code, duration_us=%duration_us, db.in_use=in_use, db.waiting=waiting, trace_id=%trace_id, message="request_completed");
        } else if level == Level::WARN {
            warn!(http.method=%method, url.path=%path, http.route=%route, http.status_code=%status_code, duration_us=%duration_us, db.in_use=in_use, db.waiting=waiting, trace_id=%trace_id, message="request_completed");
        } else {
            info!(http.method=%method, url.path=%path, http.route=%route, http.status_code=%status_code, duration_us=%duration_us, db.in_use=in_use, db.waiting=waiting, trace_id=%trace_id, message="request_completed");
        }
    }
}
