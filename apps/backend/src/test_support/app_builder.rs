//! Test service builder (two-stage test harness, stage 2).
//! Given an AppState, build an initialized Actix **test service**.

use actix_web::body::BoxBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::Error as ActixError;
use actix_web::{web, App};

use crate::error::AppError;
use crate::middleware::{RequestTrace, StructuredLogger};
use crate::state::app_state::AppState;

/// Production routes over `state`, wrapped in the same middleware stack as
/// `main.rs`.
///
/// Return type is `impl Service<...>` so callers don't have to name the opaque service type.
pub async fn create_test_app(
    state: AppState,
) -> Result<
    impl Service<actix_http::Request, Response = ServiceResponse<BoxBody>, Error = ActixError>,
    AppError,
> {
    let app = App::new()
        .wrap(StructuredLogger)
        .wrap(RequestTrace)
        .app_data(web::Data::new(state))
        .configure(crate::routes::configure);

    Ok(actix_web::test::init_service(app).await)
}
