mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use backend_test_support::error_body::{assert_error_response, read_json};
use db_infra::PoolConfig;
use projects_api::test_support::{create_test_app, create_test_state};
use serde_json::json;

#[actix_web::test]
async fn health_reports_up_with_query_result() {
    let state = create_test_state().build().await.unwrap();
    let app = create_test_app(state).await.unwrap();

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let (status, headers, body) = read_json(test::call_service(&app, req).await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "UP", "results": [{"status": 1}]}));
    assert!(headers.contains_key("x-trace-id"));
}

#[actix_web::test]
async fn health_answers_any_method() {
    let state = create_test_state().build().await.unwrap();
    let app = create_test_app(state).await.unwrap();

    for req in [
        test::TestRequest::post().uri("/api/health").to_request(),
        test::TestRequest::put().uri("/api/health").to_request(),
        test::TestRequest::delete().uri("/api/health").to_request(),
    ] {
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}

#[actix_web::test]
async fn health_does_not_leak_connections() {
    let state = create_test_state().with_connection_limit(1).build().await.unwrap();
    let pool = state.pool().clone();
    let app = create_test_app(state).await.unwrap();

    for _ in 0..5 {
        let req = test::TestRequest::get().uri("/api/health").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }
    assert_eq!(pool.status().in_use, 0);
}

#[actix_web::test]
async fn unreachable_database_reports_down() {
    let config = PoolConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        keep_alive: false,
        ..PoolConfig::default()
    }
    .with_connect_timeout_ms(300);
    let state = create_test_state().with_pool_config(config).build().await.unwrap();
    let app = create_test_app(state).await.unwrap();

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_error_response(
        resp,
        StatusCode::SERVICE_UNAVAILABLE,
        json!({"status": "DOWN", "message": "Database unavailable"}),
    )
    .await;
}
