mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use backend_test_support::error_body::{assert_error_response, read_json};
use projects_api::test_support::{create_test_app, create_test_state};
use serde_json::json;

use crate::common::alpha_beta_state;

#[actix_web::test]
async fn lists_subprojects_ordered_by_name() {
    let app = create_test_app(alpha_beta_state().await).await.unwrap();

    let req = test::TestRequest::get()
        .uri("/api/subprojects/by-project/1")
        .to_request();
    let (status, _, body) = read_json(test::call_service(&app, req).await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "success",
            "subprojects": [
                {"id": 11, "name": "Alpha", "project_id": 1, "description": null},
                {"id": 10, "name": "Beta", "project_id": 1, "description": "second by name"}
            ]
        })
    );
}

#[actix_web::test]
async fn equal_names_fall_back_to_id_order() {
    let state = alpha_beta_state().await;
    projects_api::test_support::seed_subproject(state.pool(), 5, 1, "Alpha", None)
        .await
        .unwrap();
    let app = create_test_app(state).await.unwrap();

    let req = test::TestRequest::get()
        .uri("/api/subprojects/by-project/1")
        .to_request();
    let (_, _, body) = read_json(test::call_service(&app, req).await).await;

    let ids: Vec<i64> = body["subprojects"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![5, 11, 10]);
}

#[actix_web::test]
async fn unknown_or_childless_project_yields_empty_list() {
    let app = create_test_app(alpha_beta_state().await).await.unwrap();

    for uri in [
        "/api/subprojects/by-project/2",
        "/api/subprojects/by-project/999",
        "/api/subprojects/by-project/-4",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let (status, _, body) = read_json(test::call_service(&app, req).await).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, json!({"status": "success", "subprojects": []}), "{uri}");
    }
}

#[actix_web::test]
async fn non_integer_ids_are_rejected() {
    let app = create_test_app(alpha_beta_state().await).await.unwrap();

    for uri in [
        "/api/subprojects/by-project/abc",
        "/api/subprojects/by-project/12.5",
        "/api/subprojects/by-project/",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        assert_error_response(
            test::call_service(&app, req).await,
            StatusCode::BAD_REQUEST,
            json!({"status": "error", "message": "Invalid Project ID"}),
        )
        .await;
    }
}

#[actix_web::test]
async fn non_get_methods_are_rejected_before_id_validation() {
    let app = create_test_app(alpha_beta_state().await).await.unwrap();

    for req in [
        test::TestRequest::post().uri("/api/subprojects/by-project/1"),
        test::TestRequest::put().uri("/api/subprojects/by-project/1"),
        test::TestRequest::delete().uri("/api/subprojects/by-project/abc"),
        test::TestRequest::patch().uri("/api/subprojects/by-project/"),
    ] {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(
            resp.headers().get(header::ALLOW).and_then(|v| v.to_str().ok()),
            Some("GET")
        );
        assert_error_response(
            resp,
            StatusCode::METHOD_NOT_ALLOWED,
            json!({"message": "Method Not Allowed"}),
        )
        .await;
    }
}

#[actix_web::test]
async fn data_access_failure_is_a_generic_500() {
    let state = alpha_beta_state().await;
    state.pool().query("DROP TABLE subprojects", &[]).await.unwrap();
    let pool = state.pool().clone();
    let app = create_test_app(state).await.unwrap();

    let req = test::TestRequest::get()
        .uri("/api/subprojects/by-project/1")
        .to_request();
    assert_error_response(
        test::call_service(&app, req).await,
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"status": "error", "message": "Error loading subprojects"}),
    )
    .await;
    assert_eq!(pool.status().in_use, 0);
}

#[actix_web::test]
async fn unknown_routes_are_json_404() {
    let state = create_test_state().build().await.unwrap();
    let app = create_test_app(state).await.unwrap();

    for uri in ["/", "/api/projects", "/api/subprojects/1", "/api/subprojects/by-project/1/extra"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        assert_error_response(
            test::call_service(&app, req).await,
            StatusCode::NOT_FOUND,
            json!({"status": "error", "message": "Not Found"}),
        )
        .await;
    }
}
