mod common;

use std::cell::Cell;

use actix_web::http::StatusCode;
use actix_web::test;
use futures_util::future::{join, join_all};
use projects_api::test_support::{create_test_app, create_test_state, seed_project, seed_subproject};

#[actix_web::test]
async fn requests_beyond_the_limit_queue_and_all_complete() {
    let state = create_test_state().with_connection_limit(1).build().await.unwrap();
    let pool = state.pool().clone();
    seed_project(&pool, 1, "Platform").await.unwrap();
    seed_subproject(&pool, 10, 1, "Alpha", None).await.unwrap();
    let app = create_test_app(state).await.unwrap();

    let calls = (0..12).map(|n| {
        let uri = if n % 2 == 0 {
            "/api/health"
        } else {
            "/api/subprojects/by-project/1"
        };
        test::call_service(&app, test::TestRequest::get().uri(uri).to_request())
    });

    let done = Cell::new(false);
    let peak_waiting = Cell::new(0);
    let peak_in_use = Cell::new(0);

    let requests = async {
        let responses = join_all(calls).await;
        done.set(true);
        responses
    };
    let sampler = async {
        while !done.get() {
            let status = pool.status();
            peak_waiting.set(peak_waiting.get().max(status.waiting));
            peak_in_use.set(peak_in_use.get().max(status.in_use));
            tokio::task::yield_now().await;
        }
    };
    let (responses, ()) = join(requests, sampler).await;

    assert_eq!(responses.len(), 12);
    assert!(responses.iter().all(|r| r.status() == StatusCode::OK));
    assert!(peak_waiting.get() > 0, "requests should have queued for the single connection");
    assert_eq!(peak_in_use.get(), 1);
    assert_eq!(pool.status().in_use, 0);
    assert_eq!(pool.status().waiting, 0);
}
