//! Per-request trace id.
//!
//! `RequestTrace` generates the id, stores it in the request extensions as
//! [`TraceId`] and runs the rest of the request inside [`scope`], so error
//! rendering and log events deep in a handler can read it back with
//! [`trace_id`] without threading it through every call.

use tokio::task_local;

task_local! {
    static TRACE_ID: TraceId;
}

const UNKNOWN: &str = "unknown";

/// Trace id of one request, as stored in the request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId(pub String);

impl TraceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Trace id of the request running on this task, or `"unknown"` outside one.
pub fn trace_id() -> String {
    TRACE_ID
        .try_with(|id| id.0.clone())
        .unwrap_or_else(|_| UNKNOWN.to_string())
}

/// Run `future` with `id` as the current trace id.
pub async fn scope<F, R>(id: TraceId, future: F) -> R
where
    F: std::future::Future<Output = R>,
{
    TRACE_ID.scope(id, future).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_outside_a_request() {
        assert_eq!(trace_id(), "unknown");
    }

    #[tokio::test]
    async fn scoped_id_is_visible_and_then_gone() {
        let seen = scope(TraceId("trace-abc".to_string()), async { trace_id() }).await;
        assert_eq!(seen, "trace-abc");
        assert_eq!(trace_id(), "unknown");
    }

    #[tokio::test]
    async fn inner_scope_shadows_outer() {
        scope(TraceId("outer".to_string()), async {
            let inner = scope(TraceId("inner".to_string()), async { trace_id() }).await;
            assert_eq!(inner, "inner");
            assert_eq!(trace_id(), "outer");
        })
        .await;
    }
}
