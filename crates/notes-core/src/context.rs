// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Request-scoped context shared with every log record emitted while serving a request.
//!
//! The binding is task-local: concurrent requests on the same worker thread never see
//! each other's values, and nothing outlives the future passed to
//! [`RequestContext::scope`].

use std::future::Future;

tokio::task_local! {
    static REQUEST_CONTEXT: RequestContext;
}

/// Identity of the request currently being served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Correlation id echoed in `X-Request-ID`.
    pub request_id: String,
    /// Request path the handler is serving.
    pub route: String,
}

impl RequestContext {
    /// Create a context for one request.
    pub fn new(request_id: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            route: route.into(),
        }
    }

    /// Run `future` with this context bound.
    pub async fn scope<F>(self, future: F) -> F::Output
    where
        F: Future,
    {
        REQUEST_CONTEXT.scope(self, future).await
    }

    /// Run a synchronous closure with this context bound.
    pub fn sync_scope<R>(self, f: impl FnOnce() -> R) -> R {
        REQUEST_CONTEXT.sync_scope(self, f)
    }
}

/// Correlation id of the request being served, if any.
pub fn current_request_id() -> Option<String> {
    REQUEST_CONTEXT.try_with(|ctx| ctx.request_id.clone()).ok()
}

/// Route of the request being served, if any.
pub fn current_route() -> Option<String> {
    REQUEST_CONTEXT.try_with(|ctx| ctx.route.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unbound_outside_scope() {
        assert_eq!(current_request_id(), None);
        assert_eq!(current_route(), None);
    }

    #[tokio::test]
    async fn test_bound_inside_scope_and_cleared_after() {
        let seen = RequestContext::new("abc", "/notes")
            .scope(async {
                tokio::task::yield_now().await;
                (current_request_id(), current_route())
            })
            .await;

        assert_eq!(seen, (Some("abc".to_string()), Some("/notes".to_string())));
        assert_eq!(current_request_id(), None);
    }

    #[tokio::test]
    async fn test_interleaved_requests_are_isolated() {
        let (tx_a, rx_a) = tokio::sync::oneshot::channel::<()>();
        let (tx_b, rx_b) = tokio::sync::oneshot::channel::<()>();

        // Both futures run on the same task and hand control back and forth.
        let a = RequestContext::new("req-a", "/notes").scope(async move {
            let before = current_request_id();
            tx_b.send(()).ok();
            rx_a.await.ok();
            (before, current_request_id())
        });
        let b = RequestContext::new("req-b", "/notes/1").scope(async move {
            rx_b.await.ok();
            let seen = current_request_id();
            tx_a.send(()).ok();
            seen
        });

        let ((a_before, a_after), b_seen) = tokio::join!(a, b);
        assert_eq!(a_before.as_deref(), Some("req-a"));
        assert_eq!(a_after.as_deref(), Some("req-a"));
        assert_eq!(b_seen.as_deref(), Some("req-b"));
    }

    #[test]
    fn test_sync_scope() {
        let id = RequestContext::new("sync", "/").sync_scope(current_request_id);
        assert_eq!(id.as_deref(), Some("sync"));
        assert_eq!(current_request_id(), None);
    }
}
