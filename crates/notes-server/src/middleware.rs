// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Request correlation and access logging.
//!
//! [`request_context`] wraps the whole router. It binds a [`RequestContext`] for the
//! lifetime of the request, so every record logged downstream (and the access record
//! itself) carries the same `request_id`, and the binding is gone once the response
//! future completes.

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request};
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::{error, info};
use uuid::Uuid;

use notes_core::context::RequestContext;

/// Correlation id header, read on the way in and always set on the way out.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Logger name of access records.
pub const ACCESS_TARGET: &str = "access";

/// Value of the `service` field on access records.
pub const SERVICE_NAME: &str = "notes-api";

/// Attached to a response produced for an unhandled failure; carries the error text
/// for the access log.
#[derive(Debug, Clone)]
pub struct FailureCause(pub String);

/// Generates correlation ids for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestHexId;

impl MakeRequestId for MakeRequestHexId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = HeaderValue::from_str(&new_request_id()).ok()?;
        Some(RequestId::new(id))
    }
}

/// Correlation id for a request: the [`RequestId`] set by `SetRequestIdLayer` (or the
/// raw header) when usable, else a fresh one.
pub fn extract_request_id(request: &Request) -> String {
    request
        .extensions()
        .get::<RequestId>()
        .map(RequestId::header_value)
        .or_else(|| request.headers().get(&REQUEST_ID_HEADER))
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(new_request_id)
}

/// 32 lowercase hex characters.
pub fn new_request_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Middleware: bind the request context, time the request, tag the response with
/// `X-Request-ID` and emit one access record.
pub async fn request_context(request: Request, next: Next) -> Response {
    let request_id = extract_request_id(&request);
    let record = AccessRecord::from_request(&request);

    RequestContext::new(request_id.clone(), record.path.clone())
        .scope(async move {
            let started = Instant::now();
            let mut response = next.run(request).await;
            let duration_ms = elapsed_ms(started);

            // Overrides a blank inbound id that the propagate layer would echo.
            if let Ok(value) = HeaderValue::from_str(&request_id) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }

            match response.extensions().get::<FailureCause>() {
                Some(cause) => record.failed(duration_ms, &cause.0),
                None => record.completed(response.status().as_u16(), duration_ms),
            }

            response
        })
        .await
}

fn elapsed_ms(started: Instant) -> f64 {
    (started.elapsed().as_secs_f64() * 100_000.0).round() / 100.0
}

struct AccessRecord {
    method: Method,
    path: String,
    client_ip: Option<String>,
    user_agent: Option<String>,
}

impl AccessRecord {
    fn from_request(request: &Request) -> Self {
        Self {
            method: request.method().clone(),
            path: request.uri().path().to_owned(),
            client_ip: request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string()),
            user_agent: request
                .headers()
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
        }
    }

    fn completed(&self, status: u16, duration_ms: f64) {
        info!(
            target: ACCESS_TARGET,
            method = %self.method,
            path = %self.path,
            status,
            duration_ms,
            client_ip = self.client_ip.as_deref(),
            user_agent = self.user_agent.as_deref(),
            service = SERVICE_NAME,
            "request"
        );
    }

    fn failed(&self, duration_ms: f64, exception: &str) {
        error!(
            target: ACCESS_TARGET,
            method = %self.method,
            path = %self.path,
            status = 500u16,
            duration_ms,
            client_ip = self.client_ip.as_deref(),
            user_agent = self.user_agent.as_deref(),
            service = SERVICE_NAME,
            exception,
            "request failed"
        );
    }
}
