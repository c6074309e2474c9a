use crate::shared::application::use_case::panic_message;
use crate::shared::core::correlation_id::{CORRELATION_ID_HEADER, CorrelationId};
use crate::shared::core::errors::AppError;
use crate::shared::inbound::responses::ApiError;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::HeaderValue;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use std::convert::Infallible;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub correlation_id: CorrelationId,
    pub cancel: CancellationToken,
}

impl RequestContext {
    fn from_parts(parts: &Parts) -> Self {
        let header = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|value| value.to_str().ok());
        Self {
            correlation_id: CorrelationId::parse_or_generate(header),
            cancel: CancellationToken::new(),
        }
    }
}

/// Falls back to a fresh context when `track_request` is not installed.
impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| RequestContext::from_parts(parts)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlowRequestThresholds {
    pub warn: Duration,
    pub error: Duration,
}

impl Default for SlowRequestThresholds {
    fn default() -> Self {
        Self {
            warn: Duration::from_millis(1000),
            error: Duration::from_millis(5000),
        }
    }
}

pub async fn track_request(
    State(thresholds): State<SlowRequestThresholds>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let context = RequestContext::from_parts(&parts);
    let correlation_id = context.correlation_id.clone();
    let _cancel_on_drop = context.cancel.clone().drop_guard();
    parts.extensions.insert(context);

    let span = tracing::info_span!(
        "http_request",
        correlation_id = %correlation_id,
        method = %parts.method,
        path = %parts.uri.path(),
    );
    let started = Instant::now();
    let outcome = AssertUnwindSafe(next.run(Request::from_parts(parts, body)))
        .catch_unwind()
        .instrument(span.clone())
        .await;
    let mut response = outcome.unwrap_or_else(|panic| {
        let message = panic_message(panic.as_ref());
        span.in_scope(|| tracing::error!(panic = %message, "handler panicked"));
        ApiError::new(AppError::internal(message), correlation_id.clone(), false).into_response()
    });
    let elapsed = started.elapsed();

    span.in_scope(|| {
        let elapsed_ms = elapsed.as_millis() as u64;
        let status = response.status().as_u16();
        if elapsed >= thresholds.error {
            tracing::error!(elapsed_ms, status, "very slow request");
        } else if elapsed >= thresholds.warn {
            tracing::warn!(elapsed_ms, status, "slow request");
        }
    });

    if let Ok(value) = HeaderValue::from_str(correlation_id.as_str()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}
