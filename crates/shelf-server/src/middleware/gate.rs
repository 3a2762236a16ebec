//! The write gate and the read enricher.
//!
//! `validate_request` runs the rule engine on every request before it is
//! routed; a rejection is answered immediately, an accepted write is
//! forwarded with its audit stamps applied. `enrich_response` adds
//! `average_rate` to successful book reads on the way out.

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Request, State},
    http::{HeaderValue, Method, header},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use shelf_core::Record;
use shelf_rules::{Decision, RouteMatch, Violation, shape};

use crate::error::{ApiError, ApiResult};
use crate::extract::{body_rejected, parse_record};
use crate::state::AppState;

/// Room the router's body limit leaves above `max_body_bytes` for the
/// audit fields the gate adds before forwarding.
pub const STAMP_HEADROOM: usize = 256;

/// Gate every request through the rule engine.
pub async fn validate_request(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let (mut parts, body) = request.into_parts();
    let path = parts.uri.path().to_owned();

    let carries_record = matches!(parts.method, Method::POST | Method::PUT)
        && RouteMatch::parse(&path).resource().is_some();

    if !carries_record {
        let decision = {
            let db = state.store().read().await;
            state
                .engine()
                .validate(&*db, &parts.method, &path, &Record::new(), &parts.headers)
        };
        if let Decision::Reject(violation) = decision {
            return Err(rejected(&parts.method, &path, violation));
        }
        return Ok(next.run(Request::from_parts(parts, body)).await);
    }

    // The extensions carry the body limit installed by the router.
    let mut buffered = Request::new(body);
    *buffered.extensions_mut() = parts.extensions.clone();
    let bytes = Bytes::from_request(buffered, &state)
        .await
        .map_err(body_rejected)?;
    if bytes.len() > state.config().max_body_bytes {
        return Err(ApiError::PayloadTooLarge);
    }
    let mut record = parse_record(&bytes)?;

    {
        let db = state.store().read().await;
        state
            .engine()
            .admit(&*db, &parts.method, &path, &mut record, &parts.headers)
            .map_err(|violation| rejected(&parts.method, &path, violation))?;
    }

    let bytes = serde_json::to_vec(&record)
        .map_err(|e| ApiError::Internal(format!("Failed to encode request body: {e}")))?;
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts.headers.remove(header::CONTENT_LENGTH);

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

/// Add `average_rate` to successful `GET /books` and `GET /books/{id}` responses.
pub async fn enrich_response(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;
    if !shape::applies(&method, &path) || !response.status().is_success() {
        return Ok(response);
    }

    let (mut parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to read response body: {e}")))?;

    let Ok(payload) = serde_json::from_slice::<Value>(&bytes) else {
        return Ok(Response::from_parts(parts, Body::from(bytes)));
    };

    let shaped = {
        let db = state.store().read().await;
        shape::shape(&*db, &method, &path, payload)
    };
    let bytes = serde_json::to_vec(&shaped)
        .map_err(|e| ApiError::Internal(format!("Failed to encode response body: {e}")))?;
    parts.headers.remove(header::CONTENT_LENGTH);

    Ok(Response::from_parts(parts, Body::from(bytes)))
}

fn rejected(method: &Method, path: &str, violation: Violation) -> ApiError {
    tracing::info!(
        %method,
        path,
        status = violation.status_code().as_u16(),
        kind = violation.kind(),
        error = %violation,
        "Request rejected"
    );
    violation.into()
}
