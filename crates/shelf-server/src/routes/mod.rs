//! Route definitions for the HTTP API.

pub mod health;
pub mod resources;

use axum::{Router, extract::DefaultBodyLimit, middleware};

use crate::middleware::gate::{STAMP_HEADROOM, enrich_response, validate_request};
use crate::state::AppState;

/// Build the router: health, collection CRUD, and the gate in front of them.
///
/// Requests pass `validate_request` first, then the handlers; responses
/// pass `enrich_response` on the way out. The gate refuses record bodies
/// over `max_body_bytes` with 413; the router limit sits a little higher so
/// a stamped body still reaches its handler.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(resources::routes())
        .fallback(resources::unsupported)
        .layer(middleware::from_fn_with_state(state.clone(), enrich_response))
        .layer(middleware::from_fn_with_state(state.clone(), validate_request))
        .layer(DefaultBodyLimit::max(
            state.config().max_body_bytes.saturating_add(STAMP_HEADROOM),
        ))
        .with_state(state)
}
