//! shelf-server: HTTP API server for the shelf library API
//!
//! This crate provides:
//! - REST endpoints for the authors, books and rates collections
//! - The write gate: per-route validation, audit stamps and the delete credential
//! - `average_rate` enrichment of book reads
//!
//! # Architecture
//!
//! The server is built on Axum with a middleware stack for:
//! - Request validation ahead of storage and enrichment of book reads
//! - Request tracing and logging
//! - CORS handling
//! - Request ID generation
//! - JSON error responses
//!
//! # Usage
//!
//! ```rust,ignore
//! use shelf_server::{app, AppState, ServerConfig};
//! use shelf_store::{Store, StoreConfig};
//!
//! let config = ServerConfig::from_env()?;
//! let store = Store::open(StoreConfig::from_env()).await?;
//! let router = app(AppState::new(store, config));
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

// Re-exports for convenience
pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

// Re-export dependent crates
pub use shelf_core;
pub use shelf_rules;
pub use shelf_store;

/// The complete application: routes, gate, request ids, tracing and CORS.
pub fn app(state: AppState) -> Router {
    let cors = middleware::cors_layer(state.config());

    routes::build_router(state).layer(
        ServiceBuilder::new()
            .layer(middleware::request_id::set_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(middleware::request_id::request_span))
            .layer(middleware::request_id::propagate_request_id_layer())
            .layer(cors),
    )
}
