//! Middleware: the write gate, book enrichment, request ids and CORS.

pub mod gate;
pub mod request_id;

use tower_http::cors::{Any, CorsLayer};

use crate::config::ServerConfig;

/// Build CORS layer from configuration.
///
/// Origins were validated when the configuration was loaded; an origin
/// list that fails to parse here falls back to allowing none.
pub fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match config.cors_origins() {
        Ok(None) => layer.allow_origin(Any),
        Ok(Some(origins)) => layer.allow_origin(origins),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring CORS origins");
            layer
        }
    }
}
