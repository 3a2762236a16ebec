//! Liveness plus a record count per collection.

use std::collections::BTreeMap;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use shelf_core::CollectionSource;

use crate::state::AppState;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    /// Records held per collection, as the gate currently sees them.
    pub collections: BTreeMap<String, usize>,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    let db = state.store().read().await;
    let collections = db
        .collection_names()
        .map(|name| (name.to_string(), db.collection(name).len()))
        .collect();

    Json(Health {
        status: "ok",
        collections,
    })
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use shelf_store::{Database, Store};

    #[tokio::test]
    async fn test_health_counts_records() {
        let db = Database::from_json(r#"{"authors": [{"id": 1}], "books": [], "rates": []}"#).unwrap();
        let state = AppState::new(Store::in_memory(db), ServerConfig::default());

        let Json(body) = health(State(state)).await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.collections["authors"], 1);
        assert_eq!(body.collections["books"], 0);
        assert_eq!(body.collections.len(), 3);
    }
}
