//! Generic CRUD over every collection in the database.
//!
//! These handlers are the storage side of the API and apply no business
//! rules of their own; by the time a request gets here the write gate has
//! already accepted (and stamped) it.
//!
//! - GET /db - the whole database
//! - GET /{collection} - all records
//! - GET /{collection}/{id} - one record
//! - POST /{collection} - create, 201
//! - PUT /{collection}/{id} - replace
//! - DELETE /{collection}/{id} - delete, answers `{}`

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde_json::{Value, json};
use shelf_core::{Record, RecordId};
use shelf_rules::Violation;
use shelf_store::Database;

use crate::error::{ApiError, ApiResult};
use crate::extract::JsonRecord;
use crate::state::AppState;

/// GET /db - Dump every collection.
async fn dump_database(State(state): State<AppState>) -> Json<Database> {
    Json(state.store().read().await.clone())
}

/// GET /{collection}
async fn list_records(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> ApiResult<Json<Vec<Record>>> {
    Ok(Json(state.store().list(&collection).await?))
}

/// GET /{collection}/{id}
async fn get_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> ApiResult<Json<Record>> {
    let id = parse_id(&id)?;
    Ok(Json(state.store().get(&collection, id).await?))
}

/// POST /{collection}
async fn create_record(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    JsonRecord(record): JsonRecord,
) -> ApiResult<(StatusCode, Json<Record>)> {
    let stored = state.store().insert(&collection, record).await?;
    tracing::info!(collection = %collection, id = %stored["id"], "Record created");
    Ok((StatusCode::CREATED, Json(stored)))
}

/// PUT /{collection}/{id}
async fn replace_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    JsonRecord(record): JsonRecord,
) -> ApiResult<Json<Record>> {
    let id = parse_id(&id)?;
    let stored = state.store().replace(&collection, id, record).await?;
    tracing::info!(collection = %collection, %id, "Record replaced");
    Ok(Json(stored))
}

/// DELETE /{collection}/{id}
async fn delete_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id)?;
    state.store().remove(&collection, id).await?;
    tracing::info!(collection = %collection, %id, "Record deleted");
    Ok(Json(json!({})))
}

/// Anything the store does not serve.
pub async fn unsupported() -> ApiError {
    ApiError::NotFound(Violation::NotFound.to_string())
}

fn parse_id(raw: &str) -> ApiResult<RecordId> {
    raw.parse()
        .map_err(|_| Violation::MalformedId(raw.to_string()).into())
}

/// Build collection routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/db", get(dump_database).fallback(unsupported))
        .route(
            "/{collection}",
            get(list_records).post(create_record).fallback(unsupported),
        )
        .route(
            "/{collection}/{id}",
            get(get_record)
                .put(replace_record)
                .delete(delete_record)
                .fallback(unsupported),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("4").unwrap(), RecordId(4));
        let err = parse_id("four").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Invalid id - four");
    }

    #[tokio::test]
    async fn test_unsupported_is_not_found() {
        let err = unsupported().await;
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "Resource not found");
    }
}
