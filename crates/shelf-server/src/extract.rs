//! JSON record extraction with `{ "error": ... }` rejections.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request, rejection::BytesRejection},
    http::StatusCode,
};
use serde_json::Value;
use shelf_core::Record;

use crate::error::{ApiError, ApiResult};

/// Request body parsed as a single JSON object.
///
/// An empty body is an empty record, so missing-field rules can report
/// exactly what is missing.
#[derive(Debug, Clone)]
pub struct JsonRecord(pub Record);

impl<S: Send + Sync> FromRequest<S> for JsonRecord {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(body_rejected)?;
        parse_record(&bytes).map(Self)
    }
}

/// A body that could not be buffered: 413 past the size limit, else 400.
pub fn body_rejected(rejection: BytesRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::BadRequest(format!("Failed to read request body: {}", rejection.body_text()))
    }
}

/// Parse a request body into a record.
pub fn parse_record(bytes: &[u8]) -> ApiResult<Record> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Record::new());
    }
    match serde_json::from_slice(bytes) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(_) => Err(ApiError::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
        Err(e) => Err(ApiError::BadRequest(format!("Invalid JSON body: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_object() {
        let record = parse_record(br#"{"title": "Kindred"}"#).unwrap();
        assert_eq!(record["title"], "Kindred");
    }

    #[test]
    fn test_parse_record_empty_body() {
        assert!(parse_record(b"").unwrap().is_empty());
        assert!(parse_record(b"  \n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_record_rejects_non_objects() {
        assert!(matches!(parse_record(b"[1, 2]"), Err(ApiError::BadRequest(_))));
        assert!(matches!(parse_record(b"{\"title\":"), Err(ApiError::BadRequest(_))));
    }
}
