//! Post-processing of successful reads.
//!
//! `GET /books` and `GET /books/{id}` responses get an `average_rate`
//! field on every book; all other payloads pass through unchanged.

use http::Method;
use serde_json::Value;
use shelf_core::{CollectionSource, Record, RecordId, Resource};

use crate::aggregate::average_rate;
use crate::route::RouteMatch;

/// Derived field attached to books on read. Never stored.
pub const AVERAGE_RATE_FIELD: &str = "average_rate";

/// Whether responses to this request are enriched.
pub fn applies(method: &Method, path: &str) -> bool {
    *method == Method::GET && RouteMatch::parse(path).resource() == Some(Resource::Books)
}

/// Enrich a read payload for `method` + `path`.
pub fn shape<S: CollectionSource>(source: &S, method: &Method, path: &str, payload: Value) -> Value {
    if !applies(method, path) {
        return payload;
    }
    match payload {
        Value::Array(books) => Value::Array(
            books
                .into_iter()
                .map(|book| match book {
                    Value::Object(mut book) => {
                        enrich_book(source, &mut book);
                        Value::Object(book)
                    }
                    other => other,
                })
                .collect(),
        ),
        Value::Object(mut book) => {
            enrich_book(source, &mut book);
            Value::Object(book)
        }
        other => other,
    }
}

/// Attach `average_rate` to one book.
pub fn enrich_book<S: CollectionSource>(source: &S, book: &mut Record) {
    let average = RecordId::of(book).map_or(0.0, |id| average_rate(source, id));
    book.insert(AVERAGE_RATE_FIELD.to_string(), Value::from(average));
}
