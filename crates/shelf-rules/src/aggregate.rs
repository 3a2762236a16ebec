//! Derived metrics computed from stored records at read time.

use serde_json::Value;
use shelf_core::{CollectionSource, RecordId};

/// Numeric value of a `rate` field.
///
/// Numbers are taken as-is; strings are parsed as floats after trimming.
/// Non-finite and non-numeric values yield `None`.
pub fn parse_rate(value: &Value) -> Option<f64> {
    let rate = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    rate.is_finite().then_some(rate)
}

/// Mean `rate` over all rates whose `book_id` is `book_id`.
///
/// Zero when the book has no (numeric) rates. Recomputed on every call.
pub fn average_rate<S: CollectionSource + ?Sized>(source: &S, book_id: RecordId) -> f64 {
    let (sum, count) = source
        .records(shelf_core::Resource::Rates)
        .iter()
        .filter(|rate| rate.get("book_id").and_then(RecordId::coerce) == Some(book_id))
        .filter_map(|rate| rate.get("rate").and_then(parse_rate))
        .fold((0.0, 0u32), |(sum, count), rate| (sum + rate, count + 1));

    if count == 0 { 0.0 } else { sum / f64::from(count) }
}
