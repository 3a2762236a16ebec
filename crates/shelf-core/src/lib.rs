//! shelf-core: domain types for the shelf library API
//!
//! This crate provides:
//! - `Resource` and `RecordId`, the typed view over schema-less records
//! - `CollectionSource`, the read capability handed to the rule layer
//! - `Clock` and the audit timestamp format

pub mod clock;
pub mod types;

pub use clock::{format_timestamp, Clock, FixedClock, SystemClock, TIMESTAMP_FORMAT};
pub use types::*;
