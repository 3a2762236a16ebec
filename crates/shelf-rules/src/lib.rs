//! shelf-rules: request validation and response enrichment
//!
//! This crate holds all of the decision logic of the library API:
//! - `Lookup`: id lookups within the authors, books and rates collections
//! - `average_rate`: the derived rating of a book
//! - `RuleEngine`: per-route write rules producing a `Decision`
//! - `shape`: attaches `average_rate` to book reads
//!
//! It reads storage only through `shelf_core::CollectionSource`, so the
//! same rules run against the live store or a fixture map.
//!
//! # Usage
//!
//! ```rust,ignore
//! use shelf_rules::{Credentials, Decision, RuleEngine};
//!
//! let engine = RuleEngine::new(Credentials::default(), Arc::new(SystemClock));
//! match engine.validate(&*store.read().await, &method, path, &body, &headers) {
//!     Decision::Allow(_) => { /* forward to storage */ }
//!     Decision::Reject(violation) => { /* respond with violation.status_code() */ }
//! }
//! ```

pub mod aggregate;
pub mod auth;
pub mod lookup;
pub mod route;
pub mod shape;
pub mod validate;

pub use aggregate::{average_rate, parse_rate};
pub use auth::Credentials;
pub use lookup::Lookup;
pub use route::RouteMatch;
pub use shape::{enrich_book, shape, AVERAGE_RATE_FIELD};
pub use validate::{Decision, RuleEngine, Stamp, Violation, RATE_RANGE};
