//! Core data types for the shelf library API.
//!
//! Records are schema-less JSON objects held in named collections. The
//! three managed resources (authors, books, rates) get typed handles here
//! so the rule layer can talk about them without string matching:
//!
//! - `Resource` names a managed collection and its foreign key, if any
//! - `RecordId` is the integer identity every record carries in `id`
//! - `CollectionSource` is the read capability the rule layer is given

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A stored document. Field order is preserved as written.
pub type Record = serde_json::Map<String, Value>;

/// Field holding a record's identity.
pub const ID_FIELD: &str = "id";
/// Field stamped once when a record is created.
pub const INSERTED_FIELD: &str = "inserted";
/// Field stamped whenever a record is created or updated.
pub const MODIFIED_FIELD: &str = "modified";

// ============================================================================
// Resources
// ============================================================================

/// One of the managed entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Authors,
    Books,
    Rates,
}

impl Resource {
    /// All managed resources, in collection-name order.
    pub const ALL: [Resource; 3] = [Resource::Authors, Resource::Books, Resource::Rates];

    /// Name of the backing collection (also the leading path segment).
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Authors => "authors",
            Self::Books => "books",
            Self::Rates => "rates",
        }
    }

    /// Resolve a path segment to a managed resource.
    ///
    /// Matching is exact: `booksAux` is not `books`.
    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.collection() == segment)
    }

    /// The foreign key this resource carries and the resource it points at.
    #[must_use]
    pub const fn parent(self) -> Option<(&'static str, Resource)> {
        match self {
            Self::Authors => None,
            Self::Books => Some(("author_id", Resource::Authors)),
            Self::Rates => Some(("book_id", Resource::Books)),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// Error returned when a string is not a managed resource name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownResource(pub String);

impl fmt::Display for UnknownResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown resource: {}", self.0)
    }
}

impl std::error::Error for UnknownResource {}

impl FromStr for Resource {
    type Err = UnknownResource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_segment(s).ok_or_else(|| UnknownResource(s.to_string()))
    }
}

// ============================================================================
// Record identity
// ============================================================================

/// Integer identity of a stored record.
///
/// Clients may send ids as JSON numbers or as numeric strings (`"3"`);
/// both coerce to the same `RecordId`. Anything else is not an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl RecordId {
    /// Returns the inner integer.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Coerce a JSON value to an id.
    ///
    /// Accepts integers, floats without a fractional part, and strings
    /// holding either of those. Returns `None` for everything else.
    #[must_use]
    pub fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| integral(n.as_f64()?)).map(Self),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Id of a stored record, if it has a usable one.
    #[must_use]
    pub fn of(record: &Record) -> Option<Self> {
        record.get(ID_FIELD).and_then(Self::coerce)
    }
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RecordId> for Value {
    fn from(id: RecordId) -> Self {
        Value::from(id.0)
    }
}

/// Error returned when a string does not hold an integer id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRecordId(pub String);

impl fmt::Display for InvalidRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not an integer id: {:?}", self.0)
    }
}

impl std::error::Error for InvalidRecordId {}

impl FromStr for RecordId {
    type Err = InvalidRecordId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            return Ok(Self(n));
        }
        trimmed
            .parse::<f64>()
            .ok()
            .and_then(integral)
            .map(Self)
            .ok_or_else(|| InvalidRecordId(s.to_string()))
    }
}

// ============================================================================
// Store capability
// ============================================================================

/// Read access to named collections.
///
/// This is everything the rule layer needs from storage. The concrete
/// store hands out an implementation tied to a read lock; tests can use
/// any in-memory map.
pub trait CollectionSource {
    /// All records in `name`, in stored order. Unknown names are empty.
    fn collection(&self, name: &str) -> &[Record];

    /// Records of a managed resource.
    fn records(&self, resource: Resource) -> &[Record] {
        self.collection(resource.collection())
    }
}

impl<S: CollectionSource + ?Sized> CollectionSource for &S {
    fn collection(&self, name: &str) -> &[Record] {
        (**self).collection(name)
    }
}

impl CollectionSource for std::collections::BTreeMap<String, Vec<Record>> {
    fn collection(&self, name: &str) -> &[Record] {
        self.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}
