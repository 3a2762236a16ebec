//! Per-route write rules.
//!
//! Every inbound request is classified by method and leading path segment
//! and checked against the rules for that pair before it reaches storage:
//!
//! | method | resource | checks                                                      |
//! |--------|----------|-------------------------------------------------------------|
//! | PATCH  | any      | always 405                                                  |
//! | POST   | books    | `author_id`, `title` present; `author_id` resolves          |
//! | POST   | authors  | `name` present                                              |
//! | POST   | rates    | `book_id`, `rate` present; `book_id` resolves; rate in 0..=5 |
//! | PUT    | any      | no `id` in body, then the POST checks                       |
//! | DELETE | any      | credential, then the target id resolves                     |
//!
//! Everything else is allowed untouched. Checks run in table order and the
//! first violation decides the response.

use std::sync::Arc;

use http::{HeaderMap, Method, StatusCode};
use serde_json::Value;
use shelf_core::{
    Clock, CollectionSource, ID_FIELD, INSERTED_FIELD, InvalidRecordId, MODIFIED_FIELD, Record,
    RecordId, Resource,
};

use crate::aggregate::parse_rate;
use crate::auth::Credentials;
use crate::lookup::Lookup;
use crate::route::RouteMatch;

/// Inclusive bounds of a valid `rate`.
pub const RATE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=5.0;

/// Why a request was turned away. `Display` is the client-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    /// A required field is absent, null or empty (422).
    #[error("Missing required field - {0}")]
    MissingField(&'static str),

    /// A foreign key does not resolve (403).
    #[error("Invalid {0}")]
    DanglingReference(&'static str),

    /// `rate` is outside 0..=5 or not a number (403).
    #[error("Invalid rate. Value must be between 0 and 5")]
    RateOutOfRange,

    /// An update tried to set `id` (403).
    #[error("Updating the id of the resource is forbidden")]
    ImmutableId,

    /// Missing or wrong credential (401).
    #[error("Unauthorized")]
    Unauthorized,

    /// The addressed record does not exist (404).
    #[error("Resource not found")]
    NotFound,

    /// PATCH (405).
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The path id segment is not an integer (400).
    #[error("Invalid id - {0}")]
    MalformedId(String),
}

impl Violation {
    /// HTTP status code for this violation.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::DanglingReference(_) | Self::RateOutOfRange | Self::ImmutableId => {
                StatusCode::FORBIDDEN
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::MalformedId(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable kind name, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "validation",
            Self::DanglingReference(_) => "referential_integrity",
            Self::RateOutOfRange => "validation",
            Self::ImmutableId => "immutability",
            Self::Unauthorized => "authorization",
            Self::NotFound => "not_found",
            Self::MethodNotAllowed => "unsupported_method",
            Self::MalformedId(_) => "malformed_id",
        }
    }
}

/// Audit fields to stamp on an accepted write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamp {
    /// Leave the body as sent.
    Untouched,
    /// Set `inserted` and `modified`.
    Created,
    /// Set `modified` only.
    Modified,
}

impl Stamp {
    /// Write the stamp into `body`.
    pub fn apply(self, body: &mut Record, timestamp: &str) {
        match self {
            Self::Untouched => {}
            Self::Created => {
                body.insert(INSERTED_FIELD.to_string(), Value::from(timestamp));
                body.insert(MODIFIED_FIELD.to_string(), Value::from(timestamp));
            }
            Self::Modified => {
                body.insert(MODIFIED_FIELD.to_string(), Value::from(timestamp));
            }
        }
    }
}

/// Verdict on a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow(Stamp),
    Reject(Violation),
}

impl From<Result<Stamp, Violation>> for Decision {
    fn from(result: Result<Stamp, Violation>) -> Self {
        match result {
            Ok(stamp) => Self::Allow(stamp),
            Err(violation) => Self::Reject(violation),
        }
    }
}

/// The rule set, with the credential and clock it needs.
///
/// Holds no collection state: every decision reads the source it is
/// handed, as it is at that moment.
#[derive(Clone)]
pub struct RuleEngine {
    credentials: Credentials,
    clock: Arc<dyn Clock>,
}

impl RuleEngine {
    pub fn new(credentials: Credentials, clock: Arc<dyn Clock>) -> Self {
        Self { credentials, clock }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Decide on a request without touching it.
    pub fn validate<S: CollectionSource>(
        &self,
        source: &S,
        method: &Method,
        path: &str,
        body: &Record,
        headers: &HeaderMap,
    ) -> Decision {
        self.check(source, method, path, body, headers).into()
    }

    /// Decide on a request and, if allowed, stamp its body.
    pub fn admit<S: CollectionSource>(
        &self,
        source: &S,
        method: &Method,
        path: &str,
        body: &mut Record,
        headers: &HeaderMap,
    ) -> Result<Stamp, Violation> {
        let stamp = self.check(source, method, path, body, headers)?;
        if stamp != Stamp::Untouched {
            let timestamp = self.clock.timestamp();
            tracing::debug!(%method, path, ?stamp, %timestamp, "Stamping audit fields");
            stamp.apply(body, &timestamp);
        }
        Ok(stamp)
    }

    fn check<S: CollectionSource>(
        &self,
        source: &S,
        method: &Method,
        path: &str,
        body: &Record,
        headers: &HeaderMap,
    ) -> Result<Stamp, Violation> {
        if *method == Method::PATCH {
            return Err(Violation::MethodNotAllowed);
        }

        let route = RouteMatch::parse(path);
        let Some(resource) = route.resource() else {
            return Ok(Stamp::Untouched);
        };
        let lookup = Lookup::new(source);

        match *method {
            Method::POST => check_fields(&lookup, resource, body).map(|()| match resource {
                Resource::Rates => Stamp::Untouched,
                _ => Stamp::Created,
            }),
            Method::PUT => {
                if present(body, ID_FIELD).is_some() {
                    return Err(Violation::ImmutableId);
                }
                member_id(&route)?;
                check_fields(&lookup, resource, body).map(|()| match resource {
                    Resource::Rates => Stamp::Untouched,
                    _ => Stamp::Modified,
                })
            }
            Method::DELETE => {
                if !self.credentials.is_authorized(headers) {
                    return Err(Violation::Unauthorized);
                }
                match member_id(&route)? {
                    Some(id) if lookup.exists(resource, id) => Ok(Stamp::Untouched),
                    _ => Err(Violation::NotFound),
                }
            }
            _ => Ok(Stamp::Untouched),
        }
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

/// Field checks shared by create and update.
fn check_fields<S: CollectionSource>(
    lookup: &Lookup<S>,
    resource: Resource,
    body: &Record,
) -> Result<(), Violation> {
    match resource {
        Resource::Authors => {
            require(body, "name")?;
        }
        Resource::Books => {
            let author_id = require(body, "author_id")?;
            require(body, "title")?;
            resolve(lookup, Resource::Books, author_id)?;
        }
        Resource::Rates => {
            let book_id = require(body, "book_id")?;
            let rate = require(body, "rate")?;
            resolve(lookup, Resource::Rates, book_id)?;
            if !parse_rate(rate).is_some_and(|r| RATE_RANGE.contains(&r)) {
                return Err(Violation::RateOutOfRange);
            }
        }
    }
    Ok(())
}

/// Require that the foreign key of `child` points at an existing parent.
fn resolve<S: CollectionSource>(
    lookup: &Lookup<S>,
    child: Resource,
    key: &Value,
) -> Result<(), Violation> {
    let Some((field, parent)) = child.parent() else {
        return Ok(());
    };
    match RecordId::coerce(key) {
        Some(id) if lookup.exists(parent, id) => Ok(()),
        _ => Err(Violation::DanglingReference(field)),
    }
}

/// A field counts as present unless absent, null or the empty string.
fn present<'a>(body: &'a Record, field: &str) -> Option<&'a Value> {
    body.get(field).filter(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    })
}

fn require<'a>(body: &'a Record, field: &'static str) -> Result<&'a Value, Violation> {
    present(body, field).ok_or(Violation::MissingField(field))
}

fn member_id(route: &RouteMatch<'_>) -> Result<Option<RecordId>, Violation> {
    route
        .member_id()
        .transpose()
        .map_err(|InvalidRecordId(raw)| Violation::MalformedId(raw))
}
