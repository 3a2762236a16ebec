//! Shared-secret Basic credential check guarding deletes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::{HeaderMap, header};
use subtle::ConstantTimeEq;

/// The single credential accepted on guarded requests.
///
/// Requests are authorized when their `Authorization` header is exactly
/// `Basic base64(username:password)`.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    expected: String,
}

impl Credentials {
    /// Credential for a username / password pair.
    pub fn basic(username: &str, password: &str) -> Self {
        let token = STANDARD.encode(format!("{username}:{password}"));
        Self {
            username: username.to_string(),
            expected: format!("Basic {token}"),
        }
    }

    /// The header value a client must send.
    pub fn header_value(&self) -> &str {
        &self.expected
    }

    /// Whether `headers` carry this credential.
    pub fn is_authorized(&self, headers: &HeaderMap) -> bool {
        let Some(presented) = headers.get(header::AUTHORIZATION) else {
            return false;
        };
        presented.as_bytes().ct_eq(self.expected.as_bytes()).into()
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::basic("admin", "admin")
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
