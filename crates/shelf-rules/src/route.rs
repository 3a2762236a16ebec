//! Path matching for the managed resources.
//!
//! Only the exact shapes `/{resource}` and `/{resource}/{id}` match; any
//! other path (`/booksAux`, `/books/1/extra`, `/health`) is unmanaged and
//! left alone by the rule layer.

use shelf_core::{InvalidRecordId, RecordId, Resource};

/// What a request path addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMatch<'a> {
    /// `/{resource}`
    Collection(Resource),
    /// `/{resource}/{id}`, with the raw id segment.
    Member(Resource, &'a str),
    /// Anything else.
    Unmanaged,
}

impl<'a> RouteMatch<'a> {
    /// Classify a request path. A query string, if present, is ignored.
    pub fn parse(path: &'a str) -> Self {
        let path = path.split_once('?').map_or(path, |(p, _)| p);
        let path = path.strip_prefix('/').unwrap_or(path);
        let path = path.strip_suffix('/').unwrap_or(path);

        let mut segments = path.split('/');
        let (Some(first), second, None) = (segments.next(), segments.next(), segments.next())
        else {
            return Self::Unmanaged;
        };
        let Some(resource) = Resource::from_segment(first) else {
            return Self::Unmanaged;
        };

        match second {
            None => Self::Collection(resource),
            Some("") => Self::Unmanaged,
            Some(id) => Self::Member(resource, id),
        }
    }

    /// The addressed resource, if managed.
    pub fn resource(&self) -> Option<Resource> {
        match self {
            Self::Collection(r) | Self::Member(r, _) => Some(*r),
            Self::Unmanaged => None,
        }
    }

    /// The member id, coerced. `None` when the path has no id segment.
    pub fn member_id(&self) -> Option<Result<RecordId, InvalidRecordId>> {
        match self {
            Self::Member(_, raw) => Some(raw.parse()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_paths() {
        assert_eq!(RouteMatch::parse("/books"), RouteMatch::Collection(Resource::Books));
        assert_eq!(RouteMatch::parse("/rates/"), RouteMatch::Collection(Resource::Rates));
        assert_eq!(
            RouteMatch::parse("/authors?name=x"),
            RouteMatch::Collection(Resource::Authors)
        );
    }

    #[test]
    fn test_member_paths() {
        assert_eq!(RouteMatch::parse("/books/12"), RouteMatch::Member(Resource::Books, "12"));
        assert_eq!(RouteMatch::parse("/books/abc"), RouteMatch::Member(Resource::Books, "abc"));
        assert_eq!(
            RouteMatch::parse("/books/12").member_id(),
            Some(Ok(RecordId(12)))
        );
        assert!(matches!(RouteMatch::parse("/books/abc").member_id(), Some(Err(_))));
        assert_eq!(RouteMatch::parse("/books").member_id(), None);
    }

    #[test]
    fn test_prefix_lookalikes_are_unmanaged() {
        assert_eq!(RouteMatch::parse("/booksAux"), RouteMatch::Unmanaged);
        assert_eq!(RouteMatch::parse("/booksAux/1"), RouteMatch::Unmanaged);
        assert_eq!(RouteMatch::parse("/books/1/rates"), RouteMatch::Unmanaged);
        assert_eq!(RouteMatch::parse("/books//"), RouteMatch::Unmanaged);
        assert_eq!(RouteMatch::parse("/"), RouteMatch::Unmanaged);
        assert_eq!(RouteMatch::parse("/db"), RouteMatch::Unmanaged);
        assert_eq!(RouteMatch::parse("/health").resource(), None);
    }
}
