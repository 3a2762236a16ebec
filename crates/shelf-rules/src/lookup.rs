//! Read-only accessors resolving a record by id within a collection.

use shelf_core::{CollectionSource, Record, RecordId, Resource};

/// Id lookups over a collection source.
///
/// Every lookup is a linear scan with an exact match on the coerced `id`
/// field; collections are small.
#[derive(Debug, Clone, Copy)]
pub struct Lookup<S> {
    source: S,
}

impl<S: CollectionSource> Lookup<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Record of `resource` whose id is `id`.
    pub fn find(&self, resource: Resource, id: RecordId) -> Option<&Record> {
        self.source
            .records(resource)
            .iter()
            .find(|record| RecordId::of(record) == Some(id))
    }

    pub fn find_author(&self, id: RecordId) -> Option<&Record> {
        self.find(Resource::Authors, id)
    }

    pub fn find_book(&self, id: RecordId) -> Option<&Record> {
        self.find(Resource::Books, id)
    }

    pub fn find_rate(&self, id: RecordId) -> Option<&Record> {
        self.find(Resource::Rates, id)
    }

    /// Whether `resource` holds a record with this id.
    pub fn exists(&self, resource: Resource, id: RecordId) -> bool {
        self.find(resource, id).is_some()
    }
}
