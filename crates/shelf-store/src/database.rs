//! In-memory document database: named collections of JSON records.
//!
//! The serialized shape is a single JSON object mapping each collection
//! name to an array of records:
//!
//! ```json
//! { "authors": [{ "id": 1, "name": "..." }], "books": [], "rates": [] }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shelf_core::{CollectionSource, ID_FIELD, INSERTED_FIELD, Record, RecordId, Resource};

use crate::error::{StoreError, StoreResult};

/// All collections and their records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Database {
    collections: BTreeMap<String, Vec<Record>>,
}

impl Database {
    /// An empty database with the three library collections.
    pub fn library() -> Self {
        let mut db = Self::default();
        for resource in Resource::ALL {
            db.create_collection(resource.collection());
        }
        db
    }

    /// Parse a database from its JSON form.
    ///
    /// The top level must be an object whose values are arrays of objects.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Object(top) = value else {
            return Err(StoreError::InvalidDatabase(
                "top level must be an object".to_string(),
            ));
        };

        let mut collections = BTreeMap::new();
        for (name, items) in top {
            let Value::Array(items) = items else {
                return Err(StoreError::InvalidDatabase(format!(
                    "collection {name} must be an array"
                )));
            };
            let records = items
                .into_iter()
                .map(|item| match item {
                    Value::Object(record) => Ok(record),
                    _ => Err(StoreError::InvalidDatabase(format!(
                        "collection {name} holds a non-object record"
                    ))),
                })
                .collect::<StoreResult<Vec<_>>>()?;
            collections.insert(name, records);
        }
        Ok(Self { collections })
    }

    /// Pretty-printed JSON form.
    pub fn to_json_pretty(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(&self.collections)?)
    }

    /// Add an empty collection if it does not exist yet.
    pub fn create_collection(&mut self, name: &str) {
        self.collections.entry(name.to_string()).or_default();
    }

    /// Whether a collection with this name exists.
    pub fn has_collection(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Collection names in sorted order.
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    // ========================================================================
    // CRUD
    // ========================================================================

    /// All records of a collection.
    pub fn list(&self, collection: &str) -> StoreResult<&[Record]> {
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))
    }

    /// One record by id.
    pub fn get(&self, collection: &str, id: RecordId) -> StoreResult<&Record> {
        self.list(collection)?
            .iter()
            .find(|r| RecordId::of(r) == Some(id))
            .ok_or_else(|| not_found(collection, id))
    }

    /// Next free id: one past the largest integer id in the collection.
    pub fn next_id(&self, collection: &str) -> StoreResult<RecordId> {
        let max = self
            .list(collection)?
            .iter()
            .filter_map(RecordId::of)
            .map(RecordId::get)
            .max()
            .unwrap_or(0);
        max.checked_add(1)
            .map(RecordId)
            .ok_or_else(|| StoreError::IdSpaceExhausted {
                collection: collection.to_string(),
            })
    }

    /// Append a record, assigning its id.
    ///
    /// An integer id supplied by the client is kept when it is free; a
    /// taken one is a `DuplicateId`. Any other `id` value is replaced.
    pub fn insert(&mut self, collection: &str, mut record: Record) -> StoreResult<Record> {
        let requested = record.get(ID_FIELD).and_then(RecordId::coerce);
        let id = match requested {
            Some(id) if self.get(collection, id).is_ok() => {
                return Err(StoreError::DuplicateId {
                    collection: collection.to_string(),
                    id,
                });
            }
            Some(id) => id,
            None => self.next_id(collection)?,
        };

        record.remove(ID_FIELD);
        let stored = with_id(id, record);
        self.collection_mut(collection)?.push(stored.clone());
        Ok(stored)
    }

    /// Replace a record wholesale, keeping its id and creation stamp.
    ///
    /// The id always comes from `id`; any `id` in the body is dropped.
    /// `inserted` is carried over from the stored record and never taken
    /// from the body.
    pub fn replace(&mut self, collection: &str, id: RecordId, mut record: Record) -> StoreResult<Record> {
        let slot = self
            .collection_mut(collection)?
            .iter_mut()
            .find(|r| RecordId::of(r) == Some(id))
            .ok_or_else(|| not_found(collection, id))?;

        record.remove(ID_FIELD);
        record.remove(INSERTED_FIELD);
        if let Some(inserted) = slot.get(INSERTED_FIELD) {
            record.insert(INSERTED_FIELD.to_string(), inserted.clone());
        }

        *slot = with_id(id, record);
        Ok(slot.clone())
    }

    /// Remove a record, returning it.
    pub fn remove(&mut self, collection: &str, id: RecordId) -> StoreResult<Record> {
        let records = self.collection_mut(collection)?;
        let index = records
            .iter()
            .position(|r| RecordId::of(r) == Some(id))
            .ok_or_else(|| not_found(collection, id))?;
        Ok(records.remove(index))
    }

    fn collection_mut(&mut self, collection: &str) -> StoreResult<&mut Vec<Record>> {
        self.collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))
    }
}

impl CollectionSource for Database {
    fn collection(&self, name: &str) -> &[Record] {
        self.collections.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Build a record with `id` as its first field.
fn with_id(id: RecordId, fields: Record) -> Record {
    let mut record = Record::new();
    record.insert(ID_FIELD.to_string(), id.into());
    record.extend(fields);
    record
}

fn not_found(collection: &str, id: RecordId) -> StoreError {
    StoreError::RecordNotFound {
        collection: collection.to_string(),
        id,
    }
}
