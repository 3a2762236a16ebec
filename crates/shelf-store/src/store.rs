//! Shared, optionally file-backed handle to the database.
//!
//! The `Store` type provides async CRUD over a `Database` behind a
//! read-write lock. When opened from a file, every successful mutation
//! rewrites that file before the lock is released.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use shelf_core::{Record, RecordId};
use tokio::sync::{RwLock, RwLockReadGuard};

use crate::database::Database;
use crate::error::StoreResult;

/// Configuration for opening the store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the JSON database file.
    pub db_path: PathBuf,
    /// Create the file (with empty library collections) when missing.
    pub create_if_missing: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("api/db.json"),
            create_if_missing: true,
        }
    }
}

impl StoreConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads:
    /// - `DB_PATH` - Optional, defaults to `api/db.json`
    /// - `DB_CREATE_IF_MISSING` - Optional, defaults to true
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let db_path = std::env::var("DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let create_if_missing = std::env::var("DB_CREATE_IF_MISSING")
            .ok()
            .map(|s| s.to_lowercase() != "false" && s != "0")
            .unwrap_or(defaults.create_if_missing);

        Self {
            db_path,
            create_if_missing,
        }
    }
}

/// Document store for the library API.
#[derive(Debug, Clone)]
pub struct Store {
    db: Arc<RwLock<Database>>,
    path: Option<Arc<PathBuf>>,
}

impl Store {
    /// Store that lives only in memory.
    pub fn in_memory(db: Database) -> Self {
        Self {
            db: Arc::new(RwLock::new(db)),
            path: None,
        }
    }

    /// Open the database file named in `config`.
    pub async fn open(config: StoreConfig) -> StoreResult<Self> {
        let path = config.db_path;
        let db = match tokio::fs::read_to_string(&path).await {
            Ok(json) => Database::from_json(&json)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && config.create_if_missing => {
                tracing::info!(path = %path.display(), "Database file missing, creating it");
                let db = Database::library();
                write_file(&path, &db).await?;
                db
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(
            path = %path.display(),
            collections = ?db.collection_names().collect::<Vec<_>>(),
            "Database loaded"
        );

        Ok(Self {
            db: Arc::new(RwLock::new(db)),
            path: Some(Arc::new(path)),
        })
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref().map(PathBuf::as_path)
    }

    /// Read access to the whole database.
    ///
    /// The guard implements `CollectionSource`; hold it only for the
    /// duration of a decision.
    pub async fn read(&self) -> RwLockReadGuard<'_, Database> {
        self.db.read().await
    }

    /// All records of a collection.
    pub async fn list(&self, collection: &str) -> StoreResult<Vec<Record>> {
        Ok(self.db.read().await.list(collection)?.to_vec())
    }

    /// One record by id.
    pub async fn get(&self, collection: &str, id: RecordId) -> StoreResult<Record> {
        self.db.read().await.get(collection, id).cloned()
    }

    /// Create a record and persist.
    pub async fn insert(&self, collection: &str, record: Record) -> StoreResult<Record> {
        let stored = self.mutate(|db| db.insert(collection, record)).await?;
        tracing::debug!(collection, id = %stored["id"], "Record inserted");
        Ok(stored)
    }

    /// Replace a record and persist.
    pub async fn replace(&self, collection: &str, id: RecordId, record: Record) -> StoreResult<Record> {
        let stored = self.mutate(|db| db.replace(collection, id, record)).await?;
        tracing::debug!(collection, %id, "Record replaced");
        Ok(stored)
    }

    /// Delete a record and persist.
    pub async fn remove(&self, collection: &str, id: RecordId) -> StoreResult<Record> {
        let removed = self.mutate(|db| db.remove(collection, id)).await?;
        tracing::debug!(collection, %id, "Record removed");
        Ok(removed)
    }

    /// Apply `change` under the write lock.
    ///
    /// File-backed stores change a copy and only swap it in once the file
    /// holds it, so memory and disk never disagree after a failed write.
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Database) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut db = self.db.write().await;
        let Some(path) = self.path.as_deref() else {
            return change(&mut *db);
        };

        let mut next = db.clone();
        let out = change(&mut next)?;
        write_file(path, &next).await.inspect_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "Failed to persist database");
        })?;
        *db = next;
        Ok(out)
    }
}

/// Write via a sibling temp file so a crash never leaves half a database.
async fn write_file(path: &Path, db: &Database) -> StoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, db.to_json_pretty()?).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
