// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Single-file persistent backend on redb.
//
// All documents share one table. redb calls block, so every operation is
// shipped to the blocking pool together with a handle on the database.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, TableError};
use tracing::debug;

use crate::backend::StorageBackend;
use crate::error::StorageError;

const DOCUMENTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("documents");

fn corrupted<E: Into<redb::Error>>(context: &'static str) -> impl Fn(E) -> StorageError {
    move |e| StorageError::CorruptedData(format!("{context}: {}", e.into()))
}

fn unavailable<E: Into<redb::Error>>(context: &'static str) -> impl Fn(E) -> StorageError {
    move |e| StorageError::BackendUnavailable(format!("{context}: {}", e.into()))
}

/// Documents kept in a redb database file.
pub struct RedbBackend {
    db: Arc<Database>,
}

impl std::fmt::Debug for RedbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBackend").finish_non_exhaustive()
    }
}

impl RedbBackend {
    /// Open the database at `path`, creating it and its parent directories
    /// when missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(path).map_err(|e| {
            StorageError::BackendUnavailable(format!("cannot open {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "redb database opened");

        Ok(Self { db: Arc::new(db) })
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, StorageError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| StorageError::BackendUnavailable(format!("redb worker: {e}")))?
    }
}

#[async_trait]
impl StorageBackend for RedbBackend {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let key = key.to_vec();
        self.blocking(move |db| {
            let txn = db.begin_read().map_err(unavailable("begin read"))?;
            let table = match txn.open_table(DOCUMENTS) {
                Ok(table) => table,
                Err(TableError::TableDoesNotExist(_)) => return Ok(None),
                Err(e) => return Err(corrupted("open table")(e)),
            };
            let value = table
                .get(key.as_slice())
                .map_err(corrupted("get"))?;
            Ok(value.map(|v| v.value().to_vec()))
        })
        .await
    }

    async fn insert_if_absent(&self, key: &[u8], value: &[u8]) -> Result<bool, StorageError> {
        let key = key.to_vec();
        let value = value.to_vec();
        self.blocking(move |db| {
            let txn = db.begin_write().map_err(unavailable("begin write"))?;
            let inserted = {
                let mut table = txn.open_table(DOCUMENTS).map_err(corrupted("open table"))?;
                let taken = table.get(key.as_slice()).map_err(corrupted("get"))?.is_some();
                if !taken {
                    table
                        .insert(key.as_slice(), value.as_slice())
                        .map_err(corrupted("insert"))?;
                }
                !taken
            };
            if inserted {
                txn.commit().map_err(corrupted("commit"))?;
            } else {
                txn.abort().map_err(corrupted("abort"))?;
            }
            Ok(inserted)
        })
        .await
    }

    async fn scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let prefix = prefix.to_vec();
        self.blocking(move |db| {
            let txn = db.begin_read().map_err(unavailable("begin read"))?;
            let table = match txn.open_table(DOCUMENTS) {
                Ok(table) => table,
                Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
                Err(e) => return Err(corrupted("open table")(e)),
            };

            let mut entries = Vec::new();
            for entry in table
                .range(prefix.as_slice()..)
                .map_err(corrupted("range"))?
            {
                let (key, value) = entry.map_err(corrupted("range entry"))?;
                let key = key.value().to_vec();
                if !key.starts_with(&prefix) {
                    break;
                }
                entries.push((key, value.value().to_vec()));
            }
            Ok(entries)
        })
        .await
    }

    fn name(&self) -> &str {
        "redb"
    }
}
