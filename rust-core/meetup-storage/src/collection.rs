// SPDX-License-Identifier: PMPL-1.0-or-later
//
// JSON document collections on top of a byte backend.
//
// A document with id `abc` in collection `meetups` lives at key
// `meetups:abc`. Ids never contain `:`, so scanning `meetups:` yields exactly
// that collection.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use crate::backend::StorageBackend;
use crate::error::StorageError;

/// Handle on one named collection of JSON documents.
#[derive(Clone)]
pub struct Collection {
    backend: Arc<dyn StorageBackend>,
    name: String,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("backend", &self.backend.name())
            .finish()
    }
}

fn decode<T: DeserializeOwned>(key: &[u8], bytes: &[u8]) -> Result<T, StorageError> {
    serde_json::from_slice(bytes).map_err(|e| {
        StorageError::SerializationError(format!("{}: {e}", String::from_utf8_lossy(key)))
    })
}

impl Collection {
    pub fn new(backend: Arc<dyn StorageBackend>, name: &str) -> Self {
        Self {
            backend,
            name: name.to_string(),
        }
    }

    fn key(&self, id: &str) -> String {
        format!("{}:{}", self.name, id)
    }

    /// The document stored under `id`, projected onto `T`.
    pub async fn find_one<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>, StorageError> {
        let key = self.key(id);
        match self.backend.get(key.as_bytes()).await? {
            Some(bytes) => decode(key.as_bytes(), &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Store `document` under a fresh `id`.
    ///
    /// Fails with [`StorageError::AlreadyExists`] if the id is taken; the
    /// existing document is kept.
    pub async fn insert_one<T: Serialize>(&self, id: &str, document: &T) -> Result<(), StorageError> {
        let key = self.key(id);
        let bytes =
            serde_json::to_vec(document).map_err(|e| StorageError::SerializationError(e.to_string()))?;

        if !self.backend.insert_if_absent(key.as_bytes(), &bytes).await? {
            return Err(StorageError::AlreadyExists(key));
        }
        trace!(collection = %self.name, id, bytes = bytes.len(), "document inserted");
        Ok(())
    }

    /// Every document in the collection, ordered by id.
    pub async fn find_all<T: DeserializeOwned>(&self) -> Result<Vec<T>, StorageError> {
        let prefix = self.key("");
        self.backend
            .scan(prefix.as_bytes())
            .await?
            .iter()
            .map(|(key, bytes)| decode(key, bytes))
            .collect()
    }
}
