// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Process-memory backend, used by `memory://` connection strings and tests.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::backend::StorageBackend;
use crate::error::StorageError;

type Documents = BTreeMap<Vec<u8>, Vec<u8>>;

/// Backend keeping every document in a sorted map. Contents are lost when
/// the last clone is dropped.
///
/// Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    documents: Arc<RwLock<Documents>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn insert_if_absent(&self, key: &[u8], value: &[u8]) -> Result<bool, StorageError> {
        match self.documents.write().await.entry(key.to_vec()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(value.to_vec());
                Ok(true)
            }
        }
    }

    async fn scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let documents = self.documents.read().await;
        Ok(documents
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
