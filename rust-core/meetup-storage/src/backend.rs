// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Byte-level document backend.

use async_trait::async_trait;

use crate::error::StorageError;

/// Ordered byte-keyed storage underneath a [`crate::Collection`].
///
/// Documents are only ever added, never rewritten, so the contract has no
/// overwrite or delete. Implementations are shared across tasks by the
/// connection pool.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Value stored at `key`, `None` when the key was never written.
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Write `value` at `key` unless the key is taken.
    ///
    /// Returns `false` and leaves the stored value alone when `key` already
    /// exists. Lookup and write are one atomic step.
    async fn insert_if_absent(&self, key: &[u8], value: &[u8]) -> Result<bool, StorageError>;

    /// Every entry whose key starts with `prefix`, ascending by key.
    async fn scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError>;

    /// Short label used in log fields.
    fn name(&self) -> &str;
}
