// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Failures of the document storage layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure while preparing a database location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A document could not be encoded, or a stored one did not decode into
    /// the requested shape.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// The backend returned something it should never hold.
    #[error("corrupted data: {0}")]
    CorruptedData(String),

    /// The id is already taken in its collection; carries the full key.
    #[error("key already exists: {0}")]
    AlreadyExists(String),

    /// The backend cannot serve requests right now.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}
