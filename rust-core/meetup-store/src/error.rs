// SPDX-License-Identifier: PMPL-1.0-or-later
//! Record store error types.

use meetup_storage::StorageError;
use thiserror::Error;

/// Errors surfaced by the record store client.
///
/// `InvalidIdentifier` is for strings that can never name a record;
/// `NotFound` is for well-formed ids with no record behind them.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("meetup not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for StoreError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::BackendUnavailable(msg) => StoreError::Connection(msg),
            other => StoreError::Storage(other),
        }
    }
}
