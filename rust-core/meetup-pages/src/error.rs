// SPDX-License-Identifier: PMPL-1.0-or-later
//! Page generation error types.

use meetup_store::StoreError;
use thiserror::Error;

/// Errors raised while generating a page.
#[derive(Error, Debug)]
pub enum PageError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("render error: {0}")]
    Render(String),
}

impl From<serde_json::Error> for PageError {
    fn from(e: serde_json::Error) -> Self {
        PageError::Render(e.to_string())
    }
}
