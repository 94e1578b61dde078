// SPDX-License-Identifier: PMPL-1.0-or-later
//! Object identifiers for meetup documents.
//!
//! A [`MeetupId`] is 12 bytes, rendered as 24 lowercase hex characters:
//!
//! | bytes  | content                                   |
//! |--------|-------------------------------------------|
//! | 0..4   | seconds since the Unix epoch, big-endian  |
//! | 4..9   | random value, fixed for the process       |
//! | 9..12  | per-process counter, big-endian           |
//!
//! Ids generated later in the same process compare greater, which keeps the
//! collection's key order equal to insertion order.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::LazyLock;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::StoreError;

const ID_LEN: usize = 12;
const COUNTER_MASK: u32 = 0x00ff_ffff;

static PROCESS_UNIQUE: LazyLock<[u8; 5]> = LazyLock::new(|| {
    let random = uuid::Uuid::new_v4();
    let mut bytes = [0u8; 5];
    bytes.copy_from_slice(&random.as_bytes()[..5]);
    bytes
});

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Unique identifier for a meetup record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MeetupId([u8; ID_LEN]);

impl MeetupId {
    /// Generate a fresh id for a document about to be inserted.
    pub fn generate() -> Self {
        let seconds = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; ID_LEN];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Parse the 24-character hex form.
    ///
    /// Anything that is not exactly 24 hex digits is rejected with
    /// [`StoreError::InvalidIdentifier`].
    pub fn parse(s: &str) -> Result<Self, StoreError> {
        if s.len() != ID_LEN * 2 {
            return Err(StoreError::InvalidIdentifier(format!(
                "'{}' is not a 24 character hex string",
                s
            )));
        }
        let mut bytes = [0u8; ID_LEN];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| StoreError::InvalidIdentifier(format!("'{}': {}", s, e)))?;
        Ok(Self(bytes))
    }

    /// Lowercase hex rendering, as handed to views and used in store keys.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for MeetupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for MeetupId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MeetupId {
    type Error = StoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<MeetupId> for String {
    fn from(id: MeetupId) -> Self {
        id.to_hex()
    }
}
