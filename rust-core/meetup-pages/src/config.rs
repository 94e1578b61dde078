// SPDX-License-Identifier: PMPL-1.0-or-later
//! Regeneration configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What to do with a detail request for an id that was not known at build
/// time.
///
/// There is no `Default`: a deployment has to choose one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    /// Only ids enumerated at build time have pages; everything else is 404.
    Closed,
    /// Generate the page on first request while the requester waits, then
    /// serve it from cache.
    Blocking,
}

impl fmt::Display for FallbackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackMode::Closed => write!(f, "closed"),
            FallbackMode::Blocking => write!(f, "blocking"),
        }
    }
}

impl FromStr for FallbackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "closed" | "false" => Ok(FallbackMode::Closed),
            "blocking" => Ok(FallbackMode::Blocking),
            other => Err(format!("expected 'closed' or 'blocking', got '{}'", other)),
        }
    }
}

/// Configuration for page regeneration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegenerationConfig {
    /// How long a generated listing page stays fresh.
    pub revalidate: Duration,

    /// Policy for detail ids outside the build-time set.
    pub fallback: FallbackMode,
}

impl RegenerationConfig {
    pub fn new(revalidate: Duration, fallback: FallbackMode) -> Self {
        Self { revalidate, fallback }
    }
}
