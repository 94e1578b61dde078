// SPDX-License-Identifier: PMPL-1.0-or-later
//! Generated pages and resolution outcomes.

use serde::Serialize;

use crate::PageError;

/// A fully rendered page together with the props it was rendered from.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub html: String,
    pub props: serde_json::Value,
}

impl RenderedPage {
    /// Capture `props` and the `html` rendered from them.
    pub fn new<P: Serialize>(props: &P, html: String) -> Result<Self, PageError> {
        Ok(Self {
            html,
            props: serde_json::to_value(props)?,
        })
    }
}

/// Outcome of resolving a page: either there is something to show, or the
/// route must answer with the standard not-found page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    Found(T),
    NotFound,
}

impl<T> Resolution<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Resolution::Found(value) => Some(value),
            Resolution::NotFound => None,
        }
    }
}
