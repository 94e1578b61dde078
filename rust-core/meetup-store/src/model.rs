// SPDX-License-Identifier: PMPL-1.0-or-later
//! Meetup documents and their projections.

use serde::{Deserialize, Serialize};

use crate::{MeetupId, StoreError};

/// A meetup document as stored in the collection.
///
/// The id is optional on the read side: a faulty store may hand back a
/// document without one, and readers have to cope with that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetupDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MeetupId>,
    pub title: String,
    pub image: String,
    pub address: String,
    pub description: String,
}

/// Listing projection of a meetup document (no description).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetupSummary {
    #[serde(rename = "_id", default)]
    pub id: Option<MeetupId>,
    pub title: String,
    pub image: String,
    pub address: String,
}

/// Id-only projection, used to enumerate the collection.
#[derive(Debug, Deserialize)]
pub(crate) struct IdProjection {
    #[serde(rename = "_id", default)]
    pub id: Option<MeetupId>,
}

/// Payload for creating a meetup.
///
/// Missing fields deserialize as empty strings so that [`NewMeetup::validate`]
/// can report them by name instead of failing inside the JSON decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewMeetup {
    pub title: String,
    pub image: String,
    pub address: String,
    pub description: String,
}

impl NewMeetup {
    pub fn new(
        title: impl Into<String>,
        image: impl Into<String>,
        address: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            image: image.into(),
            address: address.into(),
            description: description.into(),
        }
    }

    /// Check that every field is present and not blank.
    pub fn validate(&self) -> Result<(), StoreError> {
        let fields = [
            ("title", &self.title),
            ("image", &self.image),
            ("address", &self.address),
            ("description", &self.description),
        ];
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Validation(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )))
        }
    }

    /// Turn the payload into a document under a freshly assigned id.
    pub(crate) fn into_document(self, id: MeetupId) -> MeetupDocument {
        MeetupDocument {
            id: Some(id),
            title: self.title,
            image: self.image,
            address: self.address,
            description: self.description,
        }
    }
}
