//! Stored patient documents.

use serde::{Deserialize, Serialize};

/// A single `(timestamp, location)` reading, serialised as a two-element array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationEntry(pub i64, pub String);

impl LocationEntry {
    pub fn new(timestamp: i64, location: impl Into<String>) -> Self {
        Self(timestamp, location.into())
    }

    /// Milliseconds, in whatever epoch the tag readers report.
    pub fn timestamp(&self) -> i64 {
        self.0
    }

    pub fn location(&self) -> &str {
        &self.1
    }
}

/// A patient document as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub tag_id: Option<String>,
    #[serde(default)]
    pub locations: Vec<LocationEntry>,
}

impl Patient {
    pub fn last_location(&self) -> Option<&LocationEntry> {
        self.locations.last()
    }
}
