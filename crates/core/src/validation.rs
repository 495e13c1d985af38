//! Input validation utilities.
//!
//! Request handlers hand raw, optional field values to the constructors in this module. Each
//! constructor checks fields in a fixed order and stops at the first failure, so the error
//! message always names exactly one field. Successful results carry sanitised text that is
//! ready to be written to the store.

use crate::record::LocationEntry;
use crate::{PatientError, PatientResult};
use rfiv_types::{strip_tags, SanitisedText};

/// Validates a required string field.
fn required(field: &str, value: Option<&str>) -> PatientResult<SanitisedText> {
    match value {
        None => Err(PatientError::InvalidInput(format!("\"{field}\" is required"))),
        Some(v) => non_empty(field, v),
    }
}

/// Validates a string field that was supplied and must not be blank.
fn non_empty(field: &str, value: &str) -> PatientResult<SanitisedText> {
    SanitisedText::new(value).map_err(|_| {
        PatientError::InvalidInput(format!("\"{field}\" is not allowed to be empty"))
    })
}

/// A validated create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatient {
    pub name: SanitisedText,
    pub id: SanitisedText,
    pub tag_id: Option<SanitisedText>,
}

impl NewPatient {
    /// Validates `name`, `id` and `tagId` in that order.
    ///
    /// When `require_tag_id` is false an absent `tagId` is accepted, but a supplied one must
    /// still be non-empty.
    pub fn parse(
        name: Option<&str>,
        id: Option<&str>,
        tag_id: Option<&str>,
        require_tag_id: bool,
    ) -> PatientResult<Self> {
        let name = required("name", name)?;
        let id = required("id", id)?;
        let tag_id = match (tag_id, require_tag_id) {
            (None, false) => None,
            (tag_id, _) => Some(required("tagId", tag_id)?),
        };

        Ok(Self { name, id, tag_id })
    }
}

/// A validated partial update. At least one field is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientPatch {
    pub name: Option<SanitisedText>,
    pub tag_id: Option<SanitisedText>,
}

impl PatientPatch {
    pub fn parse(name: Option<&str>, tag_id: Option<&str>) -> PatientResult<Self> {
        if name.is_none() && tag_id.is_none() {
            return Err(PatientError::InvalidInput(
                "update must include at least one of \"name\", \"tagId\"".into(),
            ));
        }

        let name = name.map(|v| non_empty("name", v)).transpose()?;
        let tag_id = tag_id.map(|v| non_empty("tagId", v)).transpose()?;

        Ok(Self { name, tag_id })
    }
}

/// A normalised search query.
///
/// Blank fields are dropped rather than matched against the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub name: Option<String>,
    pub id: Option<String>,
    pub tag_id: Option<String>,
}

impl SearchQuery {
    pub fn parse(name: Option<&str>, id: Option<&str>, tag_id: Option<&str>) -> PatientResult<Self> {
        fn normalise(value: Option<&str>) -> Option<String> {
            value
                .map(|v| strip_tags(v).trim().to_string())
                .filter(|v| !v.is_empty())
        }

        let query = Self {
            name: normalise(name),
            id: normalise(id),
            tag_id: normalise(tag_id),
        };

        if query.name.is_none() && query.id.is_none() && query.tag_id.is_none() {
            return Err(PatientError::InvalidInput(
                "query must include at least one of \"name\", \"id\", \"tagId\"".into(),
            ));
        }

        Ok(query)
    }
}

/// A validated location reading for a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationPing {
    pub timestamp: i64,
    pub location: SanitisedText,
}

impl LocationPing {
    pub fn parse(timestamp: Option<i64>, location: Option<&str>) -> PatientResult<Self> {
        let timestamp = timestamp
            .ok_or_else(|| PatientError::InvalidInput("\"timestamp\" is required".into()))?;
        let location = required("location", location)?;

        Ok(Self { timestamp, location })
    }

    pub fn into_entry(self) -> LocationEntry {
        LocationEntry::new(self.timestamp, self.location.into_inner())
    }
}
