//! Patient document store.
//!
//! Documents live in memory behind a single async lock. When the store was opened on a file,
//! the whole collection is written back after every mutation:
//!
//! ```text
//! <PATIENT_DATA_DIR>/
//!   patients.json    # JSON array of patient documents
//!   patients.tmp     # scratch copy, renamed over patients.json once fully written
//! ```
//!
//! Every operation takes the lock for its full duration, so a uniqueness check and the write
//! that depends on it, or a location admission check and the append, cannot interleave with
//! another request. A mutation whose write fails is rolled back in memory before the lock is
//! released.

use crate::constants::TEMP_FILE_SUFFIX;
use crate::error::UniqueField;
use crate::location::AdmissionPolicy;
use crate::record::{LocationEntry, Patient};
use crate::validation::PatientPatch;
use crate::{PatientError, PatientResult};
use regex::{Regex, RegexBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// How a single field of a [`PatientFilter`] is compared.
#[derive(Debug, Clone)]
pub enum FieldMatch {
    Exact(String),
    /// Case-insensitive substring match.
    Contains(Regex),
}

impl FieldMatch {
    pub fn exact(value: impl Into<String>) -> Self {
        Self::Exact(value.into())
    }

    /// Builds a case-insensitive substring matcher. `value` is matched literally.
    pub fn contains(value: &str) -> PatientResult<Self> {
        RegexBuilder::new(&regex::escape(value))
            .case_insensitive(true)
            .build()
            .map(Self::Contains)
            .map_err(|e| PatientError::InvalidInput(format!("unusable search term: {e}")))
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Exact(expected) => value == expected,
            Self::Contains(pattern) => pattern.is_match(value),
        }
    }
}

/// Conjunction of per-field matchers. Absent fields match everything.
#[derive(Debug, Clone, Default)]
pub struct PatientFilter {
    pub name: Option<FieldMatch>,
    pub id: Option<FieldMatch>,
    pub tag_id: Option<FieldMatch>,
}

impl PatientFilter {
    pub fn by_id(id: &str) -> Self {
        Self {
            id: Some(FieldMatch::exact(id)),
            ..Self::default()
        }
    }

    pub fn by_tag_id(tag_id: &str) -> Self {
        Self {
            tag_id: Some(FieldMatch::exact(tag_id)),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.id.is_none() && self.tag_id.is_none()
    }

    pub fn matches(&self, patient: &Patient) -> bool {
        let name = self.name.as_ref().map_or(true, |m| m.matches(&patient.name));
        let id = self.id.as_ref().map_or(true, |m| m.matches(&patient.id));
        // a patient without a tag never satisfies a tag condition
        let tag_id = self.tag_id.as_ref().map_or(true, |m| {
            patient.tag_id.as_deref().is_some_and(|tag| m.matches(tag))
        });

        name && id && tag_id
    }
}

/// Result of [`PatientStore::append_location`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The reading was stored; holds the updated document.
    Appended(Patient),
    /// The admission policy turned the reading away; holds the unchanged document.
    Rejected(Patient),
    NotFound,
}

/// Shared handle to the patient collection. Clones refer to the same documents.
#[derive(Clone, Debug)]
pub struct PatientStore {
    documents: Arc<Mutex<Vec<Patient>>>,
    path: Option<PathBuf>,
}

impl PatientStore {
    /// Creates an empty store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            documents: Arc::new(Mutex::new(Vec::new())),
            path: None,
        }
    }

    /// Opens the store backed by `path`, loading existing documents.
    ///
    /// A missing file is treated as an empty collection and created on the first write.
    ///
    /// # Errors
    ///
    /// Returns `PatientError` if:
    /// - the file exists but cannot be read,
    /// - its contents are not a JSON array of patients,
    /// - two loaded documents share an `id` or a `tagId`.
    pub async fn open(path: impl Into<PathBuf>) -> PatientResult<Self> {
        let path = path.into();

        let documents = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Vec<Patient>>(&bytes)
                .map_err(PatientError::Deserialization)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(PatientError::FileRead(e)),
        };

        for (index, patient) in documents.iter().enumerate() {
            if let Some(field) =
                find_conflict(&documents[..index], &patient.id, patient.tag_id.as_deref())
            {
                return Err(PatientError::CorruptStore(format!(
                    "duplicate {field} on patient {}",
                    patient.id
                )));
            }
        }

        tracing::info!(
            "loaded {} patients from {}",
            documents.len(),
            path.display()
        );

        Ok(Self {
            documents: Arc::new(Mutex::new(documents)),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Holds the collection lock, stalling every other store call until the guard drops.
    #[cfg(test)]
    pub(crate) async fn lock_documents(&self) -> tokio::sync::MutexGuard<'_, Vec<Patient>> {
        self.documents.lock().await
    }

    /// Inserts a new document and returns its `id`.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Duplicate` naming `id` if the id is taken (checked first), or
    /// `tagId` if the tag is taken. Write failures leave the collection unchanged.
    pub async fn insert(&self, patient: Patient) -> PatientResult<String> {
        let mut documents = self.documents.lock().await;

        if let Some(field) = find_conflict(&documents, &patient.id, patient.tag_id.as_deref()) {
            return Err(PatientError::Duplicate(field));
        }

        let id = patient.id.clone();
        documents.push(patient);

        if let Err(e) = self.persist(&documents).await {
            documents.pop();
            return Err(e);
        }

        Ok(id)
    }

    pub async fn find_one(&self, filter: &PatientFilter) -> Option<Patient> {
        let documents = self.documents.lock().await;
        documents.iter().find(|p| filter.matches(p)).cloned()
    }

    /// Returns every matching document in insertion order.
    pub async fn find_many(&self, filter: &PatientFilter) -> Vec<Patient> {
        let documents = self.documents.lock().await;
        documents
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect()
    }

    /// Applies `patch` to the first matching document.
    ///
    /// Returns `Ok(None)` when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Duplicate(UniqueField::TagId)` if another document already holds
    /// the new tag. Neither document is modified in that case.
    pub async fn update_one(
        &self,
        filter: &PatientFilter,
        patch: &PatientPatch,
    ) -> PatientResult<Option<Patient>> {
        let mut documents = self.documents.lock().await;

        let Some(index) = documents.iter().position(|p| filter.matches(p)) else {
            return Ok(None);
        };

        if let Some(tag_id) = &patch.tag_id {
            let taken = documents
                .iter()
                .enumerate()
                .any(|(i, p)| i != index && p.tag_id.as_deref() == Some(tag_id.as_str()));
            if taken {
                return Err(PatientError::Duplicate(UniqueField::TagId));
            }
        }

        let previous = documents[index].clone();
        let patient = &mut documents[index];
        if let Some(name) = &patch.name {
            patient.name = name.as_str().to_owned();
        }
        if let Some(tag_id) = &patch.tag_id {
            patient.tag_id = Some(tag_id.as_str().to_owned());
        }

        if let Err(e) = self.persist(&documents).await {
            documents[index] = previous;
            return Err(e);
        }

        Ok(Some(documents[index].clone()))
    }

    /// Appends `entry` to the first matching document if `policy` admits it.
    ///
    /// The admission check reads the document's last reading under the same lock as the
    /// append, so two concurrent pings for one tag cannot both pass against the same previous
    /// reading.
    pub async fn append_location(
        &self,
        filter: &PatientFilter,
        entry: LocationEntry,
        policy: &AdmissionPolicy,
    ) -> PatientResult<AppendOutcome> {
        let mut documents = self.documents.lock().await;

        let Some(index) = documents.iter().position(|p| filter.matches(p)) else {
            return Ok(AppendOutcome::NotFound);
        };

        if !policy.admits(documents[index].last_location(), &entry) {
            return Ok(AppendOutcome::Rejected(documents[index].clone()));
        }

        documents[index].locations.push(entry);

        if let Err(e) = self.persist(&documents).await {
            documents[index].locations.pop();
            return Err(e);
        }

        Ok(AppendOutcome::Appended(documents[index].clone()))
    }

    async fn persist(&self, documents: &[Patient]) -> PatientResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let bytes = serde_json::to_vec_pretty(documents).map_err(PatientError::Serialization)?;
        let temp_path = path.with_extension(TEMP_FILE_SUFFIX);

        tokio::fs::write(&temp_path, bytes)
            .await
            .map_err(PatientError::FileWrite)?;
        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(PatientError::FileWrite)?;

        Ok(())
    }
}

/// Finds which unique field a candidate would collide on. `id` wins when both collide.
fn find_conflict(documents: &[Patient], id: &str, tag_id: Option<&str>) -> Option<UniqueField> {
    if documents.iter().any(|p| p.id == id) {
        return Some(UniqueField::Id);
    }

    let tag_id = tag_id?;
    if documents.iter().any(|p| p.tag_id.as_deref() == Some(tag_id)) {
        return Some(UniqueField::TagId);
    }

    None
}
