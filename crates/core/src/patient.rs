//! Patient service.
//!
//! This module provides the operations behind every patient endpoint: creating a record,
//! searching, fetching by id, partial updates and recording location pings. Inputs arrive
//! already validated (see [`crate::validation`]); this layer turns them into store calls and
//! store outcomes into `PatientError`s.

use crate::config::CoreConfig;
use crate::record::Patient;
use crate::store::{AppendOutcome, FieldMatch, PatientFilter, PatientStore};
use crate::validation::{LocationPing, NewPatient, PatientPatch, SearchQuery};
use crate::{PatientError, PatientResult};
use std::future::Future;
use std::sync::Arc;

/// Pure patient data operations - no API concerns
#[derive(Clone, Debug)]
pub struct PatientService {
    cfg: Arc<CoreConfig>,
    store: PatientStore,
}

impl PatientService {
    /// Creates a new instance of PatientService over an already opened store.
    pub fn new(cfg: Arc<CoreConfig>, store: PatientStore) -> Self {
        Self { cfg, store }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Runs a store operation with the configured timeout.
    ///
    /// The operation runs on its own task, so a caller that gives up does not abandon a write
    /// halfway through; the store finishes (or rolls back) the mutation on its own.
    async fn run<T, F>(&self, op: F) -> PatientResult<T>
    where
        F: Future<Output = PatientResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let timeout = self.cfg.store_timeout();
        match tokio::time::timeout(timeout, tokio::spawn(op)).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(PatientError::StoreTask(join_error.to_string())),
            Err(_) => {
                tracing::error!("patient store call exceeded {:?}", timeout);
                Err(PatientError::StoreTimeout(timeout))
            }
        }
    }

    /// Creates a patient with an empty location history.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Duplicate` naming the colliding field, or a store failure.
    pub async fn create(&self, new_patient: NewPatient) -> PatientResult<()> {
        let patient = Patient {
            name: new_patient.name.into_inner(),
            id: new_patient.id.into_inner(),
            tag_id: new_patient.tag_id.map(|t| t.into_inner()),
            locations: Vec::new(),
        };

        let store = self.store.clone();
        let id = self.run(async move { store.insert(patient).await }).await?;
        tracing::info!("created patient {}", id);
        Ok(())
    }

    /// Finds every patient matching all supplied query fields.
    ///
    /// Each field is a case-insensitive substring match.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::NoMatches` when nothing matches.
    pub async fn search(&self, query: &SearchQuery) -> PatientResult<Vec<Patient>> {
        let filter = PatientFilter {
            name: query.name.as_deref().map(FieldMatch::contains).transpose()?,
            id: query.id.as_deref().map(FieldMatch::contains).transpose()?,
            tag_id: query.tag_id.as_deref().map(FieldMatch::contains).transpose()?,
        };
        if filter.is_empty() {
            return Err(PatientError::InvalidInput(
                "query must include at least one of \"name\", \"id\", \"tagId\"".into(),
            ));
        }

        let store = self.store.clone();
        let patients = self
            .run(async move { Ok::<_, PatientError>(store.find_many(&filter).await) })
            .await?;

        if patients.is_empty() {
            return Err(PatientError::NoMatches);
        }
        Ok(patients)
    }

    /// Fetches the patient whose `id` is exactly `id`.
    pub async fn get(&self, id: &str) -> PatientResult<Patient> {
        let store = self.store.clone();
        let filter = PatientFilter::by_id(id);
        self.run(async move { Ok::<_, PatientError>(store.find_one(&filter).await) })
            .await?
            .ok_or_else(|| PatientError::PatientNotFound(id.to_owned()))
    }

    /// Applies a partial update to the patient whose `id` is exactly `id`.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::PatientNotFound` for an unknown id and
    /// `PatientError::Duplicate` when the new tag belongs to another patient.
    pub async fn update(&self, id: &str, patch: PatientPatch) -> PatientResult<Patient> {
        let store = self.store.clone();
        let filter = PatientFilter::by_id(id);
        let updated = self
            .run(async move { store.update_one(&filter, &patch).await })
            .await?
            .ok_or_else(|| PatientError::PatientNotFound(id.to_owned()))?;

        tracing::info!("updated patient {}", updated.id);
        Ok(updated)
    }

    /// Records a location reading for the patient wearing `tag_id`.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::TagNotFound` if no patient wears the tag, and
    /// `PatientError::TooSoon` if the reading repeats the last location inside the heartbeat
    /// window.
    pub async fn record_location(&self, tag_id: &str, ping: LocationPing) -> PatientResult<Patient> {
        let store = self.store.clone();
        let filter = PatientFilter::by_tag_id(tag_id);
        let policy = self.cfg.admission_policy();
        let entry = ping.into_entry();

        let outcome = self
            .run(async move { store.append_location(&filter, entry, &policy).await })
            .await?;

        match outcome {
            AppendOutcome::Appended(patient) => {
                tracing::debug!("recorded location for tag {}", tag_id);
                Ok(patient)
            }
            AppendOutcome::Rejected(_) => {
                tracing::debug!("suppressed repeated location for tag {}", tag_id);
                Err(PatientError::TooSoon {
                    tag_id: tag_id.to_owned(),
                })
            }
            AppendOutcome::NotFound => Err(PatientError::TagNotFound(tag_id.to_owned())),
        }
    }
}
