//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::constants::{DEFAULT_PATIENT_DATA_DIR, PATIENT_JSON_FILENAME};
use crate::location::AdmissionPolicy;
use crate::{PatientError, PatientResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    store_path: Option<PathBuf>,
    store_timeout: Duration,
    require_tag_id: bool,
    location_window_ms: i64,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `store_path` of `None` keeps patients in memory only.
    pub fn new(
        store_path: Option<PathBuf>,
        store_timeout: Duration,
        require_tag_id: bool,
        location_window_ms: i64,
    ) -> PatientResult<Self> {
        if store_timeout.is_zero() {
            return Err(PatientError::InvalidInput(
                "store timeout must be greater than zero".into(),
            ));
        }

        if location_window_ms < 0 {
            return Err(PatientError::InvalidInput(
                "location window cannot be negative".into(),
            ));
        }

        Ok(Self {
            store_path,
            store_timeout,
            require_tag_id,
            location_window_ms,
        })
    }

    pub fn store_path(&self) -> Option<&Path> {
        self.store_path.as_deref()
    }

    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    /// Whether `tagId` must be supplied when a patient is created.
    pub fn require_tag_id(&self) -> bool {
        self.require_tag_id
    }

    pub fn admission_policy(&self) -> AdmissionPolicy {
        AdmissionPolicy::new(self.location_window_ms)
    }
}

/// Resolve the store file from an optional `PATIENT_DATA_DIR` value.
///
/// `None` falls back to the default data directory. An empty value selects the in-memory store
/// and yields `Ok(None)`. Any directory given must already exist.
pub fn store_path_from_env_value(value: Option<String>) -> PatientResult<Option<PathBuf>> {
    let dir = match value {
        Some(v) if v.trim().is_empty() => return Ok(None),
        Some(v) => PathBuf::from(v.trim()),
        None => PathBuf::from(DEFAULT_PATIENT_DATA_DIR),
    };

    if !dir.is_dir() {
        return Err(PatientError::InvalidInput(format!(
            "patient data directory does not exist: {}",
            dir.display()
        )));
    }

    Ok(Some(dir.join(PATIENT_JSON_FILENAME)))
}

/// Parse a millisecond count from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns `default`.
pub fn millis_from_env_value(name: &str, value: Option<String>, default: u64) -> PatientResult<u64> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(default),
        Some(v) => v.parse::<u64>().map_err(|_| {
            PatientError::InvalidInput(format!("{name} must be a whole number of milliseconds"))
        }),
    }
}

/// Parse a boolean flag from an optional string value.
///
/// Accepts `true`/`false`, `1`/`0` and `yes`/`no` in any case. Missing or empty values yield
/// `default`.
pub fn flag_from_env_value(name: &str, value: Option<String>, default: bool) -> PatientResult<bool> {
    let value = value
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty());

    match value.as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(_) => Err(PatientError::InvalidInput(format!(
            "{name} must be one of true, false, 1, 0, yes, no"
        ))),
    }
}
