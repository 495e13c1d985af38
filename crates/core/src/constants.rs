//! Constants used throughout the RFIV core crate.
//!
//! This module contains the filename and default-value constants so that configuration,
//! the store and the tests agree on them.

/// Default directory for patient data storage when no explicit directory is configured.
pub const DEFAULT_PATIENT_DATA_DIR: &str = "patient_data";

/// Filename for the persisted patient collection.
pub const PATIENT_JSON_FILENAME: &str = "patients.json";

/// Suffix of the scratch file written before it replaces the patient collection.
pub const TEMP_FILE_SUFFIX: &str = "tmp";

/// Default upper bound for a single store call, in milliseconds.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

/// Default heartbeat window for location pings, in milliseconds.
///
/// A ping repeating the last recorded location is only stored once this much time has passed.
pub const DEFAULT_LOCATION_WINDOW_MS: i64 = 120_000;
