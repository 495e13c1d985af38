//! # RFIV Core
//!
//! Core business logic for the RFIV patient tracking system.
//!
//! This crate contains pure data operations:
//! - Patient records with unique patient and tag identifiers
//! - Validation and sanitisation of incoming fields
//! - The location admission policy for RFID pings
//! - A document store persisted as JSON under `PATIENT_DATA_DIR`
//!
//! **No API concerns**: HTTP servers, routing and response shapes belong in `api-rest` or
//! `api-shared`.

pub mod config;
pub mod constants;
pub mod error;
pub mod location;
pub mod patient;
pub mod record;
pub mod store;
pub mod validation;

pub use config::CoreConfig;
pub use constants::DEFAULT_PATIENT_DATA_DIR;
pub use error::{PatientError, PatientResult, UniqueField};
pub use location::AdmissionPolicy;
pub use patient::PatientService;
pub use record::{LocationEntry, Patient};
pub use store::{AppendOutcome, FieldMatch, PatientFilter, PatientStore};
pub use validation::{LocationPing, NewPatient, PatientPatch, SearchQuery};
