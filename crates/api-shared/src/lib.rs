//! # API Shared
//!
//! Shared definitions for the RFIV APIs.
//!
//! Contains:
//! - JSON request/response types (`wire` module)
//! - Shared services like `HealthService`

pub mod health;
pub mod wire;

pub use health::HealthService;
pub use wire::*;
