//! Admission policy for location pings.
//!
//! RFID readers report the same location many times a second for a stationary tag. A ping is
//! stored when the patient moved, or when the previous reading is older than the heartbeat
//! window.

use crate::constants::DEFAULT_LOCATION_WINDOW_MS;
use crate::record::LocationEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionPolicy {
    window_ms: i64,
}

impl AdmissionPolicy {
    pub fn new(window_ms: i64) -> Self {
        Self { window_ms }
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    /// Decide whether `next` should be appended after `last`.
    ///
    /// A patient with no readings is compared against `(0, "")`.
    pub fn admits(&self, last: Option<&LocationEntry>, next: &LocationEntry) -> bool {
        let (last_timestamp, last_location) = last
            .map(|entry| (entry.timestamp(), entry.location()))
            .unwrap_or((0, ""));

        next.location() != last_location
            || next.timestamp().saturating_sub(last_timestamp) > self.window_ms
    }
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_LOCATION_WINDOW_MS)
    }
}
