// src/gps/store.rs
//! Shared holder of the latest known fix

use super::data::{Fix, FixView, LocationSentence, Position};
use chrono::{DateTime, Utc};
use std::{
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Instant,
};

/// Handle to the single fix of the process.
///
/// Clones share the same fix. Each update replaces one field group (time or
/// position) inside one write lock, so a reader never sees half a group.
/// The two groups are updated independently: a snapshot may pair a new time
/// with an older position and vice versa.
#[derive(Debug, Clone)]
pub struct FixStore {
    fix: Arc<RwLock<Fix>>,
}

impl FixStore {
    /// Create a store with an empty fix, aged from now
    pub fn new() -> Self {
        Self {
            fix: Arc::new(RwLock::new(Fix::new(Instant::now()))),
        }
    }

    /// Replace the timestamp
    pub fn update_time(&self, timestamp: DateTime<Utc>) {
        let mut fix = self.write();
        let now = Instant::now();
        fix.timestamp = Some(timestamp);
        fix.time_updated_at = now;
        fix.last_updated_at = now;
    }

    /// Replace the whole positional group
    #[allow(clippy::too_many_arguments)]
    pub fn update_location(
        &self,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        satellites: u32,
        latitude_native: String,
        longitude_native: String,
        latitude_dms: String,
        longitude_dms: String,
    ) {
        self.set_position(Position {
            latitude,
            longitude,
            latitude_native,
            longitude_native,
            latitude_dms,
            longitude_dms,
            altitude,
            satellites,
        });
    }

    /// Replace the positional group from a decoded GGA sentence
    pub fn apply_location(&self, sentence: LocationSentence) {
        self.set_position(sentence.into());
    }

    fn set_position(&self, position: Position) {
        let mut fix = self.write();
        let now = Instant::now();
        fix.position = position;
        fix.location_updated_at = now;
        fix.last_updated_at = now;
    }

    /// Copy the current fix and compute its age
    pub fn snapshot(&self) -> FixView {
        let fix = self.read();
        fix.view(Instant::now())
    }

    // Writers only ever assign complete values, so a poisoned lock still
    // holds a consistent fix.
    fn read(&self) -> RwLockReadGuard<'_, Fix> {
        self.fix.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Fix> {
        self.fix.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FixStore {
    fn default() -> Self {
        Self::new()
    }
}
