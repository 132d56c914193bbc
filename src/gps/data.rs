// src/gps/data.rs
//! GPS data structures: decoded sentences, the mutable fix and its read model

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::time::{Duration, Instant};

/// Date and time carried by an RMC sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeDateSentence {
    pub talker: String,
    pub timestamp: DateTime<Utc>,
    /// Status flag of the sentence ('A' = active, 'V' = void).
    pub valid: bool,
}

/// Position fix carried by a GGA sentence, with the coordinates already
/// re-encoded for display.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSentence {
    pub talker: String,
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_native: String,
    pub longitude_native: String,
    pub latitude_dms: String,
    pub longitude_dms: String,
    pub altitude: f64,
    pub satellites: u32,
}

/// Result of decoding one well-formed line.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedSentence {
    TimeDate(TimeDateSentence),
    Location(LocationSentence),
    /// A well-formed sentence of a type that is not folded into the fix.
    Other { talker: String, sentence_id: String },
}

impl DecodedSentence {
    /// Short name of the sentence type, for logging.
    pub fn kind(&self) -> &str {
        match self {
            DecodedSentence::TimeDate(_) => "RMC",
            DecodedSentence::Location(_) => "GGA",
            DecodedSentence::Other { sentence_id, .. } => sentence_id.as_str(),
        }
    }
}

/// The positional field group, always replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_native: String,
    pub longitude_native: String,
    pub latitude_dms: String,
    pub longitude_dms: String,
    pub altitude: f64,
    pub satellites: u32,
}

impl From<LocationSentence> for Position {
    fn from(s: LocationSentence) -> Self {
        Self {
            latitude: s.latitude,
            longitude: s.longitude,
            latitude_native: s.latitude_native,
            longitude_native: s.longitude_native,
            latitude_dms: s.latitude_dms,
            longitude_dms: s.longitude_dms,
            altitude: s.altitude,
            satellites: s.satellites,
        }
    }
}

/// Internal mutable record of the latest known fix. Only the store touches it.
#[derive(Debug, Clone)]
pub(crate) struct Fix {
    pub timestamp: Option<DateTime<Utc>>,
    pub position: Position,
    pub last_updated_at: Instant,
    pub time_updated_at: Instant,
    pub location_updated_at: Instant,
}

impl Fix {
    pub fn new(now: Instant) -> Self {
        Self {
            timestamp: None,
            position: Position::default(),
            last_updated_at: now,
            time_updated_at: now,
            location_updated_at: now,
        }
    }

    /// Build the read model, computing the ages against `now`.
    pub fn view(&self, now: Instant) -> FixView {
        FixView {
            timestamp: self.timestamp,
            longitude: self.position.longitude,
            latitude: self.position.latitude,
            longitude_native: self.position.longitude_native.clone(),
            latitude_native: self.position.latitude_native.clone(),
            longitude_dms: self.position.longitude_dms.clone(),
            latitude_dms: self.position.latitude_dms.clone(),
            altitude: self.position.altitude,
            satellites: self.position.satellites,
            age: now.saturating_duration_since(self.last_updated_at),
            time_age: now.saturating_duration_since(self.time_updated_at),
            location_age: now.saturating_duration_since(self.location_updated_at),
        }
    }
}

/// Immutable snapshot of the fix handed to readers.
///
/// Serializes with the field names of the JSON document served over HTTP.
/// Ages are encoded as integer nanoseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixView {
    #[serde(rename = "Timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "LongitudeGPS")]
    pub longitude_native: String,
    #[serde(rename = "LatitudeGPS")]
    pub latitude_native: String,
    #[serde(rename = "LongitudeDMS")]
    pub longitude_dms: String,
    #[serde(rename = "LatitudeDMS")]
    pub latitude_dms: String,
    #[serde(rename = "Altitude")]
    pub altitude: f64,
    #[serde(rename = "Satellites")]
    pub satellites: u32,
    /// Time since either field group was last updated.
    #[serde(rename = "Age", serialize_with = "serialize_nanos")]
    pub age: Duration,
    #[serde(rename = "TimeAge", serialize_with = "serialize_nanos")]
    pub time_age: Duration,
    #[serde(rename = "LocationAge", serialize_with = "serialize_nanos")]
    pub location_age: Duration,
}

impl FixView {
    /// Check whether a position has been received since start-up
    pub fn has_position(&self) -> bool {
        !self.latitude_native.is_empty()
    }
}

fn serialize_nanos<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    let nanos = u64::try_from(d.as_nanos()).unwrap_or(u64::MAX);
    serializer.serialize_u64(nanos)
}
