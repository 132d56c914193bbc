// src/lib.rs
//! GPS Fix Server Library
//!
//! Decodes NMEA sentences from a serial GPS receiver into the latest known
//! fix and serves it to concurrent readers.

pub mod config;
pub mod error;
pub mod gps;
pub mod monitor;
pub mod server;

// Re-export main types for convenience
pub use error::{DecodeError, GpsError, Result};
pub use gps::{FixStore, FixView};
pub use monitor::{IngestStats, StreamIngester};
