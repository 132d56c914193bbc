// src/gps/mod.rs
//! GPS data handling: sentence decoding, coordinate formatting and the fix store

pub mod coords;
pub mod data;
pub mod nmea;
pub mod store;

pub use data::{DecodedSentence, FixView, LocationSentence, TimeDateSentence};
pub use store::FixStore;
