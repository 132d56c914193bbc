// src/error.rs
//! Error types for the GPS fix server

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GpsError>;

#[derive(Debug, Error)]
pub enum GpsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serial error: {0}")]
    Serial(#[from] tokio_serial::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Stream failed after {consecutive_errors} consecutive read errors")]
    StreamFailed { consecutive_errors: u32 },
}

/// A single line that could not be decoded.
///
/// Carries the offending raw line so the caller can log it; decoding the
/// next line is unaffected.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to decode '{line}': {kind}")]
pub struct DecodeError {
    pub line: String,
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    pub fn new(line: &str, kind: DecodeErrorKind) -> Self {
        Self {
            line: line.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeErrorKind {
    #[error("empty line")]
    Empty,

    #[error("line contains non-ASCII data")]
    NonAscii,

    #[error("sentence does not start with '$' or '!'")]
    MissingStart,

    #[error("checksum mismatch: expected {expected:02X}, found {found:02X}")]
    BadChecksum { expected: u8, found: u8 },

    #[error("checksum suffix is not two hex digits")]
    MalformedChecksum,

    #[error("sentence header is not a talker id followed by a sentence id")]
    BadHeader,

    #[error("{sentence} has {found} fields, expected {expected}")]
    FieldCount {
        sentence: &'static str,
        expected: &'static str,
        found: usize,
    },

    #[error("field {field} is missing")]
    MissingField { field: &'static str },

    #[error("field {field} has invalid value '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("field {field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}
