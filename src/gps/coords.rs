// src/gps/coords.rs
//! Coordinate conversions between decimal degrees and the NMEA sexagesimal
//! notation, plus a degrees/minutes/seconds rendering for display.
//!
//! The formatters take any finite value and format its magnitude. Range
//! checking happens in the decoder, before a value can reach them.

use crate::error::DecodeErrorKind;

/// Ten-thousandths of an arc minute per degree.
const NATIVE_UNITS_PER_DEGREE: f64 = 600_000.0;
/// Hundredths of an arc second per degree.
const DMS_UNITS_PER_DEGREE: f64 = 360_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    /// Largest valid magnitude in degrees.
    pub fn limit(self) -> f64 {
        match self {
            Axis::Latitude => 90.0,
            Axis::Longitude => 180.0,
        }
    }

    fn degree_digits(self) -> usize {
        match self {
            Axis::Latitude => 2,
            Axis::Longitude => 3,
        }
    }

    fn hemisphere(self, value: f64) -> char {
        // -0.0 comes from a zero coordinate sent with S or W.
        match (self, value.is_sign_negative()) {
            (Axis::Latitude, false) => 'N',
            (Axis::Latitude, true) => 'S',
            (Axis::Longitude, false) => 'E',
            (Axis::Longitude, true) => 'W',
        }
    }

    /// Sign for a hemisphere letter, `None` if the letter belongs to the other axis.
    fn sign(self, hemisphere: &str) -> Option<f64> {
        match (self, hemisphere) {
            (Axis::Latitude, "N") | (Axis::Longitude, "E") => Some(1.0),
            (Axis::Latitude, "S") | (Axis::Longitude, "W") => Some(-1.0),
            _ => None,
        }
    }
}

/// Format decimal degrees as `ddmm.mmmm` (latitude) or `dddmm.mmmm`
/// (longitude) followed by the hemisphere letter, e.g. `4807.0380N`.
pub fn to_native(degrees: f64, axis: Axis) -> String {
    let units = (degrees.abs() * NATIVE_UNITS_PER_DEGREE).round() as u64;
    let whole = units / NATIVE_UNITS_PER_DEGREE as u64;
    let minutes = (units % NATIVE_UNITS_PER_DEGREE as u64) as f64 / 10_000.0;

    format!(
        "{:0width$}{:07.4}{}",
        whole,
        minutes,
        axis.hemisphere(degrees),
        width = axis.degree_digits()
    )
}

/// Format decimal degrees as degrees, minutes and seconds with the
/// hemisphere letter, e.g. `48°7'2.28"N`.
pub fn to_dms(degrees: f64, axis: Axis) -> String {
    let units = (degrees.abs() * DMS_UNITS_PER_DEGREE).round() as u64;
    let whole = units / DMS_UNITS_PER_DEGREE as u64;
    let rem = units % DMS_UNITS_PER_DEGREE as u64;
    let minutes = rem / 6_000;
    let centis = rem % 6_000;

    format!(
        "{}°{}'{}.{:02}\"{}",
        whole,
        minutes,
        centis / 100,
        centis % 100,
        axis.hemisphere(degrees)
    )
}

/// Parse an NMEA coordinate field pair (`4807.038`, `N`) into signed
/// decimal degrees.
pub fn parse_sexagesimal(
    value: &str,
    hemisphere: &str,
    axis: Axis,
    field: &'static str,
) -> Result<f64, DecodeErrorKind> {
    if value.is_empty() || hemisphere.is_empty() {
        return Err(DecodeErrorKind::MissingField { field });
    }
    let invalid = || DecodeErrorKind::InvalidField {
        field,
        value: format!("{},{}", value, hemisphere),
    };

    let sign = axis.sign(hemisphere).ok_or_else(invalid)?;

    // Minutes are always the two digits before the decimal point.
    let dot = value.find('.').unwrap_or(value.len());
    if dot < 3 || !value.is_ascii() {
        return Err(invalid());
    }
    let (deg_part, min_part) = value.split_at(dot - 2);
    if !deg_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let whole: u32 = deg_part.parse().map_err(|_| invalid())?;
    let minutes: f64 = min_part.parse().map_err(|_| invalid())?;
    if !(0.0..60.0).contains(&minutes) {
        return Err(invalid());
    }

    let degrees = f64::from(whole) + minutes / 60.0;
    if degrees > axis.limit() {
        return Err(DecodeErrorKind::OutOfRange {
            field,
            value: sign * degrees,
        });
    }
    Ok(sign * degrees)
}

/// Parse the output of [`to_native`] back into signed decimal degrees.
pub fn parse_native(native: &str, axis: Axis) -> Result<f64, DecodeErrorKind> {
    let field = match axis {
        Axis::Latitude => "latitude",
        Axis::Longitude => "longitude",
    };
    if native.len() < 2 || !native.is_ascii() {
        return Err(DecodeErrorKind::InvalidField {
            field,
            value: native.to_string(),
        });
    }
    let (value, hemisphere) = native.split_at(native.len() - 1);
    parse_sexagesimal(value, hemisphere, axis, field)
}
