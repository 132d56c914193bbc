// src/gps/nmea.rs
//! NMEA 0183 sentence decoding
//!
//! Only RMC (date and time) and GGA (position, altitude, satellites) are
//! decoded into typed sentences. Every other well-formed sentence is
//! returned as [`DecodedSentence::Other`].

use super::coords::{self, Axis};
use super::data::{DecodedSentence, LocationSentence, TimeDateSentence};
use crate::error::{DecodeError, DecodeErrorKind};
use chrono::{NaiveDate, NaiveTime};

/// Base added to the two-digit RMC year. Years from 2100 on cannot be
/// represented.
pub const YEAR_OFFSET: i32 = 2000;

const RMC_FIELDS: std::ops::RangeInclusive<usize> = 11..=13;
const GGA_FIELDS: usize = 14;

/// Decode a single line read from the receiver.
///
/// Trailing `\r` and `\n` are stripped first. The checksum suffix is
/// optional but verified when present.
pub fn decode(line: &str) -> Result<DecodedSentence, DecodeError> {
    let line = line.trim_end_matches(|c: char| c == '\r' || c == '\n');
    decode_stripped(line).map_err(|kind| DecodeError::new(line, kind))
}

fn decode_stripped(line: &str) -> Result<DecodedSentence, DecodeErrorKind> {
    if line.is_empty() {
        return Err(DecodeErrorKind::Empty);
    }
    if !line.is_ascii() {
        return Err(DecodeErrorKind::NonAscii);
    }

    let body = line
        .strip_prefix('$')
        .or_else(|| line.strip_prefix('!'))
        .ok_or(DecodeErrorKind::MissingStart)?;

    let payload = match body.split_once('*') {
        Some((payload, checksum)) => {
            verify_checksum(payload, checksum)?;
            payload
        }
        None => body,
    };

    let mut fields = payload.split(',');
    let header = fields.next().unwrap_or_default();
    let data: Vec<&str> = fields.collect();
    let (talker, sentence_id) = split_header(header)?;

    match sentence_id {
        "RMC" => decode_rmc(talker, &data).map(DecodedSentence::TimeDate),
        "GGA" => decode_gga(talker, &data).map(DecodedSentence::Location),
        _ => Ok(DecodedSentence::Other {
            talker: talker.to_string(),
            sentence_id: sentence_id.to_string(),
        }),
    }
}

/// XOR of every byte between the start character and `*`.
pub fn checksum(payload: &str) -> u8 {
    payload.bytes().fold(0, |acc, b| acc ^ b)
}

fn verify_checksum(payload: &str, suffix: &str) -> Result<(), DecodeErrorKind> {
    if suffix.len() != 2 || !suffix.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DecodeErrorKind::MalformedChecksum);
    }
    let found = u8::from_str_radix(suffix, 16).map_err(|_| DecodeErrorKind::MalformedChecksum)?;
    let expected = checksum(payload);
    if expected != found {
        return Err(DecodeErrorKind::BadChecksum { expected, found });
    }
    Ok(())
}

/// Split `GPRMC` into (`GP`, `RMC`). Proprietary headers (`PUBX`) use `P`
/// as the talker.
fn split_header(header: &str) -> Result<(&str, &str), DecodeErrorKind> {
    if !header.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()) {
        return Err(DecodeErrorKind::BadHeader);
    }
    if header.starts_with('P') && header.len() > 1 {
        return Ok(header.split_at(1));
    }
    if header.len() != 5 {
        return Err(DecodeErrorKind::BadHeader);
    }
    Ok(header.split_at(2))
}

/// Parse RMC (Recommended Minimum) for its date and time
fn decode_rmc(talker: &str, data: &[&str]) -> Result<TimeDateSentence, DecodeErrorKind> {
    if !RMC_FIELDS.contains(&data.len()) {
        return Err(DecodeErrorKind::FieldCount {
            sentence: "RMC",
            expected: "11 to 13",
            found: data.len(),
        });
    }

    let time = parse_time(data[0])?;
    let date = parse_date(data[8])?;

    Ok(TimeDateSentence {
        talker: talker.to_string(),
        timestamp: date.and_time(time).and_utc(),
        valid: data[1] == "A",
    })
}

/// Parse GGA (Global Positioning System Fix Data)
fn decode_gga(talker: &str, data: &[&str]) -> Result<LocationSentence, DecodeErrorKind> {
    if data.len() != GGA_FIELDS {
        return Err(DecodeErrorKind::FieldCount {
            sentence: "GGA",
            expected: "14",
            found: data.len(),
        });
    }

    let latitude = coords::parse_sexagesimal(data[1], data[2], Axis::Latitude, "latitude")?;
    let longitude = coords::parse_sexagesimal(data[3], data[4], Axis::Longitude, "longitude")?;
    let satellites = required(data[6], "satellites")?
        .parse::<u32>()
        .map_err(|_| invalid("satellites", data[6]))?;
    let altitude = required(data[8], "altitude")?
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite())
        .ok_or_else(|| invalid("altitude", data[8]))?;

    Ok(LocationSentence {
        talker: talker.to_string(),
        latitude,
        longitude,
        latitude_native: coords::to_native(latitude, Axis::Latitude),
        longitude_native: coords::to_native(longitude, Axis::Longitude),
        latitude_dms: coords::to_dms(latitude, Axis::Latitude),
        longitude_dms: coords::to_dms(longitude, Axis::Longitude),
        altitude,
        satellites,
    })
}

/// `hhmmss` with an optional fraction of up to millisecond precision
fn parse_time(field: &str) -> Result<NaiveTime, DecodeErrorKind> {
    let field = required(field, "time")?;
    let (hms, fraction) = field.split_once('.').unwrap_or((field, ""));
    if hms.len() != 6 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("time", field));
    }
    let [hour, minute, second] = two_digit_groups(hms).ok_or_else(|| invalid("time", field))?;

    // Digits past the third are dropped.
    let millis = fraction
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(3)
        .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));

    // Chrono keeps a leap second as second 59 with a millisecond count past 1000.
    let (second, millis) = match second {
        60 => (59, millis + 1_000),
        s => (s, millis),
    };

    NaiveTime::from_hms_milli_opt(hour, minute, second, millis).ok_or_else(|| invalid("time", field))
}

/// `ddmmyy`, the year offset by [`YEAR_OFFSET`]
fn parse_date(field: &str) -> Result<NaiveDate, DecodeErrorKind> {
    let field = required(field, "date")?;
    if field.len() != 6 {
        return Err(invalid("date", field));
    }
    let [day, month, year] = two_digit_groups(field).ok_or_else(|| invalid("date", field))?;

    NaiveDate::from_ymd_opt(YEAR_OFFSET + year as i32, month, day)
        .ok_or_else(|| invalid("date", field))
}

fn two_digit_groups(s: &str) -> Option<[u32; 3]> {
    if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let group = |i: usize| s[i..i + 2].parse::<u32>().ok();
    Some([group(0)?, group(2)?, group(4)?])
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, DecodeErrorKind> {
    if value.is_empty() {
        Err(DecodeErrorKind::MissingField { field })
    } else {
        Ok(value)
    }
}

fn invalid(field: &'static str, value: &str) -> DecodeErrorKind {
    DecodeErrorKind::InvalidField {
        field,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike, Utc};

    const RMC: &str = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";
    const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";

    fn with_checksum(payload: &str) -> String {
        format!("${}*{:02X}", payload, checksum(payload))
    }

    fn kind_of(line: &str) -> DecodeErrorKind {
        decode(line).unwrap_err().kind
    }

    #[test]
    fn test_rmc_decoding() {
        let sentence = match decode(RMC).unwrap() {
            DecodedSentence::TimeDate(s) => s,
            other => panic!("unexpected {:?}", other),
        };

        assert_eq!(sentence.talker, "GP");
        assert!(sentence.valid);
        // Two-digit years are always taken relative to 2000.
        assert_eq!(
            sentence.timestamp,
            Utc.with_ymd_and_hms(2094, 3, 23, 12, 35, 19).unwrap()
        );
    }

    #[test]
    fn test_rmc_with_millis_and_mode() {
        let line = "$GNRMC,092725.250,V,3352.11840,S,15112.54320,E,0.004,77.52,091202,,,A*70\r\n";
        let sentence = match decode(line).unwrap() {
            DecodedSentence::TimeDate(s) => s,
            other => panic!("unexpected {:?}", other),
        };

        assert_eq!(sentence.talker, "GN");
        assert!(!sentence.valid);
        let expected = NaiveDate::from_ymd_opt(2002, 12, 9)
            .unwrap()
            .and_hms_milli_opt(9, 27, 25, 250)
            .unwrap()
            .and_utc();
        assert_eq!(sentence.timestamp, expected);
    }

    #[test]
    fn test_rmc_leap_second() {
        let line = with_checksum("GPRMC,235960,A,4807.038,N,01131.000,E,022.4,084.4,311216,003.1,W");
        let sentence = match decode(&line).unwrap() {
            DecodedSentence::TimeDate(s) => s,
            other => panic!("unexpected {:?}", other),
        };

        assert_eq!(sentence.timestamp.second(), 59);
        assert_eq!(sentence.timestamp.nanosecond(), 1_000_000_000);
        assert_eq!(sentence.timestamp.to_rfc3339(), "2016-12-31T23:59:60+00:00");

        let line = with_checksum("GPRMC,235961,A,4807.038,N,01131.000,E,022.4,084.4,311216,003.1,W");
        assert!(matches!(
            kind_of(&line),
            DecodeErrorKind::InvalidField { field: "time", .. }
        ));
    }

    #[test]
    fn test_gga_decoding() {
        let sentence = match decode(GGA).unwrap() {
            DecodedSentence::Location(s) => s,
            other => panic!("unexpected {:?}", other),
        };

        assert!((sentence.latitude - 48.1173).abs() < 1e-9);
        assert!((sentence.longitude - (11.0 + 31.0 / 60.0)).abs() < 1e-9);
        assert_eq!(sentence.altitude, 545.4);
        assert_eq!(sentence.satellites, 8);
        assert_eq!(sentence.latitude_native, "4807.0380N");
        assert_eq!(sentence.longitude_native, "01131.0000E");
        assert_eq!(sentence.latitude_dms, "48°7'2.28\"N");
        assert_eq!(sentence.longitude_dms, "11°31'0.00\"E");
    }

    #[test]
    fn test_gga_southern_hemisphere() {
        let line = "$GNGGA,092725.00,3352.11840,S,15112.54320,E,1,12,0.79,58.2,M,22.0,M,,*6B";
        let sentence = match decode(line).unwrap() {
            DecodedSentence::Location(s) => s,
            other => panic!("unexpected {:?}", other),
        };

        assert!(sentence.latitude < 0.0);
        assert!((sentence.latitude + (33.0 + 52.1184 / 60.0)).abs() < 1e-9);
        assert_eq!(sentence.latitude_native, "3352.1184S");
        assert_eq!(sentence.satellites, 12);
    }

    #[test]
    fn test_checksum_is_optional() {
        let line = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,";
        assert!(matches!(decode(line), Ok(DecodedSentence::Location(_))));
    }

    #[test]
    fn test_bad_checksum() {
        let line = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*48";
        let err = decode(line).unwrap_err();
        assert_eq!(err.line, line);
        assert_eq!(
            err.kind,
            DecodeErrorKind::BadChecksum {
                expected: 0x47,
                found: 0x48
            }
        );
        assert_eq!(kind_of("$GPGGA,1*4"), DecodeErrorKind::MalformedChecksum);
        assert_eq!(kind_of("$GPGGA,1*ZZ"), DecodeErrorKind::MalformedChecksum);
    }

    #[test]
    fn test_structural_errors() {
        assert_eq!(kind_of("\r\n"), DecodeErrorKind::Empty);
        assert_eq!(kind_of("GPGGA,1,2"), DecodeErrorKind::MissingStart);
        assert_eq!(kind_of("$GPGGA,4807.038°"), DecodeErrorKind::NonAscii);
        assert_eq!(kind_of("$GPGG,1,2"), DecodeErrorKind::BadHeader);
        assert_eq!(kind_of("$gpgga,1,2"), DecodeErrorKind::BadHeader);
    }

    #[test]
    fn test_field_count() {
        let line = with_checksum("GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M");
        assert!(matches!(
            kind_of(&line),
            DecodeErrorKind::FieldCount {
                sentence: "GGA",
                found: 10,
                ..
            }
        ));

        let line = with_checksum("GPRMC,123519,A,4807.038,N");
        assert!(matches!(
            kind_of(&line),
            DecodeErrorKind::FieldCount { sentence: "RMC", .. }
        ));
    }

    #[test]
    fn test_invalid_fields() {
        let line = with_checksum("GPGGA,123519,4807.038,N,01131.000,E,1,x8,0.9,545.4,M,46.9,M,,");
        assert!(matches!(
            kind_of(&line),
            DecodeErrorKind::InvalidField {
                field: "satellites",
                ..
            }
        ));

        let line = with_checksum("GPGGA,123519,,,,,0,00,99.9,,M,,M,,");
        assert_eq!(
            kind_of(&line),
            DecodeErrorKind::MissingField { field: "latitude" }
        );

        let line = with_checksum("GPRMC,253519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W");
        assert!(matches!(
            kind_of(&line),
            DecodeErrorKind::InvalidField { field: "time", .. }
        ));

        let line = with_checksum("GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,310294,003.1,W");
        assert!(matches!(
            kind_of(&line),
            DecodeErrorKind::InvalidField { field: "date", .. }
        ));

        let line = with_checksum("GPRMC,123519,V,,,,,,,,,,N");
        assert_eq!(kind_of(&line), DecodeErrorKind::MissingField { field: "date" });
    }

    #[test]
    fn test_out_of_range_latitude_rejected() {
        let line = with_checksum("GPGGA,123519,9107.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,");
        assert!(matches!(
            kind_of(&line),
            DecodeErrorKind::OutOfRange {
                field: "latitude",
                ..
            }
        ));
    }

    #[test]
    fn test_other_sentences() {
        let gsv = "$GPGSV,3,1,12,01,40,083,46,02,17,308,41,12,07,344,39,14,22,228,45*7F";
        assert_eq!(
            decode(gsv).unwrap(),
            DecodedSentence::Other {
                talker: "GP".to_string(),
                sentence_id: "GSV".to_string(),
            }
        );

        let pubx = with_checksum("PUBX,00,081350.00");
        assert_eq!(
            decode(&pubx).unwrap(),
            DecodedSentence::Other {
                talker: "P".to_string(),
                sentence_id: "UBX".to_string(),
            }
        );
    }
}
