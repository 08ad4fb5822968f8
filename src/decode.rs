//! Decoding of the ASCII records the detector streams over serial.
//!
//! A record looks like `0690E-02,2400,...`: a magnitude token made of a fixed
//! width digit group and an exponent, then the 4 digit frequency band.

use thiserror::Error;

use crate::magnitude::Magnitude;

/// Width of the band code the device emits
pub const BAND_WIDTH: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty record")]
    Empty,
    #[error("no magnitude token")]
    MissingMagnitude,
    #[error("invalid magnitude digits {0:?}")]
    InvalidDigits(String),
    #[error("missing or invalid exponent")]
    InvalidExponent,
    #[error("magnitude digits too wide")]
    TooWide,
    #[error("no band token")]
    MissingBand,
}

/// A decoded measurement
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reading {
    pub magnitude: Magnitude,
    pub band: u16,
}

/// Place the decimal point `exp` digits from the right of `digits`.
///
/// This is the device's own convention, not scientific notation: `0690` with
/// exponent 2 is `06.90`. When `exp` is at least the width of `digits`, the
/// whole part is `0` and every digit lands after the point.
pub fn shift_point(digits: &str, exp: u32) -> Result<Magnitude, DecodeError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::InvalidDigits(digits.to_owned()));
    }
    let scale = exp.min(digits.len() as u32);
    // Leading zeros in the whole part don't change the value
    let units: u64 = digits.parse().map_err(|_| DecodeError::TooWide)?;
    Magnitude::new(units, scale).ok_or(DecodeError::TooWide)
}

/// Decode one trimmed record into a [`Reading`]
pub fn decode_record(record: &str) -> Result<Reading, DecodeError> {
    let record = record.trim();
    if record.is_empty() {
        return Err(DecodeError::Empty);
    }
    let (magnitude, end) = decode_magnitude(record)?;
    // The band comes after the magnitude token, never before it
    let band = find_band(&record[end..]).ok_or(DecodeError::MissingBand)?;
    Ok(Reading { magnitude, band })
}

/// Returns the magnitude and the offset of the comma closing its exponent
fn decode_magnitude(record: &str) -> Result<(Magnitude, usize), DecodeError> {
    let marker = record.find("E-").ok_or(DecodeError::MissingMagnitude)?;
    let head = &record[..marker];
    let digits = match head.rfind(',') {
        Some(comma) => &head[comma + 1..],
        None => head,
    };
    let exp_start = marker + 2;
    let (exp, exp_len) =
        parse_exponent(&record[exp_start..]).ok_or(DecodeError::InvalidExponent)?;
    Ok((shift_point(digits, exp)?, exp_start + exp_len))
}

// One or two digits, then a comma. Also hands back the digit count.
fn parse_exponent(rest: &str) -> Option<(u32, usize)> {
    let (exp, _) = rest.split_once(',')?;
    if exp.is_empty() || exp.len() > 2 || !exp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((exp.parse().ok()?, exp.len()))
}

/// First comma immediately followed by [`BAND_WIDTH`] digits
fn find_band(record: &str) -> Option<u16> {
    let bytes = record.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b',')
        .filter_map(|(i, _)| bytes.get(i + 1..i + 1 + BAND_WIDTH))
        .find(|group| group.iter().all(u8::is_ascii_digit))
        .map(|group| {
            group
                .iter()
                .fold(0u16, |acc, d| acc * 10 + (d - b'0') as u16)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mag(s: &str) -> Magnitude {
        s.parse().unwrap()
    }

    #[test]
    fn test_shift_point_examples() {
        assert_eq!(shift_point("0690", 2).unwrap().to_string(), "6.90");
        assert_eq!(shift_point("0621", 3).unwrap().to_string(), "0.621");
        assert_eq!(shift_point("0621", 4).unwrap().to_string(), "0.0621");
    }

    #[test]
    fn test_shift_point_clamps_wide_exponent() {
        // Every digit goes after the point, no further left padding
        assert_eq!(shift_point("0621", 5).unwrap().to_string(), "0.0621");
        assert_eq!(shift_point("0621", 99).unwrap().to_string(), "0.0621");
    }

    #[test]
    fn test_shift_point_zero_exponent() {
        assert_eq!(shift_point("0690", 0).unwrap().to_string(), "690");
    }

    #[test]
    fn test_shift_point_matches_string_split() {
        let digits = "1234";
        let len = digits.len() as u32;
        for exp in 0..8 {
            let expected = if exp < len {
                let split = (len - exp) as usize;
                format!("{}.{}", &digits[..split], &digits[split..])
            } else {
                format!("0.{digits}")
            };
            assert_eq!(shift_point(digits, exp).unwrap(), mag(&expected), "exp {exp}");
        }
    }

    #[test]
    fn test_shift_point_rejects_non_digits() {
        assert_eq!(
            shift_point("06a0", 2),
            Err(DecodeError::InvalidDigits("06a0".to_owned()))
        );
        assert!(shift_point("", 2).is_err());
        assert_eq!(shift_point("123456789012345678901", 2), Err(DecodeError::TooWide));
    }

    #[test]
    fn test_decode_record() {
        let reading = decode_record("0690E-02,2400,1").unwrap();
        assert_eq!(reading.magnitude.to_string(), "6.90");
        assert_eq!(reading.band, 2400);

        let reading = decode_record("  0621E-04,0052\r\n").unwrap();
        assert_eq!(reading.magnitude, mag("0.0621"));
        assert_eq!(reading.band, 52);
    }

    #[test]
    fn test_decode_record_with_prefix_field() {
        let reading = decode_record("RF,352E-03,1800").unwrap();
        assert_eq!(reading.magnitude, mag("0.352"));
        assert_eq!(reading.band, 1800);
    }

    #[test]
    fn test_band_is_searched_after_magnitude() {
        let reading = decode_record("RF,0690E-02,2400").unwrap();
        assert_eq!(reading.magnitude.to_string(), "6.90");
        assert_eq!(reading.band, 2400);

        let reading = decode_record("1234,0690E-02,2400").unwrap();
        assert_eq!(reading.magnitude.to_string(), "6.90");
        assert_eq!(reading.band, 2400);

        // A four digit group ahead of the magnitude is not a band
        assert_eq!(decode_record("1800,0690E-02,24"), Err(DecodeError::MissingBand));
    }

    #[test]
    fn test_band_takes_first_four_digit_group() {
        let reading = decode_record("0690E-02,12,24001,5800").unwrap();
        assert_eq!(reading.band, 2400);
    }

    #[test]
    fn test_malformed_records() {
        assert_eq!(decode_record(""), Err(DecodeError::Empty));
        assert_eq!(decode_record("   "), Err(DecodeError::Empty));
        assert_eq!(decode_record("0690E-02,"), Err(DecodeError::MissingBand));
        assert_eq!(decode_record("0690E-02,24"), Err(DecodeError::MissingBand));
        assert_eq!(decode_record("hello,2400"), Err(DecodeError::MissingMagnitude));
        assert_eq!(
            decode_record("06x0E-02,2400"),
            Err(DecodeError::InvalidDigits("06x0".to_owned()))
        );
        assert_eq!(decode_record("0690E-,2400"), Err(DecodeError::InvalidExponent));
        assert_eq!(decode_record("0690E-123,2400"), Err(DecodeError::InvalidExponent));
        assert_eq!(decode_record("0690E-02"), Err(DecodeError::InvalidExponent));
        assert_eq!(
            decode_record("E-02,2400"),
            Err(DecodeError::InvalidDigits(String::new()))
        );
    }

    #[test]
    fn test_rendered_magnitude_round_trips() {
        for record in ["0690E-02,2400", "0621E-03,2400", "0621E-04,2400", "0001E-1,0900"] {
            let reading = decode_record(record).unwrap();
            let rendered = reading.magnitude.to_string();
            let reparsed: Magnitude = rendered.parse().unwrap();
            assert_eq!(reparsed, reading.magnitude);
            assert_eq!(reparsed.to_string(), rendered);
        }
    }
}
