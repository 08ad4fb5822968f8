//! Exact fixed-point decimal for field strength readings.
//!
//! The device reports magnitudes as a digit string plus a count of fractional
//! digits, so we keep exactly that: integer `units` and a decimal `scale`.
//! Comparisons are numeric, rendering keeps the decoded precision.

use std::{cmp::Ordering, fmt, str::FromStr};

use thiserror::Error;

/// Largest supported number of fractional digits
pub const MAX_SCALE: u32 = 19;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MagnitudeError {
    #[error("empty magnitude")]
    Empty,
    #[error("invalid character {0:?} in magnitude")]
    InvalidChar(char),
    #[error("more than one decimal point")]
    ExtraPoint,
    #[error("magnitude out of range")]
    Overflow,
}

/// A non-negative decimal value in device units
#[derive(Clone, Copy, Debug, Default)]
pub struct Magnitude {
    units: u64,
    scale: u32,
}

impl Magnitude {
    /// `units / 10^scale`. Returns `None` if the scale is wider than [`MAX_SCALE`].
    pub const fn new(units: u64, scale: u32) -> Option<Self> {
        if scale > MAX_SCALE {
            None
        } else {
            Some(Self { units, scale })
        }
    }

    /// Number of digits after the decimal point
    pub fn scale(&self) -> u32 {
        self.scale
    }

    // units * 10^(MAX_SCALE - scale), fits in u128 for any u64 units
    fn widened(&self) -> u128 {
        self.units as u128 * 10u128.pow(MAX_SCALE - self.scale)
    }
}

impl PartialEq for Magnitude {
    fn eq(&self, other: &Self) -> bool {
        self.widened() == other.widened()
    }
}

impl Eq for Magnitude {}

impl PartialOrd for Magnitude {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Magnitude {
    fn cmp(&self, other: &Self) -> Ordering {
        self.widened().cmp(&other.widened())
    }
}

impl fmt::Display for Magnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.units);
        }
        let scale = self.scale as usize;
        let digits = format!("{:0width$}", self.units, width = scale + 1);
        let (whole, frac) = digits.split_at(digits.len() - scale);
        write!(f, "{whole}.{frac}")
    }
}

impl FromStr for Magnitude {
    type Err = MagnitudeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "." {
            return Err(MagnitudeError::Empty);
        }
        let mut units = 0u64;
        let mut scale = None::<u32>;
        for c in s.chars() {
            match c {
                '.' if scale.is_some() => return Err(MagnitudeError::ExtraPoint),
                '.' => scale = Some(0),
                '0'..='9' => {
                    units = units
                        .checked_mul(10)
                        .and_then(|u| u.checked_add(c as u64 - '0' as u64))
                        .ok_or(MagnitudeError::Overflow)?;
                    if let Some(n) = scale.as_mut() {
                        *n += 1;
                    }
                }
                _ => return Err(MagnitudeError::InvalidChar(c)),
            }
        }
        Self::new(units, scale.unwrap_or(0)).ok_or(MagnitudeError::Overflow)
    }
}
