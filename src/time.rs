// ⏱️ Time Codec - hundredths of a second
// Converts "ss.cc" / "mm:ss.cc" timing marks to integer hundredths and back

use crate::error::{RaceError, RaceResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

const HS_PER_SECOND: u64 = 100;
const HS_PER_MINUTE: u64 = 60 * HS_PER_SECOND;

// ============================================================================
// RACE TIME
// ============================================================================

/// An elapsed time in hundredths of a second (HS).
///
/// All comparisons and sums are done on the integer value; the text form only
/// exists at the edges (parsing input marks, rendering reports).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RaceTime(u64);

impl RaceTime {
    pub const ZERO: RaceTime = RaceTime(0);

    pub fn from_hundredths(hs: u64) -> Self {
        RaceTime(hs)
    }

    pub fn hundredths(self) -> u64 {
        self.0
    }

    pub fn checked_add(self, rhs: RaceTime) -> Option<RaceTime> {
        self.0.checked_add(rhs.0).map(RaceTime)
    }
}

impl fmt::Display for RaceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.0 / HS_PER_MINUTE;
        let seconds = (self.0 / HS_PER_SECOND) % 60;
        let hundredths = self.0 % HS_PER_SECOND;
        if minutes == 0 {
            write!(f, "{:02}.{:02}", seconds, hundredths)
        } else {
            write!(f, "{}:{:02}.{:02}", minutes, seconds, hundredths)
        }
    }
}

impl FromStr for RaceTime {
    type Err = RaceError;

    fn from_str(s: &str) -> RaceResult<Self> {
        parse_time(s)
    }
}

impl From<RaceTime> for String {
    fn from(time: RaceTime) -> String {
        time.to_string()
    }
}

impl TryFrom<String> for RaceTime {
    type Error = RaceError;

    fn try_from(value: String) -> RaceResult<Self> {
        parse_time(&value)
    }
}

/// Saturates at `u64::MAX` hundredths; use `checked_add` to detect it.
impl Add for RaceTime {
    type Output = RaceTime;

    fn add(self, rhs: RaceTime) -> RaceTime {
        RaceTime(self.0.saturating_add(rhs.0))
    }
}

impl Sum for RaceTime {
    fn sum<I: Iterator<Item = RaceTime>>(iter: I) -> RaceTime {
        iter.fold(RaceTime::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a RaceTime> for RaceTime {
    fn sum<I: Iterator<Item = &'a RaceTime>>(iter: I) -> RaceTime {
        iter.copied().sum()
    }
}

// ============================================================================
// CODEC
// ============================================================================

/// Parse `"ss.cc"` or `"mm:ss.cc"` into hundredths.
///
/// At most one minute separator, exactly one fractional separator, digits
/// only, and exactly two fractional digits.
pub fn parse_time(text: &str) -> RaceResult<RaceTime> {
    let trimmed = text.trim();
    let format_error = || RaceError::Format(text.to_string());

    let (minutes, rest) = match trimmed.split_once(':') {
        Some((m, rest)) => {
            if rest.contains(':') {
                return Err(format_error());
            }
            (parse_digits(m).ok_or_else(format_error)?, rest)
        }
        None => (0, trimmed),
    };

    let (seconds, hundredths) = rest.split_once('.').ok_or_else(format_error)?;
    if hundredths.contains('.') || hundredths.len() != 2 {
        return Err(format_error());
    }
    let seconds = parse_digits(seconds).ok_or_else(format_error)?;
    let hundredths = parse_digits(hundredths).ok_or_else(format_error)?;

    minutes
        .checked_mul(HS_PER_MINUTE)
        .zip(seconds.checked_mul(HS_PER_SECOND))
        .and_then(|(m, s)| m.checked_add(s))
        .and_then(|hs| hs.checked_add(hundredths))
        .map(RaceTime)
        .ok_or_else(format_error)
}

/// Render hundredths as `"ss.cc"` below one minute, `"m:ss.cc"` otherwise.
pub fn format_time(hs: u64) -> String {
    RaceTime(hs).to_string()
}

/// True for blank marks and non-numeric markers such as "DSQ", "DNF", "Abs".
pub fn is_unavailable(value: &str) -> bool {
    !value
        .trim()
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit())
}

fn parse_digits(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

// ============================================================================
// TESTS
// ============================================================================
