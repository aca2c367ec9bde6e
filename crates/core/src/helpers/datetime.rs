//! Date/time normalisation for compact HL7 timestamps.
//!
//! HL7 DTM values are `YYYY[MM[DD[HH[MM[SS[.S[S[S[S]]]]]]]]][+/-ZZZZ]`. The precision of the
//! input decides the precision of the output:
//!
//! ```text
//! 2020                   → 2020
//! 202012                 → 2020-12
//! 20201222               → 2020-12-22
//! 2020122212             → 2020-12-22 12:00
//! 202012221222           → 2020-12-22 12:22
//! 20201222122233         → 2020-12-22 12:22:33
//! 20201222122233.45      → 2020-12-22 12:22:33.450000
//! 20201222122233+0100    → 2020-12-22 12:22:33 +01:00
//! ```

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;

/// A value that could not be read as an HL7 date/time.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("failed to parse date/time value \"{value}\" with format \"{format}\"")]
pub struct DateTimeParseError {
    pub value: String,
    pub format: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Precision {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Fraction,
}

impl Precision {
    /// Precision implied by the length of the value without its offset.
    fn from_len(len: usize) -> Self {
        match len {
            0..=4 => Precision::Year,
            5..=6 => Precision::Month,
            7..=8 => Precision::Day,
            9..=10 => Precision::Hour,
            11..=12 => Precision::Minute,
            13..=14 => Precision::Second,
            _ => Precision::Fraction,
        }
    }

    /// The expected input layout, for error messages.
    fn input_format(self) -> &'static str {
        match self {
            Precision::Year => "YYYY",
            Precision::Month => "YYYYMM",
            Precision::Day => "YYYYMMDD",
            Precision::Hour => "YYYYMMDDHH",
            Precision::Minute => "YYYYMMDDHHMM",
            Precision::Second => "YYYYMMDDHHMMSS",
            Precision::Fraction => "YYYYMMDDHHMMSS.S",
        }
    }

    fn digits(self) -> usize {
        match self {
            Precision::Year => 4,
            Precision::Month => 6,
            Precision::Day => 8,
            Precision::Hour => 10,
            Precision::Minute => 12,
            Precision::Second | Precision::Fraction => 14,
        }
    }

    fn output_format(self) -> &'static str {
        match self {
            Precision::Year => "%Y",
            Precision::Month => "%Y-%m",
            Precision::Day => "%Y-%m-%d",
            Precision::Hour | Precision::Minute => "%Y-%m-%d %H:%M",
            Precision::Second => "%Y-%m-%d %H:%M:%S",
            Precision::Fraction => "%Y-%m-%d %H:%M:%S%.6f",
        }
    }
}

/// A parsed HL7 date/time, remembering the precision it was given with.
///
/// Fields below the given precision are zero (or the first month/day).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hl7DateTime {
    local: NaiveDateTime,
    precision: Precision,
    offset: Option<FixedOffset>,
}

impl Hl7DateTime {
    /// Parses a compact HL7 date/time.
    ///
    /// The offset starts at the first `+`, or failing that the first `-`.
    ///
    /// # Errors
    ///
    /// Returns [`DateTimeParseError`] when the digits do not match the layout implied by the
    /// length, describe an impossible date or time, or the offset is malformed.
    pub fn parse(value: &str) -> Result<Self, DateTimeParseError> {
        let offset_position = value.find('+').or_else(|| value.find('-'));
        let (body, offset) = match offset_position {
            Some(position) => value.split_at(position),
            None => (value, ""),
        };

        let precision = Precision::from_len(body.len());
        let error = || DateTimeParseError {
            value: value.to_string(),
            format: precision.input_format(),
        };

        let (digits, fraction) = match precision {
            Precision::Fraction => {
                if !body.is_char_boundary(14) {
                    return Err(error());
                }
                let (digits, fraction) = body.split_at(14);
                let fraction = fraction.strip_prefix('.').ok_or_else(error)?;
                (digits, Some(fraction))
            }
            _ => (body, None),
        };
        if digits.len() != precision.digits() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(error());
        }

        let field = |range: std::ops::Range<usize>, default: u32| -> u32 {
            digits
                .get(range)
                .and_then(|part| part.parse().ok())
                .unwrap_or(default)
        };
        let year = digits[0..4].parse::<i32>().map_err(|_| error())?;
        let date = NaiveDate::from_ymd_opt(year, field(4..6, 1), field(6..8, 1)).ok_or_else(error)?;
        let mut local = date
            .and_hms_opt(field(8..10, 0), field(10..12, 0), field(12..14, 0))
            .ok_or_else(error)?;

        if let Some(fraction) = fraction {
            if fraction.is_empty()
                || fraction.len() > 6
                || !fraction.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(error());
            }
            let micros: u32 = format!("{fraction:0<6}").parse().map_err(|_| error())?;
            local = local.with_nanosecond(micros * 1_000).ok_or_else(error)?;
        }

        let offset = if offset.is_empty() {
            None
        } else {
            Some(parse_offset(offset).ok_or_else(error)?)
        };

        Ok(Self {
            local,
            precision,
            offset,
        })
    }

    /// The date/time as written, ignoring any offset.
    pub fn local(&self) -> NaiveDateTime {
        self.local
    }

    pub fn offset(&self) -> Option<FixedOffset> {
        self.offset
    }
}

impl fmt::Display for Hl7DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.local.format(self.precision.output_format()))?;
        if let Some(offset) = self.offset {
            let seconds = offset.local_minus_utc();
            let sign = if seconds < 0 { '-' } else { '+' };
            let minutes = seconds.abs() / 60;
            write!(f, " {}{:02}:{:02}", sign, minutes / 60, minutes % 60)?;
        }
        Ok(())
    }
}

/// `+HHMM`, `-HHMM`, `+HH:MM` or `-HH:MM`.
fn parse_offset(offset: &str) -> Option<FixedOffset> {
    let (sign, rest) = match offset.as_bytes().first()? {
        b'+' => (1, &offset[1..]),
        b'-' => (-1, &offset[1..]),
        _ => return None,
    };
    let rest = rest.replacen(':', "", 1);
    if rest.len() != 4 || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = rest[0..2].parse().ok()?;
    let minutes: i32 = rest[2..4].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Parses a compact HL7 date/time and formats it according to its precision.
///
/// # Errors
///
/// Returns [`DateTimeParseError`] if the value cannot be parsed.
pub fn format(value: &str) -> Result<String, DateTimeParseError> {
    Hl7DateTime::parse(value).map(|parsed| parsed.to_string())
}

/// Converts a duration such as `1w1d` into a number of days.
///
/// Empty and all-digit values are returned unchanged. Otherwise digits accumulate until a
/// unit: `d` adds them as days, `w` as weeks, any other character discards them. Trailing
/// digits count as days.
pub fn convert_to_days(value: &str) -> String {
    if value.is_empty() || value.bytes().all(|b| b.is_ascii_digit()) {
        return value.to_string();
    }

    let mut total: u64 = 0;
    let mut digits: u64 = 0;
    for c in value.chars() {
        if let Some(digit) = c.to_digit(10) {
            digits = digits.saturating_mul(10).saturating_add(u64::from(digit));
            continue;
        }
        match c.to_ascii_lowercase() {
            'd' => total = total.saturating_add(digits),
            'w' => total = total.saturating_add(digits.saturating_mul(7)),
            _ => {}
        }
        digits = 0;
    }

    total.saturating_add(digits).to_string()
}
