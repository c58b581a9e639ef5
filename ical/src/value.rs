// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Value encodings used by the task codec: escaped text, floating date/time
//! and small integers.

use jiff::Timestamp;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;

/// Errors raised while decoding a property value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// The value is not a readable date or date-time.
    #[error("invalid date-time value: {0:?}")]
    InvalidDateTime(String),

    /// The value is not a readable integer in range.
    #[error("invalid integer value: {0:?}")]
    InvalidInteger(String),
}

/// Escapes a TEXT value (RFC 5545 Section 3.3.11).
///
/// ```
/// use tasksync_ical::value::escape_text;
///
/// assert_eq!(escape_text("a;b,c\\d\ne"), "a\\;b\\,c\\\\d\\ne");
/// ```
#[must_use]
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

/// Reverses [`escape_text`]. Unknown escapes keep the escaped character.
#[must_use]
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Splits a multi-valued TEXT property on unescaped commas and unescapes each part.
#[must_use]
pub fn split_text_list(value: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in value.chars() {
        if escaped {
            current.push('\\');
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == ',' {
            parts.push(unescape_text(&current));
            current.clear();
        } else {
            current.push(c);
        }
    }
    if escaped {
        current.push('\\');
    }
    parts.push(unescape_text(&current));
    parts.retain(|p| !p.trim().is_empty());
    parts
}

/// Formats a floating date-time as `YYYYMMDDTHHMMSS`, without suffix or offset.
#[must_use]
pub fn format_floating(dt: DateTime) -> String {
    dt.strftime("%Y%m%dT%H%M%S").to_string()
}

/// Formats an instant as a UTC date-time, `YYYYMMDDTHHMMSSZ`.
#[must_use]
pub fn format_utc(ts: Timestamp) -> String {
    ts.to_zoned(TimeZone::UTC)
        .strftime("%Y%m%dT%H%M%SZ")
        .to_string()
}

/// Reads a date or date-time value positionally as a floating wall-clock time.
///
/// A trailing `Z` or numeric offset is dropped rather than applied. Both the
/// basic (`20240115T170000`) and extended (`2024-01-15T17:00:00`) forms are
/// accepted, and a date without a time reads as midnight.
///
/// # Errors
///
/// Returns an error if the digits do not form a valid calendar date and time.
pub fn parse_floating(value: &str) -> Result<DateTime, ValueError> {
    let invalid = || ValueError::InvalidDateTime(value.to_string());

    let trimmed = value.trim();
    let without_zone = match trimmed.find(['T', 't']) {
        Some(pos) => {
            let (date, time) = trimmed.split_at(pos);
            let time_end = time.find(['Z', 'z', '+', '-']).unwrap_or(time.len());
            let time = time.get(..time_end).ok_or_else(invalid)?;
            format!("{date}{time}")
        }
        None => trimmed.to_string(),
    };

    let digits: Vec<u8> = without_zone
        .bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect();

    let field = |start: usize, len: usize| -> Option<i32> {
        digits
            .get(start..start + len)
            .map(|ds| ds.iter().fold(0_i32, |acc, d| acc * 10 + i32::from(*d)))
    };

    let (hour, minute, second) = match digits.len() {
        8 => (0, 0, 0),
        12 => (field(8, 2).ok_or_else(invalid)?, field(10, 2).ok_or_else(invalid)?, 0),
        14 => (
            field(8, 2).ok_or_else(invalid)?,
            field(10, 2).ok_or_else(invalid)?,
            field(12, 2).ok_or_else(invalid)?,
        ),
        _ => return Err(invalid()),
    };
    let year = field(0, 4).ok_or_else(invalid)?;
    let month = field(4, 2).ok_or_else(invalid)?;
    let day = field(6, 2).ok_or_else(invalid)?;

    let narrow = |v: i32| i8::try_from(v).map_err(|_| invalid());
    DateTime::new(
        i16::try_from(year).map_err(|_| invalid())?,
        narrow(month)?,
        narrow(day)?,
        narrow(hour)?,
        narrow(minute)?,
        narrow(second)?,
        0,
    )
    .map_err(|_| invalid())
}

/// Reads an unsigned integer value such as `PRIORITY` or `PERCENT-COMPLETE`.
///
/// # Errors
///
/// Returns an error if the value is not a number or is out of range.
pub fn parse_u8(value: &str) -> Result<u8, ValueError> {
    lexical::parse::<u8, _>(value.trim().as_bytes())
        .map_err(|_| ValueError::InvalidInteger(value.to_string()))
}
