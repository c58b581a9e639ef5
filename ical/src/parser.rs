// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Line-oriented parser for the first VTODO component of an iCalendar object.

use crate::keyword::{
    KW_BEGIN, KW_CATEGORIES, KW_COMPLETED, KW_CREATED, KW_DESCRIPTION, KW_DTSTART, KW_DUE, KW_END,
    KW_LAST_MODIFIED, KW_LOCATION, KW_ORGANIZER, KW_PERCENT_COMPLETE, KW_PRIORITY, KW_STATUS,
    KW_SUMMARY, KW_UID, KW_URL, KW_VTODO,
};
use crate::todo::{TodoStatus, VTodo};
use crate::value::{ValueError, parse_floating, parse_u8, split_text_list, unescape_text};

/// Errors raised while parsing a to-do resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The object contains no VTODO component.
    #[error("no VTODO component found")]
    MissingTodo,

    /// The VTODO component is not terminated.
    #[error("unterminated VTODO component")]
    Unterminated,

    /// The VTODO component has no (or an empty) UID.
    #[error("VTODO component has no UID")]
    MissingUid,

    /// A property line has no `:` separating name and value.
    #[error("malformed content line: {0:?}")]
    MalformedLine(String),

    /// A property value could not be decoded.
    #[error("invalid {property}: {source}")]
    InvalidValue {
        /// Property name.
        property: String,
        /// Underlying value error.
        source: ValueError,
    },
}

/// Parses the first VTODO component found in `src`.
///
/// Components other than VTODO are skipped, as are components nested inside
/// the to-do (such as VALARM) and any property this codec does not model.
///
/// # Errors
///
/// Returns an error if there is no VTODO, the UID is missing, or a modelled
/// property carries a value that cannot be decoded.
pub fn parse_todo(src: &str) -> Result<VTodo, ParseError> {
    let mut todo: Option<VTodo> = None;
    let mut nested = 0_usize;

    for line in unfold(src) {
        if line.trim().is_empty() {
            continue;
        }
        let (name, value) = split_line(&line)?;

        if name.eq_ignore_ascii_case(KW_BEGIN) {
            if todo.is_some() {
                nested += 1;
            } else if value.trim().eq_ignore_ascii_case(KW_VTODO) {
                todo = Some(VTodo::default());
            }
            continue;
        }

        if name.eq_ignore_ascii_case(KW_END) {
            if todo.is_some() {
                if nested > 0 {
                    nested -= 1;
                } else if value.trim().eq_ignore_ascii_case(KW_VTODO) {
                    return finish(todo);
                }
            }
            continue;
        }

        if nested > 0 {
            continue;
        }
        if let Some(todo) = todo.as_mut() {
            apply_property(todo, &name, value)?;
        }
    }

    match todo {
        Some(_) => Err(ParseError::Unterminated),
        None => Err(ParseError::MissingTodo),
    }
}

fn finish(todo: Option<VTodo>) -> Result<VTodo, ParseError> {
    let todo = todo.ok_or(ParseError::MissingTodo)?;
    if todo.uid.trim().is_empty() {
        return Err(ParseError::MissingUid);
    }
    Ok(todo)
}

fn apply_property(todo: &mut VTodo, name: &str, value: &str) -> Result<(), ParseError> {
    let invalid = |source| ParseError::InvalidValue {
        property: name.to_string(),
        source,
    };
    let text = || Some(unescape_text(value)).filter(|v| !v.is_empty());
    let datetime = || parse_floating(value).map(Some).map_err(invalid);

    match name {
        KW_UID => todo.uid = unescape_text(value).trim().to_string(),
        KW_SUMMARY => todo.summary = unescape_text(value),
        KW_DESCRIPTION => todo.description = text(),
        KW_LOCATION => todo.location = text(),
        KW_URL => todo.url = Some(value.trim().to_string()).filter(|v| !v.is_empty()),
        KW_ORGANIZER => todo.organizer = Some(value.trim().to_string()).filter(|v| !v.is_empty()),
        KW_STATUS => todo.status = TodoStatus::parse_lossy(value),
        KW_PRIORITY => todo.priority = Some(parse_u8(value).map_err(invalid)?).filter(|p| *p > 0),
        KW_PERCENT_COMPLETE => todo.percent_complete = parse_u8(value).map_err(invalid)?.min(100),
        KW_DTSTART => todo.dt_start = datetime()?,
        KW_DUE => todo.due = datetime()?,
        KW_CREATED => todo.created = datetime()?,
        KW_COMPLETED => todo.completed = datetime()?,
        KW_LAST_MODIFIED => todo.last_modified = datetime()?,
        KW_CATEGORIES => todo.categories.extend(split_text_list(value)),
        _ => {}
    }
    Ok(())
}

/// Joins folded continuation lines; accepts both CRLF and bare LF endings.
fn unfold(src: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in src.split('\n') {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        match (raw.strip_prefix([' ', '\t']), lines.last_mut()) {
            (Some(rest), Some(last)) => last.push_str(rest),
            _ => lines.push(raw.to_string()),
        }
    }
    lines
}

/// Splits a content line into its upper-cased property name (parameters
/// dropped) and raw value. Colons inside quoted parameter values are skipped.
fn split_line(line: &str) -> Result<(String, &str), ParseError> {
    let mut in_quotes = false;
    let mut name_end = None;
    let mut colon = None;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes && name_end.is_none() => name_end = Some(i),
            ':' if !in_quotes => {
                colon = Some(i);
                break;
            }
            _ => {}
        }
    }

    let colon = colon.ok_or_else(|| ParseError::MalformedLine(line.to_string()))?;
    let name_end = name_end.unwrap_or(colon).min(colon);
    let name = line
        .get(..name_end)
        .ok_or_else(|| ParseError::MalformedLine(line.to_string()))?
        .trim()
        .to_ascii_uppercase();
    let value = line.get(colon + 1..).unwrap_or_default();
    Ok((name, value))
}
