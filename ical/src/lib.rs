// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Parse and format the task (VTODO) subset of iCalendar used for CalDAV sync.
//!
//! Date/time values are treated as *floating* wall-clock times: they are
//! written without a `Z` suffix or offset, and on input any suffix or offset
//! is dropped and the numeric components are read as-is. A value therefore
//! round-trips to the identical wall-clock reading wherever it is parsed.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]
// Allow certain clippy lints that are too restrictive for this crate
#![allow(clippy::similar_names, clippy::single_match_else)]

pub mod formatter;
pub mod keyword;
mod parser;
mod todo;
pub mod value;

pub use crate::formatter::format_todo;
pub use crate::parser::{ParseError, parse_todo};
pub use crate::todo::{TodoStatus, VTodo};
