// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! iCalendar formatter for to-do resources.
//!
//! Properties are written in a fixed order so identical input always produces
//! identical output (apart from `DTSTAMP`, which is supplied by the caller).
//!
//! # Example
//!
//! ```
//! use tasksync_ical::{VTodo, format_todo};
//!
//! let todo = VTodo::new("uid-1", "Buy milk");
//! let stamp = "2024-01-15T12:00:00Z".parse().unwrap();
//! let ics = format_todo(&todo, stamp);
//! assert!(ics.contains("SUMMARY:Buy milk\r\n"));
//! ```

use jiff::Timestamp;
use jiff::civil::DateTime;

use crate::keyword::{
    KW_BEGIN, KW_CATEGORIES, KW_COMPLETED, KW_CREATED, KW_DESCRIPTION, KW_DTSTAMP, KW_DTSTART,
    KW_DUE, KW_END, KW_LOCATION, KW_ORGANIZER, KW_PERCENT_COMPLETE, KW_PRIORITY, KW_PRODID,
    KW_STATUS, KW_SUMMARY, KW_UID, KW_URL, KW_VCALENDAR, KW_VERSION, KW_VERSION_2_0, KW_VTODO,
};
use crate::todo::{TodoStatus, VTodo};
use crate::value::{escape_text, format_floating, format_utc};

/// Product identifier written into every calendar object.
pub const PRODUCT_ID: &str = "-//yzx9//tasksync//EN";

/// Maximum content line length in octets before folding (RFC 5545 Section 3.1).
const FOLD_WIDTH: usize = 75;

/// Formats a to-do as a complete `VCALENDAR` object.
///
/// `stamp` becomes the `DTSTAMP` and is the only value written in UTC; every
/// other date-time is written as floating time.
#[must_use]
pub fn format_todo(todo: &VTodo, stamp: Timestamp) -> String {
    let mut f = Formatter::default();

    f.line(KW_BEGIN, KW_VCALENDAR);
    f.line(KW_VERSION, KW_VERSION_2_0);
    f.line(KW_PRODID, PRODUCT_ID);
    f.line(KW_BEGIN, KW_VTODO);

    f.text(KW_UID, &todo.uid);
    f.line(KW_DTSTAMP, &format_utc(stamp));
    f.text(KW_SUMMARY, &todo.summary);
    f.line(KW_STATUS, todo.status.as_ref());

    f.opt_text(KW_DESCRIPTION, todo.description.as_deref());
    f.opt_text(KW_LOCATION, todo.location.as_deref());
    f.opt_raw(KW_URL, todo.url.as_deref());
    f.opt_raw(KW_ORGANIZER, todo.organizer.as_deref());
    f.opt_datetime(KW_DUE, todo.due);
    f.opt_datetime(KW_DTSTART, todo.dt_start);
    f.opt_datetime(KW_CREATED, todo.created);
    if let Some(priority) = todo.priority.filter(|p| *p > 0) {
        f.line(KW_PRIORITY, &priority.min(9).to_string());
    }
    if todo.percent_complete > 0 {
        f.line(KW_PERCENT_COMPLETE, &todo.percent_complete.min(100).to_string());
    }
    if todo.status == TodoStatus::Completed {
        let completed = todo
            .completed
            .unwrap_or_else(|| stamp.to_zoned(jiff::tz::TimeZone::UTC).datetime());
        f.line(KW_COMPLETED, &format_floating(completed));
    }
    if !todo.categories.is_empty() {
        let joined = todo
            .categories
            .iter()
            .map(|c| escape_text(c))
            .collect::<Vec<_>>()
            .join(",");
        f.line(KW_CATEGORIES, &joined);
    }

    f.line(KW_END, KW_VTODO);
    f.line(KW_END, KW_VCALENDAR);
    f.finish()
}

/// Accumulates folded content lines.
#[derive(Debug, Default)]
struct Formatter {
    out: String,
}

impl Formatter {
    fn line(&mut self, name: &str, value: &str) {
        let mut width = 0;
        for ch in name.chars().chain(std::iter::once(':')).chain(value.chars()) {
            let len = ch.len_utf8();
            if width + len > FOLD_WIDTH {
                self.out.push_str("\r\n ");
                width = 1;
            }
            self.out.push(ch);
            width += len;
        }
        self.out.push_str("\r\n");
    }

    fn text(&mut self, name: &str, value: &str) {
        self.line(name, &escape_text(value));
    }

    fn opt_text(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.text(name, value);
        }
    }

    fn opt_raw(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.line(name, value);
        }
    }

    fn opt_datetime(&mut self, name: &str, value: Option<DateTime>) {
        if let Some(dt) = value {
            self.line(name, &format_floating(dt));
        }
    }

    fn finish(self) -> String {
        self.out
    }
}
