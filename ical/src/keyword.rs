// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Keywords defined in iCalendar RFC 5545 that the task codec reads or writes.

#![allow(missing_docs)]

pub const KW_BEGIN: &str = "BEGIN";
pub const KW_END: &str = "END";

pub const KW_VCALENDAR: &str = "VCALENDAR";
pub const KW_VTODO: &str = "VTODO";

pub const KW_VERSION: &str = "VERSION";
pub const KW_VERSION_2_0: &str = "2.0";
pub const KW_PRODID: &str = "PRODID";

// Section 3.8 - Component Properties
pub const KW_UID: &str = "UID";
pub const KW_DTSTAMP: &str = "DTSTAMP";
pub const KW_SUMMARY: &str = "SUMMARY";
pub const KW_DESCRIPTION: &str = "DESCRIPTION";
pub const KW_LOCATION: &str = "LOCATION";
pub const KW_URL: &str = "URL";
pub const KW_ORGANIZER: &str = "ORGANIZER";
pub const KW_STATUS: &str = "STATUS";
pub const KW_PRIORITY: &str = "PRIORITY";
pub const KW_PERCENT_COMPLETE: &str = "PERCENT-COMPLETE";
pub const KW_DTSTART: &str = "DTSTART";
pub const KW_DUE: &str = "DUE";
pub const KW_CREATED: &str = "CREATED";
pub const KW_COMPLETED: &str = "COMPLETED";
pub const KW_LAST_MODIFIED: &str = "LAST-MODIFIED";
pub const KW_CATEGORIES: &str = "CATEGORIES";

