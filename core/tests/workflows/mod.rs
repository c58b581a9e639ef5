// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! End-to-end workflow tests for the tasksync-core crate.
//!
//! These tests run full sync passes against the SQLite store and against a
//! `CalDAV` server mocked over HTTP.

mod caldav_sync;
