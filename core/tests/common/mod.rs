// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Common test utilities for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - An in-memory fake `CalDAV` server
//! - Test data factories (fixtures)
//! - Temporary directory management with auto-cleanup

mod fake_remote;
mod fixtures;

#[allow(unused_imports)]
pub use fake_remote::{Call, FakeRemote, Failure};
#[allow(unused_imports)]
pub use fixtures::{TestEngine, at, buy_milk, drain, remote_todo};
#[allow(unused_imports)]
pub use temp_dir::setup_temp_dir;
