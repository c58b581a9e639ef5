// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Reconciliation engine tests against an in-memory server.
//!
//! These tests drive whole passes and check the local store, the traffic sent
//! to the server, the emitted events and the pass report.

mod pull;
mod push;
mod tombstones;
