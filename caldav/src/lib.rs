// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! `CalDAV` client for locating task collections and reading and writing
//! individual to-do resources (RFC 4791).

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
#![allow(
    clippy::option_option,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::match_bool
)]

mod client;
mod config;
pub mod discovery;
mod error;
mod http;
mod request;
mod response;
mod types;
mod xml;

pub use crate::client::CalDavClient;
pub use crate::config::{AuthMethod, CalDavConfig};
pub use crate::error::CalDavError;
pub use crate::request::{CalendarQueryRequest, Prop, PropFindRequest};
pub use crate::response::{MultiStatusResponse, Properties, PropStat, ResponseItem};
pub use crate::types::{
    CollectionEntry, Discovery, DiscoverySource, ETag, Href, RemoteTask, SkippedResource,
    TaskFetch,
};
