// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! `CalDAV` client for task collections.

use std::collections::BTreeMap;
use std::sync::Arc;

use jiff::Timestamp;
use jiff::tz::TimeZone;
use reqwest::{Method, Url};
use tasksync_ical::{VTodo, format_todo, parse_todo};

use crate::config::CalDavConfig;
use crate::discovery::{is_task_collection, normalize_collection, task_href};
use crate::error::CalDavError;
use crate::http::HttpClient;
use crate::request::{CalendarQueryRequest, Prop, PropFindRequest};
use crate::response::MultiStatusResponse;
use crate::types::{
    CollectionEntry, Discovery, DiscoverySource, ETag, Href, RemoteTask, SkippedResource,
    TaskFetch,
};

const COMPONENT_VTODO: &str = "VTODO";
const CONTENT_TYPE_XML: &str = "application/xml; charset=utf-8";
const CONTENT_TYPE_CALENDAR: &str = "text/calendar; charset=utf-8";

/// `CalDAV` client for locating task collections and reading and writing
/// to-do resources.
///
/// # Example
///
/// ```no_run
/// use tasksync_caldav::{AuthMethod, CalDavClient, CalDavConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CalDavConfig {
///     base_url: "https://caldav.example.com".to_string(),
///     collection_root: "/calendars/alice/".to_string(),
///     auth: AuthMethod::Basic {
///         username: "alice".to_string(),
///         password: "secret".to_string(),
///     },
///     ..Default::default()
/// };
///
/// let client = CalDavClient::new(config)?;
/// let discovery = client.discover_collections().await;
/// for collection in &discovery.collections {
///     let fetch = client.fetch_tasks(collection).await?;
///     println!("{collection}: {} tasks", fetch.tasks.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CalDavClient {
    http: Arc<HttpClient>,
    base: Url,
    root: Href,
}

impl CalDavClient {
    /// Creates a new `CalDAV` client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or HTTP client
    /// initialization fails.
    pub fn new(config: CalDavConfig) -> Result<Self, CalDavError> {
        let base = Url::parse(config.base_url.trim())
            .map_err(|e| CalDavError::Config(format!("invalid server URL: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(CalDavError::Config(format!(
                "server URL cannot be a base: {base}"
            )));
        }

        let http = HttpClient::new(&config)?;
        Ok(Self {
            http: Arc::new(http),
            base,
            root: normalize_collection(&config.collection_root),
        })
    }

    /// The configured collection root, normalized.
    #[must_use]
    pub fn collection_root(&self) -> &Href {
        &self.root
    }

    /// Lists the task collections directly below `path`.
    ///
    /// Children are matched against the configured collection root, not
    /// against `path`, so the same rules apply when listing the server root.
    ///
    /// # Errors
    ///
    /// Returns an error if the PROPFIND request fails or the response cannot
    /// be parsed.
    pub async fn list_collections(&self, path: &Href) -> Result<Vec<CollectionEntry>, CalDavError> {
        let path = normalize_collection(path);
        let mut propfind = PropFindRequest::new();
        propfind
            .add_property(Prop::ResourceType)
            .add_property(Prop::DisplayName)
            .add_property(Prop::SupportedCalendarComponents);
        let body = propfind.build()?;

        let req = self
            .http
            .build_dav_request("PROPFIND", self.url(&path)?)?
            .header("Content-Type", CONTENT_TYPE_XML)
            .header("Depth", "1")
            .body(body);
        let resp = self.http.execute(req, &path).await?;
        let xml = resp.text().await?;
        let multistatus = MultiStatusResponse::from_xml(&xml)?;

        let mut entries: Vec<CollectionEntry> = Vec::new();
        for item in multistatus.responses.iter().filter(|r| r.is_ok()) {
            let props = item.ok_props();
            if props.has_resource_type && !props.is_collection {
                continue;
            }
            if let Some(components) = &props.supported_components
                && !components.is_empty()
                && !components.iter().any(|c| c == COMPONENT_VTODO)
            {
                tracing::debug!(href = %item.href, "skipping collection without VTODO support");
                continue;
            }
            if !is_task_collection(&item.href, &self.root) {
                continue;
            }

            let href = normalize_collection(&item.href);
            if entries.iter().any(|e| e.href == href) {
                continue;
            }
            entries.push(CollectionEntry {
                href,
                display_name: props.display_name,
            });
        }

        tracing::debug!(path = %path, count = entries.len(), "listed collections");
        Ok(entries)
    }

    /// Locates the task collections on the server. Never fails.
    ///
    /// Lists the configured root first, then the server root. When neither
    /// yields a collection, or the server cannot be queried, the configured
    /// root itself is returned as the sole collection.
    pub async fn discover_collections(&self) -> Discovery {
        let attempts = [
            (self.root.clone(), DiscoverySource::Root),
            (Href::from("/"), DiscoverySource::ServerRoot),
        ];

        for (path, source) in attempts {
            if source == DiscoverySource::ServerRoot && path == self.root {
                continue;
            }
            match self.list_collections(&path).await {
                Ok(entries) if !entries.is_empty() => {
                    let display_names = entries
                        .iter()
                        .filter_map(|e| Some((e.href.clone(), e.display_name.clone()?)))
                        .collect();
                    return Discovery {
                        collections: entries.into_iter().map(|e| e.href).collect(),
                        display_names,
                        source,
                    };
                }
                Ok(_) => tracing::debug!(path = %path, "no task collections listed"),
                Err(e) if source == DiscoverySource::ServerRoot => {
                    tracing::debug!(path = %path, error = %e, "server root not listable");
                }
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "collection discovery failed");
                    return self.fallback(DiscoverySource::Failed(e.to_string()));
                }
            }
        }

        self.fallback(DiscoverySource::Fallback)
    }

    fn fallback(&self, source: DiscoverySource) -> Discovery {
        Discovery {
            collections: vec![self.root.clone()],
            display_names: BTreeMap::new(),
            source,
        }
    }

    /// Fetches every to-do in `collection`.
    ///
    /// Resources without calendar data, or whose data cannot be parsed, are
    /// recorded in [`TaskFetch::skipped`] instead of failing the fetch.
    ///
    /// # Errors
    ///
    /// Returns an error if the REPORT request fails or the multistatus
    /// response cannot be parsed.
    pub async fn fetch_tasks(&self, collection: &Href) -> Result<TaskFetch, CalDavError> {
        let collection = normalize_collection(collection);
        let body = CalendarQueryRequest::new()
            .component(COMPONENT_VTODO)
            .build()?;

        let req = self
            .http
            .build_dav_request("REPORT", self.url(&collection)?)?
            .header("Content-Type", CONTENT_TYPE_XML)
            .header("Depth", "1")
            .body(body);
        let resp = self.http.execute(req, &collection).await?;
        let xml = resp.text().await?;
        let multistatus = MultiStatusResponse::from_xml(&xml)?;

        let mut fetch = TaskFetch::default();
        for item in multistatus.responses {
            let props = item.ok_props();
            let Some(data) = props.calendar_data else {
                if normalize_collection(&item.href) != collection {
                    fetch.skipped.push(SkippedResource {
                        href: item.href,
                        reason: "no calendar data".to_string(),
                    });
                }
                continue;
            };

            match parse_todo(&data) {
                Ok(todo) => {
                    let last_modified = props
                        .get_last_modified
                        .as_deref()
                        .and_then(parse_http_date)
                        .or_else(|| {
                            todo.last_modified
                                .and_then(|dt| dt.to_zoned(TimeZone::UTC).ok())
                                .map(|z| z.timestamp())
                        });
                    fetch.tasks.push(RemoteTask {
                        href: item.href,
                        etag: props.get_etag,
                        last_modified,
                        todo,
                    });
                }
                Err(e) => {
                    tracing::warn!(href = %item.href, error = %e, "skipping unparseable task");
                    fetch.skipped.push(SkippedResource {
                        href: item.href,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            collection = %collection,
            tasks = fetch.tasks.len(),
            skipped = fetch.skipped.len(),
            "fetched tasks"
        );
        Ok(fetch)
    }

    /// Creates or overwrites the resource for `todo` in `collection`.
    ///
    /// Returns the entity tag issued by the server, or a locally generated
    /// placeholder when the response carries none.
    ///
    /// # Errors
    ///
    /// Returns an error if the to-do has no uid or the PUT request fails.
    pub async fn put_task(&self, collection: &Href, todo: &VTodo) -> Result<ETag, CalDavError> {
        if todo.uid.trim().is_empty() {
            return Err(CalDavError::InvalidResponse(
                "cannot store a task without uid".to_string(),
            ));
        }

        let href = task_href(collection, &todo.uid);
        let body = format_todo(todo, Timestamp::now());
        let req = self
            .http
            .build_request(Method::PUT, self.url(&href)?)
            .header("Content-Type", CONTENT_TYPE_CALENDAR)
            .body(body);
        let resp = self.http.execute(req, &href).await?;

        let etag = HttpClient::extract_etag(&resp).unwrap_or_else(|| {
            let placeholder = ETag::new(format!("\"local-{}\"", uuid::Uuid::new_v4()));
            tracing::debug!(href = %href, etag = %placeholder, "server sent no ETag, using placeholder");
            placeholder
        });
        tracing::debug!(href = %href, etag = %etag, "stored task");
        Ok(etag)
    }

    /// Deletes the resource for `uid` in `collection`.
    ///
    /// A resource that is already gone counts as deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the DELETE request fails for any other reason.
    pub async fn delete_task(&self, collection: &Href, uid: &str) -> Result<(), CalDavError> {
        let href = task_href(collection, uid);
        let req = self.http.build_request(Method::DELETE, self.url(&href)?);
        match self.http.execute(req, &href).await {
            Ok(_) => {
                tracing::debug!(href = %href, "deleted task");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(href = %href, "task already gone");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn url(&self, href: &Href) -> Result<Url, CalDavError> {
        self.base
            .join(href.as_str())
            .map_err(|e| CalDavError::Config(format!("invalid resource path {href}: {e}")))
    }
}

/// Parses an HTTP date (`Mon, 15 Jan 2024 17:00:00 GMT`).
fn parse_http_date(value: &str) -> Option<Timestamp> {
    jiff::fmt::rfc2822::parse(value.trim())
        .ok()
        .map(|zoned| zoned.timestamp())
}
