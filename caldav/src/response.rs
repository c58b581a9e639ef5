// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Response parsers for WebDAV/CalDAV operations.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::CalDavError;
use crate::types::{ETag, Href};
use crate::xml::read_element_text;

/// `WebDAV` multistatus response.
#[derive(Debug, Clone, Default)]
pub struct MultiStatusResponse {
    /// The response items.
    pub responses: Vec<ResponseItem>,
}

/// Individual response in multistatus.
#[derive(Debug, Clone, Default)]
pub struct ResponseItem {
    /// The href the response describes.
    pub href: Href,
    /// Property groups, each with its own status.
    pub prop_stats: Vec<PropStat>,
    /// Response-level status, used when no propstat is present.
    pub status: Option<String>,
}

/// Property stat with status and value.
#[derive(Debug, Clone, Default)]
pub struct PropStat {
    /// Properties reported under this status.
    pub props: Properties,
    /// Status line, e.g. `HTTP/1.1 200 OK`.
    pub status: String,
}

/// WebDAV/CalDAV properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    /// `displayname`.
    pub display_name: Option<String>,
    /// `getetag`.
    pub get_etag: Option<ETag>,
    /// `getlastmodified`, as the raw HTTP date.
    pub get_last_modified: Option<String>,
    /// `calendar-data`.
    pub calendar_data: Option<String>,
    /// Component names from `supported-calendar-component-set`.
    pub supported_components: Option<Vec<String>>,
    /// Whether `resourcetype` lists `collection`.
    pub is_collection: bool,
    /// Whether `resourcetype` was reported at all.
    pub has_resource_type: bool,
}

impl Properties {
    /// Fills every unset field from `other`.
    fn merge(&mut self, other: &Self) {
        fn fill<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if dst.is_none() {
                dst.clone_from(src);
            }
        }
        fill(&mut self.display_name, &other.display_name);
        fill(&mut self.get_etag, &other.get_etag);
        fill(&mut self.get_last_modified, &other.get_last_modified);
        fill(&mut self.calendar_data, &other.calendar_data);
        fill(&mut self.supported_components, &other.supported_components);
        self.is_collection |= other.is_collection;
        self.has_resource_type |= other.has_resource_type;
    }
}

/// Whether an HTTP status line reports success.
fn is_success(status: &str) -> bool {
    status
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .is_some_and(|code| (200..300).contains(&code))
}

impl ResponseItem {
    /// Properties from every successful propstat, merged.
    ///
    /// A response without any propstat is treated as successful unless its
    /// own status says otherwise.
    #[must_use]
    pub fn ok_props(&self) -> Properties {
        let mut props = Properties::default();
        for prop_stat in self.prop_stats.iter().filter(|p| is_success(&p.status)) {
            props.merge(&prop_stat.props);
        }
        props
    }

    /// Whether the response as a whole reports success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        match &self.status {
            Some(status) => is_success(status),
            None => {
                self.prop_stats.is_empty() || self.prop_stats.iter().any(|p| is_success(&p.status))
            }
        }
    }
}

impl MultiStatusResponse {
    /// Parses multistatus response from XML.
    ///
    /// Element names are matched by local name, so any namespace prefix the
    /// server chooses is accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if XML parsing fails.
    pub fn from_xml(xml: &str) -> Result<Self, CalDavError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().check_end_names = true;

        let mut responses = Vec::new();
        let mut current: Option<ResponseItem> = None;
        let mut prop_stat: Option<PropStat> = None;
        let mut stack: Vec<Vec<u8>> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Eof => break,

                Event::Start(ref e) => {
                    let name = local_name(e);
                    let parent = stack.last().map(Vec::as_slice);
                    match (name.as_slice(), parent) {
                        (b"response", _) => current = Some(ResponseItem::default()),
                        (b"propstat", _) if current.is_some() => {
                            prop_stat = Some(PropStat::default());
                        }
                        (b"href", Some(b"response")) => {
                            let href = read_element_text(&mut reader)?;
                            if let Some(resp) = current.as_mut() {
                                resp.href = Href::new(href);
                            }
                            continue;
                        }
                        (b"status", Some(b"propstat")) => {
                            let status = read_element_text(&mut reader)?;
                            if let Some(ps) = prop_stat.as_mut() {
                                ps.status = status;
                            }
                            continue;
                        }
                        (b"status", Some(b"response")) => {
                            let status = read_element_text(&mut reader)?;
                            if let Some(resp) = current.as_mut() {
                                resp.status = Some(status);
                            }
                            continue;
                        }
                        (
                            b"displayname" | b"getetag" | b"getlastmodified" | b"calendar-data",
                            Some(b"prop"),
                        ) => {
                            let text = read_element_text(&mut reader)?;
                            if let Some(ps) = prop_stat.as_mut() {
                                set_text_prop(&mut ps.props, &name, text);
                            }
                            continue;
                        }
                        (b"resourcetype", Some(b"prop")) => {
                            if let Some(ps) = prop_stat.as_mut() {
                                ps.props.has_resource_type = true;
                            }
                        }
                        (b"supported-calendar-component-set", Some(b"prop")) => {
                            if let Some(ps) = prop_stat.as_mut() {
                                ps.props.supported_components.get_or_insert_with(Vec::new);
                            }
                        }
                        _ => {}
                    }
                    stack.push(name);
                    if let Some(ps) = prop_stat.as_mut() {
                        apply_marker(&mut ps.props, e, &stack)?;
                    }
                }

                Event::Empty(ref e) => {
                    let name = local_name(e);
                    if let Some(ps) = prop_stat.as_mut() {
                        match (name.as_slice(), stack.last().map(Vec::as_slice)) {
                            (b"resourcetype", Some(b"prop")) => ps.props.has_resource_type = true,
                            (b"supported-calendar-component-set", Some(b"prop")) => {
                                ps.props.supported_components.get_or_insert_with(Vec::new);
                            }
                            _ => {
                                let mut path = stack.clone();
                                path.push(name);
                                apply_marker(&mut ps.props, e, &path)?;
                            }
                        }
                    }
                }

                Event::End(ref e) => {
                    let name = e.name().local_name().into_inner().to_vec();
                    stack.pop();
                    match name.as_slice() {
                        b"propstat" => {
                            if let (Some(resp), Some(ps)) = (current.as_mut(), prop_stat.take()) {
                                resp.prop_stats.push(ps);
                            }
                        }
                        b"response" => {
                            if let Some(resp) = current.take() {
                                responses.push(resp);
                            }
                        }
                        _ => {}
                    }
                }

                _ => {}
            }
        }

        Ok(Self { responses })
    }
}

fn local_name(e: &BytesStart<'_>) -> Vec<u8> {
    e.name().local_name().into_inner().to_vec()
}

fn set_text_prop(props: &mut Properties, name: &[u8], text: String) {
    let value = Some(text).filter(|t| !t.is_empty());
    match name {
        b"displayname" => props.display_name = value,
        b"getetag" => props.get_etag = value.map(ETag::new),
        b"getlastmodified" => props.get_last_modified = value,
        b"calendar-data" => props.calendar_data = value,
        _ => {}
    }
}

/// Records marker elements: `collection` under `resourcetype`,
/// and `comp` under `supported-calendar-component-set`. `path` ends with the
/// element itself.
fn apply_marker(
    props: &mut Properties,
    e: &BytesStart<'_>,
    path: &[Vec<u8>],
) -> Result<(), CalDavError> {
    let mut rev = path.iter().rev();
    let (Some(name), Some(parent)) = (rev.next(), rev.next()) else {
        return Ok(());
    };
    match (parent.as_slice(), name.as_slice()) {
        (b"resourcetype", b"collection") => props.is_collection = true,
        (b"supported-calendar-component-set", b"comp") => {
            if let Ok(Some(attr)) = e.try_get_attribute("name") {
                let comp = std::str::from_utf8(&attr.value)
                    .map_err(|err| CalDavError::Xml(format!("UTF-8 error: {err}")))?
                    .to_ascii_uppercase();
                props
                    .supported_components
                    .get_or_insert_with(Vec::new)
                    .push(comp);
            }
        }
        _ => {}
    }
    Ok(())
}
