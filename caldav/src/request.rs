// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Request builders for `CalDAV` operations.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::error::CalDavError;
use crate::xml::ns;

/// PROPFIND request builder.
#[derive(Debug)]
pub struct PropFindRequest {
    props: Vec<Prop>,
}

/// Properties to request in PROPFIND or REPORT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prop {
    /// Display name.
    DisplayName,
    /// Resource type.
    ResourceType,
    /// `ETag`.
    GetETag,
    /// Last modification time.
    GetLastModified,
    /// Calendar data.
    CalendarData,
    /// Supported calendar components.
    SupportedCalendarComponents,
}

impl Prop {
    const fn name(self) -> &'static str {
        match self {
            Self::DisplayName => "displayname",
            Self::ResourceType => "resourcetype",
            Self::GetETag => "getetag",
            Self::GetLastModified => "getlastmodified",
            Self::CalendarData => "calendar-data",
            Self::SupportedCalendarComponents => "supported-calendar-component-set",
        }
    }

    const fn is_caldav(self) -> bool {
        match self {
            Self::DisplayName | Self::ResourceType | Self::GetETag | Self::GetLastModified => false,
            Self::CalendarData | Self::SupportedCalendarComponents => true,
        }
    }

    fn write<W: std::io::Write>(self, writer: &mut Writer<W>) -> Result<(), CalDavError> {
        let prefix = if self.is_caldav() { "C" } else { "D" };
        let tag = format!("{prefix}:{}", self.name());
        writer.write_event(Event::Empty(BytesStart::new(tag)))?;
        Ok(())
    }
}

impl PropFindRequest {
    /// Creates a new PROPFIND request.
    #[must_use]
    pub fn new() -> Self {
        Self { props: Vec::new() }
    }

    /// Adds a property to the request.
    pub fn add_property(&mut self, prop: Prop) -> &mut Self {
        self.props.push(prop);
        self
    }

    /// Builds the XML body for the PROPFIND request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, CalDavError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        // <D:propfind xmlns:D="DAV:">
        let mut propfind = BytesStart::new("D:propfind");
        propfind.push_attribute(("xmlns:D", ns::DAV));
        if self.props.iter().any(|p| p.is_caldav()) {
            propfind.push_attribute(("xmlns:C", ns::CALDAV));
        }
        writer.write_event(Event::Start(propfind))?;

        writer.write_event(Event::Start(BytesStart::new("D:prop")))?;
        for prop in &self.props {
            prop.write(&mut writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new("D:prop")))?;

        writer.write_event(Event::End(BytesEnd::new("D:propfind")))?;

        let bytes = writer.into_inner().into_inner();
        String::from_utf8(bytes).map_err(|e| CalDavError::Xml(format!("UTF-8 error: {e}")))
    }
}

impl Default for PropFindRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Calendar query (REPORT) request builder.
#[derive(Debug)]
pub struct CalendarQueryRequest {
    props: Vec<Prop>,
    component: Option<String>,
}

impl CalendarQueryRequest {
    /// Creates a calendar query requesting `ETag`, last-modified and calendar data.
    #[must_use]
    pub fn new() -> Self {
        Self {
            props: vec![Prop::GetETag, Prop::GetLastModified, Prop::CalendarData],
            component: None,
        }
    }

    /// Sets the component filter (VTODO, VEVENT, etc.).
    #[must_use]
    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Builds the XML body for the calendar query request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, CalDavError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        // <C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
        let mut calendar_query = BytesStart::new("C:calendar-query");
        calendar_query.push_attribute(("xmlns:D", ns::DAV));
        calendar_query.push_attribute(("xmlns:C", ns::CALDAV));
        writer.write_event(Event::Start(calendar_query))?;

        writer.write_event(Event::Start(BytesStart::new("D:prop")))?;
        for prop in &self.props {
            prop.write(&mut writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new("D:prop")))?;

        // <C:filter><C:comp-filter name="VCALENDAR">
        writer.write_event(Event::Start(BytesStart::new("C:filter")))?;
        let mut comp_filter = BytesStart::new("C:comp-filter");
        comp_filter.push_attribute(("name", "VCALENDAR"));
        writer.write_event(Event::Start(comp_filter))?;

        if let Some(component) = &self.component {
            let mut inner = BytesStart::new("C:comp-filter");
            inner.push_attribute(("name", component.as_str()));
            writer.write_event(Event::Empty(inner))?;
        }

        writer.write_event(Event::End(BytesEnd::new("C:comp-filter")))?;
        writer.write_event(Event::End(BytesEnd::new("C:filter")))?;

        writer.write_event(Event::End(BytesEnd::new("C:calendar-query")))?;

        let bytes = writer.into_inner().into_inner();
        String::from_utf8(bytes).map_err(|e| CalDavError::Xml(format!("UTF-8 error: {e}")))
    }
}

impl Default for CalendarQueryRequest {
    fn default() -> Self {
        Self::new()
    }
}
