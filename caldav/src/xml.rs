// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! XML utilities for WebDAV/CalDAV processing.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::CalDavError;

/// XML namespaces used in `CalDAV`.
pub mod ns {
    /// `WebDAV` namespace.
    pub const DAV: &str = "DAV:";

    /// `CalDAV` namespace.
    pub const CALDAV: &str = "urn:ietf:params:xml:ns:caldav";
}

/// Reads the text content of the element whose start tag was just consumed,
/// up to and including its end tag.
///
/// Text split around entity references and CDATA sections is joined, and
/// nested elements contribute their text too. The result is trimmed.
///
/// # Errors
///
/// Returns an error if XML parsing fails or the document ends early.
pub fn read_element_text(reader: &mut Reader<&[u8]>) -> Result<String, CalDavError> {
    let mut text = String::new();
    let mut depth = 0_usize;

    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Text(e) => text.push_str(&e.decode().map_err(quick_xml::Error::from)?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e.into_inner())),
            Event::GeneralRef(e) => {
                let name = std::str::from_utf8(&e)
                    .map_err(|err| CalDavError::Xml(format!("UTF-8 error: {err}")))?;
                text.push(resolve_entity(name)?);
            }
            Event::Eof => return Err(CalDavError::Xml("Unexpected EOF".to_string())),
            _ => {}
        }
    }

    Ok(text.trim().to_string())
}

/// Resolves a predefined XML entity or a numeric character reference.
fn resolve_entity(name: &str) -> Result<char, CalDavError> {
    let resolved = match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => name.strip_prefix('#').and_then(|num| {
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }),
    };
    resolved.ok_or_else(|| CalDavError::Xml(format!("Unknown entity: &{name};")))
}
