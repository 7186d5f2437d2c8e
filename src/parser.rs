use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::encoding::{EncodingError, decode, detect_encoding};
use quick_xml::events::{BytesRef, BytesStart, Event};

use crate::error::RouteXmlError;
use crate::route_types::*;

type Result<T> = std::result::Result<T, RouteXmlError>;

/// Elements between `<MapCorrectionInfo>` and the image leaves.
const IMAGE_INFO_PATH: [&[u8]; 2] = [b"DatasetInfo", b"ImageInfo"];

/// Decode raw file bytes into document text.
///
/// A byte-order mark (UTF-8 or UTF-16) decides the encoding; otherwise the
/// encoding named in the XML declaration is used, and UTF-8 when there is none.
pub fn decode_document(bytes: &[u8]) -> Result<Cow<'_, str>> {
    let decoded = match detect_encoding(bytes) {
        Some((encoding, bom_len)) if bom_len > 0 || !encoding.is_ascii_compatible() => {
            decode(&bytes[bom_len..], encoding)
        }
        _ => {
            let declared = match Reader::from_reader(bytes).read_event() {
                Ok(Event::Decl(decl)) => decl.encoder(),
                _ => None,
            };
            match declared {
                // A UTF-16 label on ASCII-compatible bytes means UTF-8.
                Some(encoding) => decode(bytes, encoding.output_encoding()),
                None => std::str::from_utf8(bytes)
                    .map(Cow::Borrowed)
                    .map_err(EncodingError::from),
            }
        }
    };
    decoded.map_err(|e| RouteXmlError::XmlParse(e.into()))
}

/// Parse a route XML string into a RouteDocument.
///
/// Every `<Placemark>` is collected in document order (depth-first), wherever
/// it sits in the tree, including inside another Placemark. Elements are
/// matched by local name so namespaced documents parse the same as plain ones.
pub fn parse_routes(xml: &str) -> Result<RouteDocument> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut reader = Reader::from_str(xml);
    let mut doc = RouteDocument::default();
    let mut open_elements = 0usize;
    let mut saw_root = false;

    loop {
        let top_level = open_elements == 0;
        match next_event(&mut reader)? {
            Event::Start(_) | Event::Empty(_) if top_level && saw_root => {
                return Err(RouteXmlError::ContentOutsideRoot);
            }
            Event::Text(e) if top_level && !e.iter().all(u8::is_ascii_whitespace) => {
                return Err(RouteXmlError::ContentOutsideRoot);
            }
            Event::CData(_) | Event::GeneralRef(_) if top_level => {
                return Err(RouteXmlError::ContentOutsideRoot);
            }
            Event::Start(e) => {
                saw_root = true;
                if is_placemark(&e) {
                    parse_placemark(&mut reader, &mut doc.placemarks)?;
                } else {
                    open_elements += 1;
                }
            }
            Event::Empty(e) => {
                saw_root = true;
                if is_placemark(&e) {
                    doc.placemarks.push(Placemark::default());
                }
            }
            Event::End(_) => open_elements = open_elements.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(RouteXmlError::EmptyDocument);
    }
    if open_elements > 0 {
        return Err(RouteXmlError::UnexpectedEof {
            element: "document",
        });
    }

    Ok(doc)
}

/// Normalize XML text: CR, LF and TAB become spaces, the ends are trimmed and
/// inner whitespace runs collapse to a single space.
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Read the next event, rejecting references to entities XML does not predefine.
fn next_event<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Event<'a>> {
    let event = reader.read_event()?;
    if let Event::GeneralRef(r) = &event {
        resolve_reference(r)?;
    }
    Ok(event)
}

fn resolve_reference(r: &BytesRef<'_>) -> Result<char> {
    if let Some(ch) = r.resolve_char_ref()? {
        return Ok(ch);
    }
    match &**r {
        b"amp" => Ok('&'),
        b"lt" => Ok('<'),
        b"gt" => Ok('>'),
        b"quot" => Ok('"'),
        b"apos" => Ok('\''),
        other => Err(RouteXmlError::UndefinedEntity {
            name: String::from_utf8_lossy(other).into_owned(),
        }),
    }
}

fn is_placemark(e: &BytesStart<'_>) -> bool {
    e.local_name().as_ref() == b"Placemark"
}

/// Parse a <Placemark> element into `found`.
/// Called after receiving Event::Start for the placemark.
///
/// The placemark lands at the position it had when it opened, so placemarks
/// nested inside it follow it.
fn parse_placemark<'a>(reader: &mut Reader<&'a [u8]>, found: &mut Vec<Placemark>) -> Result<()> {
    let index = found.len();
    let mut placemark = Placemark::default();

    loop {
        match next_event(reader)? {
            Event::Start(e) => {
                if let Some(slot) = placemark.field_mut(e.local_name().as_ref()) {
                    read_field(reader, slot, found)?;
                } else if e.local_name().as_ref() == b"RouteInfo"
                    && placemark.route_info.is_none()
                {
                    placemark.route_info = Some(parse_route_info(reader, found)?);
                } else if is_placemark(&e) {
                    parse_placemark(reader, found)?;
                } else {
                    skip_element(reader, found)?;
                }
            }
            Event::Empty(e) => {
                if let Some(slot) = placemark.field_mut(e.local_name().as_ref()) {
                    slot.get_or_insert_with(String::new);
                } else if e.local_name().as_ref() == b"RouteInfo" {
                    placemark.route_info.get_or_insert_with(RouteInfo::default);
                } else if is_placemark(&e) {
                    found.push(Placemark::default());
                }
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(RouteXmlError::UnexpectedEof {
                    element: "Placemark",
                });
            }
            _ => {}
        }
    }

    found.insert(index, placemark);
    Ok(())
}

/// Parse a <RouteInfo> element.
fn parse_route_info<'a>(
    reader: &mut Reader<&'a [u8]>,
    found: &mut Vec<Placemark>,
) -> Result<RouteInfo> {
    let mut info = RouteInfo::default();
    let mut seen_via_points = false;

    loop {
        match next_event(reader)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"IgnoringRestrictions" => {
                    read_field(reader, &mut info.ignoring_restrictions, found)?
                }
                b"MapCorrectionInfo" => {
                    parse_image_info(reader, &IMAGE_INFO_PATH, &mut info, found)?
                }
                b"ViaPoints" => {
                    // Only the first container contributes waypoints.
                    parse_via_points(reader, &mut info, !seen_via_points, found)?;
                    seen_via_points = true;
                }
                b"Placemark" => parse_placemark(reader, found)?,
                _ => skip_element(reader, found)?,
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"IgnoringRestrictions" => {
                    info.ignoring_restrictions.get_or_insert_with(String::new);
                }
                b"ViaPoints" => seen_via_points = true,
                b"Placemark" => found.push(Placemark::default()),
                _ => {}
            },
            Event::End(_) => break,
            Event::Eof => {
                return Err(RouteXmlError::UnexpectedEof {
                    element: "RouteInfo",
                });
            }
            _ => {}
        }
    }

    Ok(info)
}

/// Descend `MapCorrectionInfo/DatasetInfo/ImageInfo` and read the image leaves.
/// `path` holds the element names still to descend through.
fn parse_image_info<'a>(
    reader: &mut Reader<&'a [u8]>,
    path: &[&[u8]],
    info: &mut RouteInfo,
    found: &mut Vec<Placemark>,
) -> Result<()> {
    loop {
        match next_event(reader)? {
            Event::Start(e) if is_placemark(&e) => parse_placemark(reader, found)?,
            Event::Start(e) => match path.split_first() {
                Some((next, rest)) if e.local_name().as_ref() == *next => {
                    parse_image_info(reader, rest, info, found)?
                }
                None => match e.local_name().as_ref() {
                    b"ImageName" => read_field(reader, &mut info.image_name, found)?,
                    b"StartMapId" => read_field(reader, &mut info.start_map_id, found)?,
                    _ => skip_element(reader, found)?,
                },
                _ => skip_element(reader, found)?,
            },
            Event::Empty(e) if is_placemark(&e) => found.push(Placemark::default()),
            Event::Empty(e) if path.is_empty() => match e.local_name().as_ref() {
                b"ImageName" => {
                    info.image_name.get_or_insert_with(String::new);
                }
                b"StartMapId" => {
                    info.start_map_id.get_or_insert_with(String::new);
                }
                _ => {}
            },
            Event::End(_) => break,
            Event::Eof => {
                return Err(RouteXmlError::UnexpectedEof {
                    element: "MapCorrectionInfo",
                });
            }
            _ => {}
        }
    }

    Ok(())
}

/// Parse a <ViaPoints> container. Waypoints are pushed only when `collect` is set.
fn parse_via_points<'a>(
    reader: &mut Reader<&'a [u8]>,
    info: &mut RouteInfo,
    collect: bool,
    found: &mut Vec<Placemark>,
) -> Result<()> {
    loop {
        match next_event(reader)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"NumVia" => read_field(reader, &mut info.num_via, found)?,
                b"ViaPoint" if collect => info.via_points.push(parse_via_point(reader, found)?),
                b"Placemark" => parse_placemark(reader, found)?,
                _ => skip_element(reader, found)?,
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"NumVia" => {
                    info.num_via.get_or_insert_with(String::new);
                }
                b"ViaPoint" if collect => info.via_points.push(ViaPoint::default()),
                b"Placemark" => found.push(Placemark::default()),
                _ => {}
            },
            Event::End(_) => break,
            Event::Eof => {
                return Err(RouteXmlError::UnexpectedEof {
                    element: "ViaPoints",
                });
            }
            _ => {}
        }
    }

    Ok(())
}

/// Parse a <ViaPoint> element.
fn parse_via_point<'a>(
    reader: &mut Reader<&'a [u8]>,
    found: &mut Vec<Placemark>,
) -> Result<ViaPoint> {
    let mut point = ViaPoint::default();

    loop {
        match next_event(reader)? {
            Event::Start(e) => {
                if let Some(slot) = point.field_mut(e.local_name().as_ref()) {
                    read_field(reader, slot, found)?;
                } else if is_placemark(&e) {
                    parse_placemark(reader, found)?;
                } else {
                    skip_element(reader, found)?;
                }
            }
            Event::Empty(e) => {
                if let Some(slot) = point.field_mut(e.local_name().as_ref()) {
                    slot.get_or_insert_with(String::new);
                } else if is_placemark(&e) {
                    found.push(Placemark::default());
                }
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(RouteXmlError::UnexpectedEof {
                    element: "ViaPoint",
                });
            }
            _ => {}
        }
    }

    Ok(point)
}

/// Read a leaf element into `slot` unless an earlier sibling already filled it.
fn read_field<'a>(
    reader: &mut Reader<&'a [u8]>,
    slot: &mut Option<String>,
    found: &mut Vec<Placemark>,
) -> Result<()> {
    let text = read_leading_text(reader, found)?;
    if slot.is_none() {
        *slot = Some(clean_text(&text));
    }
    Ok(())
}

/// Consume the rest of the open element, still collecting any Placemark inside it.
fn skip_element<'a>(reader: &mut Reader<&'a [u8]>, found: &mut Vec<Placemark>) -> Result<()> {
    let mut depth = 0usize;

    loop {
        match next_event(reader)? {
            Event::Start(e) if is_placemark(&e) => parse_placemark(reader, found)?,
            Event::Start(_) => depth += 1,
            Event::Empty(e) if is_placemark(&e) => found.push(Placemark::default()),
            Event::End(_) if depth == 0 => return Ok(()),
            Event::End(_) => depth -= 1,
            Event::Eof => {
                return Err(RouteXmlError::UnexpectedEof { element: "element" });
            }
            _ => {}
        }
    }
}

/// Read the text that precedes the first child element, consuming the element
/// through its end tag.
/// Handles regular text, CDATA sections, and entity references (Event::GeneralRef).
fn read_leading_text<'a>(
    reader: &mut Reader<&'a [u8]>,
    found: &mut Vec<Placemark>,
) -> Result<String> {
    let mut text = String::new();

    loop {
        match next_event(reader)? {
            Event::Text(e) => {
                let raw = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                text.push_str(raw);
            }
            Event::CData(e) => {
                let s = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                text.push_str(s);
            }
            Event::GeneralRef(e) => text.push(resolve_reference(&e)?),
            Event::Start(e) => {
                if is_placemark(&e) {
                    parse_placemark(reader, found)?;
                } else {
                    skip_element(reader, found)?;
                }
                skip_element(reader, found)?;
                break;
            }
            Event::Empty(e) => {
                if is_placemark(&e) {
                    found.push(Placemark::default());
                }
                skip_element(reader, found)?;
                break;
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(RouteXmlError::UnexpectedEof {
                    element: "text element",
                });
            }
            _ => {}
        }
    }

    Ok(text)
}
