use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use tracing::{debug, warn};

use crate::error::RouteXmlError;
use crate::geo::{path_length_km, round_to};
use crate::route_types::*;

type Result<T> = std::result::Result<T, RouteXmlError>;

/// Main and detail rows produced from one document.
#[derive(Debug, Default)]
pub struct Conversion {
    pub routes: Vec<RouteRecord>,
    pub waypoints: Vec<WaypointRecord>,
}

/// Flatten parsed placemarks into main rows and per-waypoint detail rows.
///
/// Placemarks are numbered from 1 in document order; detail rows carry that
/// number so they can be joined back to their route.
pub fn flatten_document(doc: &RouteDocument) -> Result<Conversion> {
    let mut conversion = Conversion::default();

    for (offset, placemark) in doc.placemarks.iter().enumerate() {
        let route = flatten_placemark(offset + 1, placemark, &mut conversion.waypoints)?;
        conversion.routes.push(route);
    }

    debug!(
        routes = conversion.routes.len(),
        waypoints = conversion.waypoints.len(),
        "flattened document"
    );
    Ok(conversion)
}

fn flatten_placemark(
    index: usize,
    pm: &Placemark,
    details: &mut Vec<WaypointRecord>,
) -> Result<RouteRecord> {
    let name = text_or_empty(&pm.name);
    let description = text_or_empty(&pm.description);
    let creation_time_utc = text_or_empty(&pm.creation_time_utc);
    let is_manually_corrected = text_or_empty(&pm.is_manually_corrected);

    let Some(info) = &pm.route_info else {
        return Ok(RouteRecord {
            name,
            description,
            creation_time_utc,
            is_manually_corrected,
            total_distance_km: 0.0,
            ignoring_restrictions: String::new(),
            image_name: String::new(),
            start_map_id: String::new(),
            num_via: 0,
            via_points_json: "[]".to_string(),
        });
    };

    let waypoints = flatten_via_points(index, &name, &info.via_points);
    let coords: Vec<(f64, f64)> = waypoints
        .iter()
        .filter_map(|wp| wp.lat.zip(wp.lon))
        .collect();
    let total_distance_km = round_to(path_length_km(&coords), 6);
    let via_points_json = summary_json(&waypoints)?;
    let declared = info
        .num_via
        .as_deref()
        .and_then(|text| text.parse::<i64>().ok())
        .unwrap_or(0);
    let num_via = effective_num_via(declared, waypoints.len(), &name);

    details.extend(waypoints);

    Ok(RouteRecord {
        name,
        description,
        creation_time_utc,
        is_manually_corrected,
        total_distance_km,
        ignoring_restrictions: text_or_empty(&info.ignoring_restrictions),
        image_name: text_or_empty(&info.image_name),
        start_map_id: text_or_empty(&info.start_map_id),
        num_via,
        via_points_json,
    })
}

fn flatten_via_points(
    placemark_index: usize,
    placemark_name: &str,
    points: &[ViaPoint],
) -> Vec<WaypointRecord> {
    points
        .iter()
        .enumerate()
        .map(|(offset, vp)| {
            let position = text_or_empty(&vp.position);
            let coords = parse_position(&position);
            WaypointRecord {
                placemark_index,
                placemark_name: placemark_name.to_string(),
                seq: offset + 1,
                lat: coords.map(|(lat, _)| lat),
                lon: coords.map(|(_, lon)| lon),
                position,
                group_id: text_or_empty(&vp.group_id),
                segment: text_or_empty(&vp.segment),
                heading: text_or_empty(&vp.heading),
                via_type: text_or_empty(&vp.via_type),
                link_to_geom: text_or_empty(&vp.link_to_geom),
                direction: text_or_empty(&vp.direction),
                tts_remark: text_or_empty(&vp.tts_remark),
                work_type: text_or_empty(&vp.work_type),
                mm_rule: text_or_empty(&vp.mm_rule),
                maneuver_id: text_or_empty(&vp.maneuver_id),
                maneuver_number: text_or_empty(&vp.maneuver_number),
                is_dead_end: text_or_empty(&vp.is_dead_end),
            }
        })
        .collect()
}

/// Parse `"lon, lat"` position text into `(lat, lon)`.
///
/// Anything other than exactly two numeric comma-separated tokens gives `None`.
pub fn parse_position(text: &str) -> Option<(f64, f64)> {
    let mut parts = text.split(',').map(str::trim);
    let (lon, lat) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    Some((lat.parse().ok()?, lon.parse().ok()?))
}

/// The declared count wins unless it is zero.
fn effective_num_via(declared: i64, actual: usize, route_name: &str) -> i64 {
    if declared == 0 {
        return actual as i64;
    }
    if declared != actual as i64 {
        warn!(
            route = route_name,
            declared,
            actual,
            "NumVia does not match the number of ViaPoint elements"
        );
    }
    declared
}

/// Serialize waypoint summaries as a single-line JSON array.
fn summary_json(waypoints: &[WaypointRecord]) -> Result<String> {
    let summaries: Vec<WaypointSummary<'_>> =
        waypoints.iter().map(WaypointSummary::from).collect();

    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, SpacedFormatter);
    summaries.serialize(&mut serializer)?;

    Ok(strip_line_breaks(&String::from_utf8_lossy(&buf)))
}

/// Remove every CR and LF character.
pub fn strip_line_breaks(text: &str) -> String {
    text.replace(['\r', '\n'], "")
}

fn text_or_empty(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Compact JSON with `", "` between items and `": "` after keys.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}
