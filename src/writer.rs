//! Delimited table output for route and waypoint rows.
//!
//! Both tables are UTF-8 with a leading byte-order mark and CRLF line endings.
//! The main table quotes every field; the detail table is tab separated and
//! quotes only when a field needs it.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::converter::strip_line_breaks;
use crate::error::RouteXmlError;
use crate::route_types::{RouteRecord, WaypointRecord};

type Result<T> = std::result::Result<T, RouteXmlError>;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const MAIN_COLUMNS: [&str; 10] = [
    "name",
    "description",
    "CreationTimeUTC",
    "IsManuallyCorrected",
    "TotalDistanceKm",
    "RouteInfo_IgnoringRestrictions",
    "RouteInfo_MapCorrectionInfo_DatasetInfo_ImageInfo_ImageName",
    "RouteInfo_MapCorrectionInfo_DatasetInfo_ImageInfo_StartMapId",
    "RouteInfo_ViaPoints_NumVia",
    "RouteInfo_ViaPoints_ViaPoint",
];

pub const DETAIL_COLUMNS: [&str; 18] = [
    "placemark_index",
    "placemark_name",
    "seq",
    "Position",
    "Lat",
    "Lon",
    "GroupID",
    "Segment",
    "Heading",
    "Type",
    "LinkToGeom",
    "Direction",
    "TTSRemark",
    "WorkType",
    "MMRule",
    "ManeuverID",
    "ManeuverNumber",
    "IsDeadEnd",
];

/// Write the main table to `path`, creating parent directories.
pub fn write_main_table(path: &Path, routes: &[RouteRecord]) -> Result<()> {
    let file = create_output(path)?;
    write_main_rows(BufWriter::new(file), routes).map_err(|e| with_path(e, path))
}

/// Write the detail table to `path`, creating parent directories.
///
/// Nothing is created when `waypoints` is empty; returns whether the file was written.
pub fn write_detail_table(path: &Path, waypoints: &[WaypointRecord]) -> Result<bool> {
    if waypoints.is_empty() {
        return Ok(false);
    }
    let file = create_output(path)?;
    write_detail_rows(BufWriter::new(file), waypoints).map_err(|e| with_path(e, path))?;
    Ok(true)
}

/// Write the main table: every field quoted, quotes inside a field doubled.
///
/// There is no escape character, so backslashes (including the `\"` escapes in
/// the waypoint JSON) are written unchanged rather than doubled.
pub fn write_main_rows<W: Write>(mut out: W, routes: &[RouteRecord]) -> Result<()> {
    out.write_all(UTF8_BOM)
        .map_err(|e| RouteXmlError::io("<main table>", e))?;

    let mut writer = WriterBuilder::new()
        .delimiter(b',')
        .quote(b'"')
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::CRLF)
        .from_writer(out);

    writer.write_record(MAIN_COLUMNS)?;
    for route in routes {
        writer.write_record([
            route.name.as_str(),
            route.description.as_str(),
            route.creation_time_utc.as_str(),
            route.is_manually_corrected.as_str(),
            &format_float(route.total_distance_km),
            route.ignoring_restrictions.as_str(),
            route.image_name.as_str(),
            route.start_map_id.as_str(),
            &route.num_via.to_string(),
            &strip_line_breaks(&route.via_points_json),
        ])?;
    }
    writer
        .flush()
        .map_err(|e| RouteXmlError::io("<main table>", e))
}

pub fn write_detail_rows<W: Write>(mut out: W, waypoints: &[WaypointRecord]) -> Result<()> {
    out.write_all(UTF8_BOM)
        .map_err(|e| RouteXmlError::io("<detail table>", e))?;

    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .quote(b'"')
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::CRLF)
        .from_writer(out);

    writer.write_record(DETAIL_COLUMNS)?;
    for wp in waypoints {
        writer.write_record([
            wp.placemark_index.to_string().as_str(),
            &wp.placemark_name,
            &wp.seq.to_string(),
            &wp.position,
            &wp.lat.map(format_float).unwrap_or_default(),
            &wp.lon.map(format_float).unwrap_or_default(),
            &wp.group_id,
            &wp.segment,
            &wp.heading,
            &wp.via_type,
            &wp.link_to_geom,
            &wp.direction,
            &wp.tts_remark,
            &wp.work_type,
            &wp.mm_rule,
            &wp.maneuver_id,
            &wp.maneuver_number,
            &wp.is_dead_end,
        ])?;
    }
    writer
        .flush()
        .map_err(|e| RouteXmlError::io("<detail table>", e))
}

/// Shortest round-trip digits, always with a fractional part (`3.0`, `0.25`).
/// Magnitudes below `1e-4` or from `1e16` up use a signed two-digit exponent
/// (`1e-05`, `1.5e+16`); non-finite values print as `nan`, `inf` and `-inf`.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let exp_form = format!("{value:e}");
        return match exp_form.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{mantissa}e{sign}{digits:0>2}")
            }
            None => exp_form,
        };
    }

    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

fn create_output(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| RouteXmlError::io(parent, e))?;
    }
    File::create(path).map_err(|e| RouteXmlError::io(path, e))
}

/// Replace the placeholder path of a stream-level I/O error with the real one.
fn with_path(err: RouteXmlError, path: &Path) -> RouteXmlError {
    match err {
        RouteXmlError::Io { source, .. } => RouteXmlError::io(path, source),
        other => other,
    }
}
