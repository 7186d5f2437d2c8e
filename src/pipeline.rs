use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::converter::{Conversion, flatten_document};
use crate::discovery::collect_input_files;
use crate::error::{Result, RouteXmlError};
use crate::options::ConvertOptions;
use crate::parser::{decode_document, parse_routes};
use crate::route_types::{RouteRecord, WaypointRecord};
use crate::writer::{write_detail_table, write_main_table};

/// Outcome of a completed run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub files_processed: Vec<PathBuf>,
    pub files_skipped: Vec<PathBuf>,
    pub main_rows: usize,
    pub detail_rows: usize,
    /// Output files actually written, main table first.
    pub written: Vec<PathBuf>,
}

/// Read, decode, parse and flatten one input file.
pub fn process_file(path: &Path) -> Result<Conversion> {
    // The handle is closed by the time parsing starts.
    let bytes = fs::read(path).map_err(|e| RouteXmlError::io(path, e))?;
    let xml = decode_document(&bytes)?;
    let doc = parse_routes(&xml)?;
    debug!(path = %path.display(), placemarks = doc.placemarks.len(), "parsed file");
    flatten_document(&doc)
}

/// Discover inputs, convert them one at a time, then write the tables.
///
/// Unreadable or malformed files are skipped with a warning. The run fails if
/// nothing was found, if no main rows were produced, or if writing fails.
pub fn run(options: &ConvertOptions) -> Result<RunReport> {
    let files = collect_input_files(options)?;

    let mut report = RunReport::default();
    let mut routes: Vec<RouteRecord> = Vec::new();
    let mut waypoints: Vec<WaypointRecord> = Vec::new();

    for path in files {
        match process_file(&path) {
            Ok(conversion) => {
                routes.extend(conversion.routes);
                waypoints.extend(conversion.waypoints);
                report.files_processed.push(path);
            }
            Err(e) if e.is_recoverable() => {
                warn!(path = %path.display(), error = %e, "skipping unreadable input");
                report.files_skipped.push(path);
            }
            Err(e) => return Err(e),
        }
    }

    if routes.is_empty() {
        return Err(RouteXmlError::NoRows);
    }

    write_main_table(&options.output_csv, &routes)?;
    report.written.push(options.output_csv.clone());

    if let Some(detail_path) = &options.detail_tsv {
        if write_detail_table(detail_path, &waypoints)? {
            report.written.push(detail_path.clone());
        } else {
            debug!(path = %detail_path.display(), "no waypoints, detail table not written");
        }
    }

    report.main_rows = routes.len();
    report.detail_rows = waypoints.len();
    info!(
        processed = report.files_processed.len(),
        skipped = report.files_skipped.len(),
        routes = report.main_rows,
        waypoints = report.detail_rows,
        "conversion finished"
    );
    Ok(report)
}
