//! Flatten route placemark XML into tabular output.
//!
//! Each `<Placemark>` becomes one row of a main CSV table; each `<ViaPoint>`
//! inside its `<RouteInfo>` becomes one row of an optional detail TSV table.

pub mod cli;
pub mod converter;
pub mod discovery;
pub mod error;
pub mod geo;
pub mod logging;
pub mod options;
pub mod parser;
pub mod pipeline;
pub mod route_types;
pub mod writer;

pub use cli::Cli;
pub use converter::{Conversion, flatten_document};
pub use error::{Result, RouteXmlError};
pub use options::ConvertOptions;
pub use parser::{decode_document, parse_routes};
pub use pipeline::{RunReport, process_file, run};

/// Parse and flatten an XML string in one step.
pub fn convert_str(xml: &str) -> Result<Conversion> {
    let doc = parse_routes(xml)?;
    flatten_document(&doc)
}
