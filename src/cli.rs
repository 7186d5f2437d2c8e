use std::path::PathBuf;

use clap::Parser;

use crate::options::{ConvertOptions, DEFAULT_PATTERN};

/// Convert route XML files into a main CSV table and an optional per-waypoint TSV table
#[derive(Parser, Debug, Clone)]
#[command(name = "routexml2csv")]
#[command(version)]
pub struct Cli {
    /// Input files or glob patterns (e.g. 'routes/*.xml'); may be repeated
    #[arg(value_name = "INPUT")]
    pub input: Vec<String>,

    /// Main table destination (UTF-8 with BOM, every field quoted)
    #[arg(short = 'o', long = "output-csv", value_name = "PATH")]
    pub output_csv: PathBuf,

    /// Detail table destination, one row per ViaPoint (tab separated)
    #[arg(long = "detail-tsv", value_name = "PATH")]
    pub detail_tsv: Option<PathBuf>,

    /// Directory to scan for additional input files
    #[arg(long = "dir", value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// File-name pattern used with --dir
    #[arg(long = "pattern", value_name = "GLOB", default_value = DEFAULT_PATTERN)]
    pub pattern: String,

    /// Scan subdirectories of --dir as well
    #[arg(long = "recursive")]
    pub recursive: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl From<&Cli> for ConvertOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            inputs: cli.input.clone(),
            dir: cli.dir.clone(),
            pattern: cli.pattern.clone(),
            recursive: cli.recursive,
            output_csv: cli.output_csv.clone(),
            detail_tsv: cli.detail_tsv.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_cli_parsing() {
        let cli = Cli::try_parse_from(["routexml2csv", "a.xml", "b/*.xml", "-o", "out.csv"]).unwrap();
        assert_eq!(cli.input, vec!["a.xml", "b/*.xml"]);
        assert_eq!(cli.output_csv, PathBuf::from("out.csv"));
        assert_eq!(cli.pattern, "*.xml");
        assert!(!cli.recursive);
        assert!(cli.detail_tsv.is_none());
    }

    #[test]
    fn test_output_csv_is_required() {
        assert!(Cli::try_parse_from(["routexml2csv", "a.xml"]).is_err());
    }

    #[test]
    fn test_directory_options() {
        let cli = Cli::try_parse_from([
            "routexml2csv",
            "--output-csv",
            "out.csv",
            "--detail-tsv",
            "detail.tsv",
            "--dir",
            "routes",
            "--pattern",
            "*.kml",
            "--recursive",
        ])
        .unwrap();

        let options = ConvertOptions::from(&cli);
        assert!(options.inputs.is_empty());
        assert_eq!(options.dir, Some(PathBuf::from("routes")));
        assert_eq!(options.pattern, "*.kml");
        assert!(options.recursive);
        assert_eq!(options.detail_tsv, Some(PathBuf::from("detail.tsv")));
    }
}
