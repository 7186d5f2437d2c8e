use std::path::PathBuf;

/// Options for one conversion run.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Explicit file paths or glob patterns, expanded in order
    pub inputs: Vec<String>,

    /// Directory to scan in addition to `inputs`
    pub dir: Option<PathBuf>,

    /// File-name pattern used for the `dir` scan (default: `*.xml`)
    pub pattern: String,

    /// Scan subdirectories of `dir` too (default: false)
    pub recursive: bool,

    /// Destination of the main table
    pub output_csv: PathBuf,

    /// Destination of the detail table; `None` skips it
    pub detail_tsv: Option<PathBuf>,
}

pub const DEFAULT_PATTERN: &str = "*.xml";

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            dir: None,
            pattern: DEFAULT_PATTERN.to_string(),
            recursive: false,
            output_csv: PathBuf::from("routes.csv"),
            detail_tsv: None,
        }
    }
}
