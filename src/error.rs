use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteXmlError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("Unexpected end of document inside <{element}>")]
    UnexpectedEof { element: &'static str },

    #[error("Document has no root element")]
    EmptyDocument,

    #[error("Undefined entity reference &{name};")]
    UndefinedEntity { name: String },

    #[error("Content found outside the root element")]
    ContentOutsideRoot,

    #[error("No input XML files found (check the file names, patterns or --dir)")]
    NoInput,

    #[error("No route rows were produced from the input files")]
    NoRows,

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RouteXmlError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether a failure on one input file should skip that file instead of
    /// aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::XmlParse(_)
                | Self::UnexpectedEof { .. }
                | Self::EmptyDocument
                | Self::UndefinedEntity { .. }
                | Self::ContentOutsideRoot
        )
    }
}

pub type Result<T> = std::result::Result<T, RouteXmlError>;
