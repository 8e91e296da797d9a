use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::metadata::ObjectKind;

pub type Result<T> = std::result::Result<T, ContentsError>;

#[derive(Debug, Error)]
pub enum ContentsError {
    /// The second token of the line is not one of `b c d e f v x l s`.
    #[error("Unknown filetype in line {line:?}")]
    UnknownFileType { line: String },

    /// The filetype was recognized, but the rest of the line does not fit its grammar.
    #[error("Could not parse line {line:?}")]
    UnparseableLine { line: String },

    /// The line is not valid UTF-8; `line` holds a lossy rendering of it.
    #[error("Line is not valid UTF-8: {line:?}")]
    InvalidEncoding {
        line: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("Ambiguous: entry lists {count} packages, expected exactly one")]
    AmbiguousPackageList { count: usize },

    #[error("Entry does not list any package")]
    MissingPackage,

    #[error("Unsupported file type `{kind}` at {}", path.display())]
    UnsupportedFileType { path: PathBuf, kind: ObjectKind },

    #[error("An I/O error has occurred while reading {}: {source}", path.display())]
    FailedToReadPath { path: PathBuf, source: io::Error },

    #[error("Failed to open file {}: {source}", path.display())]
    FailedToOpenFile { path: PathBuf, source: io::Error },

    #[error("Line {line_number}: an I/O error has occurred: {source}")]
    FailedToReadLine { line_number: u64, source: io::Error },

    #[error("Failed to parse line {line_number}, caused by:\n\t {source}")]
    FailedToParseLine {
        line_number: u64,
        #[source]
        source: Box<ContentsError>,
    },
}

impl ContentsError {
    /// The offending manifest line, for the parse failure kinds
    /// (looking through the line-number wrapper added by the reader).
    pub fn line(&self) -> Option<&str> {
        match self {
            ContentsError::UnknownFileType { line }
            | ContentsError::UnparseableLine { line }
            | ContentsError::InvalidEncoding { line, .. } => Some(line),
            ContentsError::FailedToParseLine { source, .. } => source.line(),
            _ => None,
        }
    }

    pub(crate) fn unknown_file_type(line: &str) -> Self {
        ContentsError::UnknownFileType {
            line: line.to_owned(),
        }
    }

    pub(crate) fn unparseable(line: &str) -> Self {
        ContentsError::UnparseableLine {
            line: line.to_owned(),
        }
    }

    pub(crate) fn read_path(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ContentsError::FailedToReadPath {
            path: path.into(),
            source,
        }
    }
}
