use thiserror::Error;

use std::{io, path::PathBuf};

/// Errors produced by the report pipeline.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The input file is missing or unreadable.
    #[error("cannot read input file {path}: {source}")]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A required column is absent, or a non-empty field could not be parsed
    /// as a date or number.
    #[error("bad input data: {0}")]
    DataFormat(String),

    /// An output file or directory could not be written.
    #[error("cannot write output {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A workbook construction error from the xlsx writer.
    #[error("workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
}

impl ReportError {
    pub(crate) fn output_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::OutputWrite {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
