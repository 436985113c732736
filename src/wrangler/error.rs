use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline stage a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadPersonal,
    LoadBilling,
    LoadOffers,
    Merge,
    Reshape,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::LoadPersonal => write!(f, "load personal"),
            Stage::LoadBilling => write!(f, "load billing"),
            Stage::LoadOffers => write!(f, "load offers"),
            Stage::Merge => write!(f, "merge"),
            Stage::Reshape => write!(f, "reshape"),
            Stage::Write => write!(f, "write"),
        }
    }
}

/// Error type covering the different failure cases that can occur when the
/// tool loads, transforms, or emits customer data.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when a source file does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when a source is structurally malformed or lacks an expected field.
    #[error("failed to parse {source_name} source: {reason}")]
    Parse { source_name: String, reason: String },

    /// Raised when a timestamp cell cannot be interpreted.
    #[error("invalid timestamp '{value}' in column {column} for PID {pid}")]
    InvalidTimestamp {
        pid: String,
        column: String,
        value: String,
    },

    /// Raised when a stage needs a column the table does not carry.
    #[error("missing column '{0}'")]
    MissingColumn(String),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),

    /// Any of the above, tagged with the stage that produced it.
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    pub(crate) fn parse(source_name: &str, reason: impl fmt::Display) -> Self {
        PipelineError::Parse {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Returns the innermost error, looking through stage tags.
    pub fn root(&self) -> &PipelineError {
        match self {
            PipelineError::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Tags the error side of a result with the stage that produced it.
pub trait StageContext<T> {
    fn in_stage(self, stage: Stage) -> Result<T>;
}

impl<T> StageContext<T> for Result<T> {
    fn in_stage(self, stage: Stage) -> Result<T> {
        self.map_err(|err| PipelineError::Stage {
            stage,
            source: Box::new(err),
        })
    }
}
