//! Source loaders and the report writer.

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::Path;

use crate::wrangler::error::{PipelineError, Result};

pub mod billing;
pub mod excel_write;
pub mod offers;
pub mod personal;

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| missing_or_io(path, err))
}

fn open_source(path: &Path) -> Result<File> {
    File::open(path).map_err(|err| missing_or_io(path, err))
}

fn missing_or_io(path: &Path, err: std::io::Error) -> PipelineError {
    if err.kind() == ErrorKind::NotFound {
        PipelineError::MissingInput(path.to_path_buf())
    } else {
        PipelineError::Io(err)
    }
}
