pub mod error;
pub mod io;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod transform;

pub use error::{PipelineError, Result};
