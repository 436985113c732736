use tracing_subscriber::EnvFilter;

use crate::wrangler::error::{PipelineError, Result};

/// Installs the global stderr subscriber. `RUST_LOG` takes precedence over
/// the level picked by `verbose`.
pub fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| PipelineError::Logging(err.to_string()))
}
