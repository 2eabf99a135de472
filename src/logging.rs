//! Tracing setup. Logs go to stderr so command output on stdout stays clean.
//!
//!   tally -v ...                 # debug logging
//!   RUST_LOG=tally=trace tally   # fine-grained control, overrides everything

use tracing_subscriber::EnvFilter;

use crate::error::{Result, TallyError};

/// `RUST_LOG` wins; otherwise `debug` when verbose, else the configured level.
pub fn init_tracing(verbose: bool, default_level: &str) -> Result<()> {
    let fallback = if verbose { "debug" } else { default_level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .compact()
        .try_init()
        .map_err(|e| TallyError::Other(format!("failed to initialise logging: {e}")))
}
