//! CLI command dispatch and handlers.
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod simulate;
pub mod validate;

use crate::cli::args::{Cli, Commands};
use crate::error::ProgressionError;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub fn dispatch(cli: Cli) -> Result<(), ProgressionError> {
    match cli.command {
        Commands::Simulate(args) => simulate::run(&args),
        Commands::Validate(args) => validate::run(&args),
    }
}
