//! `cmdtree-demo`: a small program wired on `cmdtree-core`.
//!
//! Configuration comes from the environment (see [`config`]); logs go to
//! stderr so stdout only carries help and command output.

mod config;
mod demo;

use std::process::ExitCode;

use cmdtree_core::RunError;
use tracing::{debug, error};
use tracing_subscriber::fmt;

use crate::config::DemoConfig;

/// Exit code for an invalid command tree (`EX_SOFTWARE`).
const EXIT_INVALID_TREE: u8 = 70;

fn main() -> ExitCode {
    let config = match DemoConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(err.exit_code());
        }
    };

    let filter = match config.env_filter() {
        Ok(filter) => filter,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(err.exit_code());
        }
    };
    fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
    debug!(?config, "loaded configuration");

    let app = match demo::build_app(config.style()) {
        Ok(app) => app,
        Err(err) => {
            error!(%err, "invalid command tree");
            eprintln!("error: {err}");
            return ExitCode::from(EXIT_INVALID_TREE);
        }
    };

    match app.run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match &err {
                // Already reported as a one-line diagnostic.
                RunError::Resolve(_) => {}
                RunError::Action(source) => eprintln!("error: {source:#}"),
                RunError::Io(source) => eprintln!("error: {source}"),
            }
            ExitCode::from(err.exit_code())
        }
    }
}
