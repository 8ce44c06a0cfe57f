//! chromium-install - resolve, download and install Chromium snapshot builds
//!
//! Resolves a requested version against the upstream release metadata, walks
//! the snapshot index forward to a downloadable build position, extracts the
//! archive into a version-named directory and publishes a stable symlink to
//! the executable.

mod cache;
mod cli;
mod config;
mod driver;
mod error;
mod fetch;
mod installer;
mod linker;
mod platform;
mod prober;
mod resolver;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::InstallError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    if let Err(err) = cli::run(cli).await {
        eprintln!("Error: {err:#}");
        let code = err
            .downcast_ref::<InstallError>()
            .map(InstallError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}
