//! Hands off to the external chromedriver companion tool
//!
//! The companion installs a chromedriver matching the installed milestone.
//! Its outcome is logged but never verified and never changes the install's
//! exit status.

use std::process::Command;

pub fn install_matching_driver(major: u64, prefer_update: bool) {
    let program = if prefer_update {
        "chromedriver-update"
    } else {
        "chromedriver-install"
    };

    tracing::info!(program, major, "running chromedriver companion");

    match Command::new(program).arg(major.to_string()).status() {
        Ok(status) if status.success() => {
            tracing::info!("chromedriver companion finished");
        }
        Ok(status) => {
            tracing::warn!(%status, "chromedriver companion exited with failure");
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not run {program}");
        }
    }
}
