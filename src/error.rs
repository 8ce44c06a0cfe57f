//! Error taxonomy and process exit codes

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Everything that can stop an install run.
///
/// Resolution and probe failures carry their own exit codes so callers in
/// scripts can tell "this version is wrong" apart from "the network is down".
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unsupported chromium version {major}: {reason}")]
    UnsupportedVersion { major: u64, reason: String },

    #[error("version resolution failed: {0}")]
    Resolution(String),

    #[error("no downloadable snapshot found within {attempts} positions of {start}")]
    ProbeExhausted { start: u64, attempts: u32 },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl InstallError {
    pub(crate) fn filesystem(path: &Path, source: std::io::Error) -> Self {
        InstallError::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            InstallError::UnsupportedVersion { .. } => 2,
            InstallError::Resolution(_) => 3,
            InstallError::ProbeExhausted { .. } => 4,
            _ => 1,
        }
    }
}
