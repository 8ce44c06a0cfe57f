//! Snapshot archive download and extraction

use std::path::{Path, PathBuf};

use crate::error::InstallError;
use crate::fetch::{Endpoints, Fetcher};
use crate::platform::Platform;

#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    /// Download the archive again even when a cached copy exists.
    pub redownload: bool,
    /// Delete the archive after successful extraction.
    pub tidyup: bool,
}

pub struct Installer<'a> {
    fetcher: &'a Fetcher,
    endpoints: &'a Endpoints,
    downloads: PathBuf,
    base_path: PathBuf,
}

impl<'a> Installer<'a> {
    pub fn new(
        fetcher: &'a Fetcher,
        endpoints: &'a Endpoints,
        downloads: impl Into<PathBuf>,
        base_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            endpoints,
            downloads: downloads.into(),
            base_path: base_path.into(),
        }
    }

    /// Download (unless cached) and extract the snapshot at `position` into
    /// `<base_path>/<dir_name>`, returning the absolute executable path.
    /// Extraction overwrites in place, so re-running is idempotent.
    pub async fn install<F>(
        &self,
        platform: Platform,
        position: u64,
        dir_name: &str,
        opts: &InstallOptions,
        progress: F,
    ) -> Result<PathBuf, InstallError>
    where
        F: FnMut(u64, u64),
    {
        std::fs::create_dir_all(&self.downloads)
            .map_err(|e| InstallError::filesystem(&self.downloads, e))?;
        std::fs::create_dir_all(&self.base_path)
            .map_err(|e| InstallError::filesystem(&self.base_path, e))?;

        let archive_path = self.downloads.join(format!("chromium.{position}.zip"));

        if archive_path.exists() && !opts.redownload {
            tracing::info!(path = %archive_path.display(), "using cached snapshot archive");
        } else {
            let url = self.endpoints.archive_url(platform, position);
            tracing::info!(%url, "downloading snapshot archive");
            self.fetcher.download_to(&url, &archive_path, progress).await?;
        }

        let install_dir = self.base_path.join(dir_name);
        extract_zip(&archive_path, &install_dir)?;

        if opts.tidyup {
            std::fs::remove_file(&archive_path)
                .map_err(|e| InstallError::filesystem(&archive_path, e))?;
            tracing::info!(path = %archive_path.display(), "removed archive after extraction");
        }

        let executable = install_dir.join(platform.spec().executable);
        if !executable.exists() {
            return Err(InstallError::Extraction(format!(
                "executable {} missing after extraction (unexpected archive layout)",
                executable.display()
            )));
        }

        executable
            .canonicalize()
            .map_err(|e| InstallError::filesystem(&executable, e))
    }
}

fn extract_zip(archive_path: &Path, dest: &Path) -> Result<(), InstallError> {
    let file =
        std::fs::File::open(archive_path).map_err(|e| InstallError::filesystem(archive_path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| {
        InstallError::Extraction(format!("cannot read {}: {e}", archive_path.display()))
    })?;

    tracing::info!(
        entries = archive.len(),
        dest = %dest.display(),
        "extracting snapshot archive"
    );

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| InstallError::Extraction(e.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let output_path = dest.join(&name);

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| InstallError::filesystem(parent, e))?;
        }

        let mut output = std::fs::File::create(&output_path)
            .map_err(|e| InstallError::filesystem(&output_path, e))?;
        std::io::copy(&mut entry, &mut output)
            .map_err(|e| InstallError::Extraction(format!("failed extracting {name}: {e}")))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&output_path, std::fs::Permissions::from_mode(mode))
                .map_err(|e| InstallError::filesystem(&output_path, e))?;
        }
    }

    Ok(())
}
