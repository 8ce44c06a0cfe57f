//! Publishes a stable symlink to the installed executable
//!
//! The only non-fatal stage of the pipeline: a failed publish is reported
//! but leaves the install successful, since the extracted binary remains
//! usable by explicit path.

use std::path::{Path, PathBuf};

use crate::platform::Platform;

/// Mark the executable runnable and (re)point the well-known link at it.
/// Returns whether a link was published.
pub fn publish(executable: &Path, platform: Platform, link_override: Option<&Path>) -> bool {
    if let Err(e) = make_executable(executable) {
        tracing::warn!(error = %e, path = %executable.display(), "could not set execute permission");
    }

    let target = match link_override
        .map(Path::to_path_buf)
        .or_else(|| platform.spec().default_link.map(PathBuf::from))
    {
        Some(target) => target,
        None => {
            tracing::info!("no default link location for {platform}, skipping symlink");
            return false;
        }
    };

    match replace_link(executable, &target) {
        Ok(()) => {
            tracing::info!(link = %target.display(), "published symlink");
            true
        }
        Err(e) => {
            tracing::warn!(
                link = %target.display(),
                error = %e,
                "symlink publishing failed; run the executable directly from {}",
                executable.display()
            );
            false
        }
    }
}

fn make_executable(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

#[cfg(unix)]
fn replace_link(executable: &Path, target: &Path) -> std::io::Result<()> {
    let parent = target.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent)?;

    // rename() cannot replace a real directory, only files and links.
    if target.is_dir() && !target.is_symlink() {
        std::fs::remove_dir_all(target)?;
    }

    // Symlink to a temporary name first so the final step is an atomic rename
    // over whatever currently occupies the target path.
    let file_name = target
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("chromium");
    let staged = parent.join(format!(".{}.{}", file_name, std::process::id()));
    let _ = std::fs::remove_file(&staged);
    std::os::unix::fs::symlink(executable, &staged)?;
    std::fs::rename(&staged, target)?;

    Ok(())
}

#[cfg(not(unix))]
fn replace_link(executable: &Path, target: &Path) -> std::io::Result<()> {
    // Symlink creation needs elevated rights on Windows and there is no
    // atomic replacement, so this stays best-effort.
    if target.symlink_metadata().is_ok() {
        std::fs::remove_file(target)?;
    }
    std::os::windows::fs::symlink_file(executable, target)?;
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_executable(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        path
    }

    #[test]
    fn publishes_a_link_and_sets_execute_permission() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let exe = write_executable(tmp.path(), "115/chrome-linux/chrome");
        let link = tmp.path().join("bin/chromium");

        assert!(publish(&exe, Platform::Linux, Some(&link)));
        assert_eq!(std::fs::read_link(&link).unwrap(), exe);

        let mode = std::fs::metadata(&exe).unwrap().permissions().mode();
        assert_eq!(mode & 0o755, 0o755);
    }

    #[test]
    fn repoints_an_existing_link() {
        let tmp = TempDir::new().unwrap();
        let old = write_executable(tmp.path(), "114/chrome-linux/chrome");
        let new = write_executable(tmp.path(), "115/chrome-linux/chrome");
        let link = tmp.path().join("bin/chromium");

        assert!(publish(&old, Platform::Linux, Some(&link)));
        assert!(publish(&new, Platform::Linux, Some(&link)));
        assert_eq!(std::fs::read_link(&link).unwrap(), new);
    }

    #[test]
    fn missing_executable_still_attempts_the_link() {
        // chmod fails but publishing proceeds; the warning is the contract.
        let tmp = TempDir::new().unwrap();
        let exe = tmp.path().join("ghost/chrome");
        let link = tmp.path().join("bin/chromium");

        assert!(publish(&exe, Platform::Linux, Some(&link)));
        assert_eq!(std::fs::read_link(&link).unwrap(), exe);
    }
}
