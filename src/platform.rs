//! Host platform detection and the platform mapping table

use std::fmt;

use crate::error::InstallError;

/// The set of platforms with published snapshot builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacIntel,
    MacArm,
    Windows,
}

/// Per-platform upstream labels and archive layout.
///
/// `snapshot_label` names the snapshot storage folder, `feed_label` the
/// platform string used by the release feed. `default_link` is None where no
/// sensible system-wide symlink location exists.
#[derive(Debug)]
pub struct PlatformSpec {
    pub snapshot_label: &'static str,
    pub feed_label: &'static str,
    pub archive: &'static str,
    pub executable: &'static str,
    pub default_link: Option<&'static str>,
}

const LINUX: PlatformSpec = PlatformSpec {
    snapshot_label: "Linux_x64",
    feed_label: "Linux",
    archive: "chrome-linux.zip",
    executable: "chrome-linux/chrome",
    default_link: Some("/usr/local/bin/chromium"),
};

const MAC_INTEL: PlatformSpec = PlatformSpec {
    snapshot_label: "Mac",
    feed_label: "Mac",
    archive: "chrome-mac.zip",
    executable: "chrome-mac/Chromium.app/Contents/MacOS/Chromium",
    default_link: Some("/usr/local/bin/chromium"),
};

const MAC_ARM: PlatformSpec = PlatformSpec {
    snapshot_label: "Mac_Arm",
    feed_label: "Mac",
    archive: "chrome-mac.zip",
    executable: "chrome-mac/Chromium.app/Contents/MacOS/Chromium",
    default_link: Some("/usr/local/bin/chromium"),
};

const WINDOWS: PlatformSpec = PlatformSpec {
    snapshot_label: "Win_x64",
    feed_label: "Windows",
    archive: "chrome-win.zip",
    executable: "chrome-win/chrome.exe",
    // Symlinks need elevated rights on Windows; publishing is best-effort only.
    default_link: None,
};

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Linux,
        Platform::MacIntel,
        Platform::MacArm,
        Platform::Windows,
    ];

    /// Map the running host to a supported platform. Unrecognised unix hosts
    /// fall back to Linux rather than failing.
    pub fn detect() -> Platform {
        match (std::env::consts::OS, std::env::consts::ARCH) {
            ("windows", _) => Platform::Windows,
            ("macos", "aarch64") => Platform::MacArm,
            ("macos", _) => Platform::MacIntel,
            _ => Platform::Linux,
        }
    }

    pub fn spec(self) -> &'static PlatformSpec {
        match self {
            Platform::Linux => &LINUX,
            Platform::MacIntel => &MAC_INTEL,
            Platform::MacArm => &MAC_ARM,
            Platform::Windows => &WINDOWS,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Linux => "linux",
            Platform::MacIntel => "mac-intel",
            Platform::MacArm => "mac-arm",
            Platform::Windows => "windows",
        };
        f.write_str(name)
    }
}

/// Fail fast on an incomplete mapping row before any network or disk work.
pub fn validate_platform_table() -> Result<(), InstallError> {
    for platform in Platform::ALL {
        let spec = platform.spec();
        if spec.snapshot_label.is_empty()
            || spec.feed_label.is_empty()
            || spec.archive.is_empty()
            || spec.executable.is_empty()
        {
            return Err(InstallError::Configuration(format!(
                "incomplete mapping for platform {platform}"
            )));
        }
    }
    Ok(())
}
