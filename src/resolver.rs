//! Version resolution against the upstream release metadata
//!
//! Turns a human version request into a concrete four-part version and then
//! into an approximate snapshot build position. The known-good-versions feed
//! orders releases by an internal `revision` field; "most recent" always means
//! the greatest revision, never version-string comparison.

use std::path::PathBuf;

use chrono::Utc;
use serde::Deserialize;

use crate::cache::{month_bucket, CacheStore};
use crate::error::InstallError;
use crate::fetch::{Endpoints, Fetcher};
use crate::platform::Platform;

pub const MIN_SUPPORTED_MAJOR: u64 = 78;

/// Majors that break the position lookup upstream. 82 was never released as
/// stable and has no usable release metadata.
pub const BLACKLISTED_MAJORS: &[u64] = &[82];

/// Trim a version string to at most four numeric dot-separated components.
/// Shorter inputs pass through unchanged; the operation is idempotent.
pub fn normalize(input: &str) -> Result<String, InstallError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InstallError::Resolution("empty version string".into()));
    }

    let mut parts = Vec::new();
    for part in trimmed.split('.').take(4) {
        part.parse::<u64>().map_err(|_| {
            InstallError::Resolution(format!(
                "invalid version component {part:?} in {trimmed:?}"
            ))
        })?;
        parts.push(part);
    }
    Ok(parts.join("."))
}

pub fn major_of(version: &str) -> Result<u64, InstallError> {
    version
        .split('.')
        .next()
        .unwrap_or_default()
        .parse()
        .map_err(|_| {
            InstallError::Resolution(format!("cannot read major version from {version:?}"))
        })
}

/// Guard against majors that cannot be installed. Runs before any network
/// call whenever the request carries a major version.
pub fn check_supported(major: u64) -> Result<(), InstallError> {
    if major < MIN_SUPPORTED_MAJOR {
        return Err(InstallError::UnsupportedVersion {
            major,
            reason: format!("versions below {MIN_SUPPORTED_MAJOR} are not supported"),
        });
    }
    if BLACKLISTED_MAJORS.contains(&major) {
        return Err(InstallError::UnsupportedVersion {
            major,
            reason: "known to break the snapshot position lookup".into(),
        });
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct KnownGoodFeed {
    versions: Vec<KnownGoodVersion>,
}

/// One entry of the known-good-versions feed. `revision` is the feed's
/// internal ordering field.
#[derive(Debug, Clone, Deserialize)]
pub struct KnownGoodVersion {
    pub version: String,
    pub revision: String,
}

impl KnownGoodVersion {
    fn revision_num(&self) -> Option<u64> {
        self.revision.parse().ok()
    }
}

/// One entry of the release list feed.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseRecord {
    pub version: String,
    pub milestone: u64,
    #[serde(default)]
    pub chromium_main_branch_position: Option<u64>,
    pub platform: String,
    pub channel: String,
}

pub struct Resolver<'a> {
    fetcher: &'a Fetcher,
    endpoints: &'a Endpoints,
    cache: CacheStore,
}

impl<'a> Resolver<'a> {
    pub fn new(
        fetcher: &'a Fetcher,
        endpoints: &'a Endpoints,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            endpoints,
            cache: CacheStore::new(cache_dir),
        }
    }

    /// Resolve a requested version string to a concrete four-part version.
    ///
    /// Empty input takes the latest known-good release. A full four-part
    /// version is used verbatim. A partial version is matched against the
    /// feed by major and the entry with the greatest revision wins.
    pub async fn resolve(&self, requested: Option<&str>) -> Result<String, InstallError> {
        let requested = requested.map(str::trim).filter(|s| !s.is_empty());

        let resolved = match requested {
            None => self.latest_known_good().await?,
            Some(raw) => {
                let normalized = normalize(raw)?;
                let major = major_of(&normalized)?;
                check_supported(major)?;

                if normalized.split('.').count() >= 4 {
                    normalized
                } else {
                    self.best_match_for_major(major).await?
                }
            }
        };

        check_supported(major_of(&resolved)?)?;
        tracing::info!(version = %resolved, "resolved requested version");
        Ok(resolved)
    }

    /// The approximate build position for a major release: the first release
    /// feed entry whose milestone matches and carries a position.
    pub async fn main_branch_position(
        &self,
        major: u64,
        platform: Platform,
        channel: &str,
    ) -> Result<u64, InstallError> {
        let file_name = format!(
            "{platform}-{channel}-{}-chromium-releases.json",
            month_bucket(Utc::now())
        );
        let url = self.endpoints.releases_url(platform, channel);
        let fetcher = self.fetcher;
        let payload = self
            .cache
            .get(&file_name, || async move { fetcher.get_text(&url).await })
            .await?;

        let releases: Vec<ReleaseRecord> = serde_json::from_str(&payload)
            .map_err(|e| InstallError::Resolution(format!("malformed release feed: {e}")))?;

        let record = releases
            .iter()
            .find(|r| r.milestone == major && r.chromium_main_branch_position.is_some())
            .ok_or_else(|| {
                InstallError::Resolution(format!(
                    "no {channel} release with a build position found for milestone {major}"
                ))
            })?;

        tracing::debug!(
            version = %record.version,
            platform = %record.platform,
            channel = %record.channel,
            "matched release record"
        );
        record.chromium_main_branch_position.ok_or_else(|| {
            InstallError::Resolution(format!("release record for milestone {major} has no position"))
        })
    }

    /// The newest snapshot position, straight from the LAST_CHANGE endpoint.
    pub async fn last_change_position(&self, platform: Platform) -> Result<u64, InstallError> {
        let url = self.endpoints.last_change_url(platform);
        let text = self.fetcher.get_text(&url).await?;
        text.trim().parse().map_err(|_| {
            InstallError::Resolution(format!("unexpected LAST_CHANGE payload {:?}", text.trim()))
        })
    }

    async fn latest_known_good(&self) -> Result<String, InstallError> {
        let versions = self.known_good_versions().await?;
        let latest = versions
            .iter()
            .filter_map(|v| v.revision_num().map(|r| (r, v)))
            .max_by_key(|(revision, _)| *revision)
            .map(|(_, v)| v.version.clone())
            .ok_or_else(|| {
                InstallError::Resolution("known-good-versions feed is empty".into())
            })?;
        normalize(&latest)
    }

    async fn best_match_for_major(&self, major: u64) -> Result<String, InstallError> {
        let versions = self.known_good_versions().await?;
        let best = versions
            .iter()
            .filter(|v| major_of(&v.version).ok() == Some(major))
            .filter_map(|v| v.revision_num().map(|r| (r, v)))
            .max_by_key(|(revision, _)| *revision)
            .map(|(_, v)| v.version.clone())
            .ok_or_else(|| {
                InstallError::Resolution(format!(
                    "no known-good release found for major version {major}"
                ))
            })?;
        normalize(&best)
    }

    async fn known_good_versions(&self) -> Result<Vec<KnownGoodVersion>, InstallError> {
        let file_name = format!(
            "known-good-versions-with-downloads.json-{}.json",
            month_bucket(Utc::now())
        );
        let url = self.endpoints.known_good_versions.clone();
        let fetcher = self.fetcher;
        let payload = self
            .cache
            .get(&file_name, || async move { fetcher.get_text(&url).await })
            .await?;

        let feed: KnownGoodFeed = serde_json::from_str(&payload).map_err(|e| {
            InstallError::Resolution(format!("malformed known-good-versions feed: {e}"))
        })?;
        Ok(feed.versions)
    }
}
