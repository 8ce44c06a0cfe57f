//! Month-bucketed cache for upstream metadata payloads
//!
//! The release feeds are large and change slowly, so lookups are memoized to
//! disk per calendar month. A new month means a new file name, which is the
//! only invalidation mechanism.

use std::future::Future;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::InstallError;

/// The coarse time bucket used in cache file names.
pub fn month_bucket(now: DateTime<Utc>) -> String {
    now.format("%Y-%m").to_string()
}

pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Read-through lookup: a hit returns the stored payload, a miss runs
    /// `fetch` and persists its result. Read-then-write, last writer wins;
    /// invocations are one-shot and human-triggered so no locking is done.
    pub async fn get<F, Fut>(&self, file_name: &str, fetch: F) -> Result<String, InstallError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, InstallError>>,
    {
        let path = self.dir.join(file_name);

        if path.exists() {
            tracing::debug!(path = %path.display(), "metadata cache hit");
            return std::fs::read_to_string(&path).map_err(|e| InstallError::filesystem(&path, e));
        }

        let payload = fetch().await?;

        std::fs::create_dir_all(&self.dir).map_err(|e| InstallError::filesystem(&self.dir, e))?;
        std::fs::write(&path, &payload).map_err(|e| InstallError::filesystem(&path, e))?;
        tracing::debug!(path = %path.display(), "cached upstream payload");

        Ok(payload)
    }
}
