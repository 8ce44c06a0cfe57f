//! HTTP access to the upstream snapshot and release endpoints

use std::io::Write;
use std::path::Path;

use futures_util::StreamExt;

use crate::error::InstallError;
use crate::platform::Platform;

/// Upstream URL templates, overridable so tests can point at a local server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Snapshot storage root, serves `<label>/LAST_CHANGE`.
    pub snapshots_base: String,
    /// Binary media endpoint, serves `<label>%2F<position>%2F<archive>`.
    pub media_base: String,
    /// Release list feed, parameterized by channel and platform.
    pub releases_base: String,
    /// Known-good-versions feed.
    pub known_good_versions: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            snapshots_base: "https://storage.googleapis.com/chromium-browser-snapshots".into(),
            media_base:
                "https://www.googleapis.com/download/storage/v1/b/chromium-browser-snapshots/o"
                    .into(),
            releases_base: "https://chromiumdash.appspot.com/fetch_releases".into(),
            known_good_versions:
                "https://googlechromelabs.github.io/chrome-for-testing/known-good-versions-with-downloads.json"
                    .into(),
        }
    }
}

impl Endpoints {
    pub fn last_change_url(&self, platform: Platform) -> String {
        format!(
            "{}/{}/LAST_CHANGE",
            self.snapshots_base,
            platform.spec().snapshot_label
        )
    }

    pub fn archive_url(&self, platform: Platform, position: u64) -> String {
        let spec = platform.spec();
        format!(
            "{}/{}%2F{}%2F{}?alt=media",
            self.media_base, spec.snapshot_label, position, spec.archive
        )
    }

    pub fn releases_url(&self, platform: Platform, channel: &str) -> String {
        format!(
            "{}?channel={}&platform={}",
            self.releases_base,
            capitalize(channel),
            platform.spec().feed_label
        )
    }
}

// The release feed wants "Stable" while cache keys stay lowercase.
fn capitalize(channel: &str) -> String {
    let mut chars = channel.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(proxy: Option<&str>, insecure: bool) -> Result<Self, InstallError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("chromium-install/", env!("CARGO_PKG_VERSION")));

        if let Some(proxy) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        if insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    pub async fn get_text(&self, url: &str) -> Result<String, InstallError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// HEAD-style existence probe. Anything other than 404 counts as "the
    /// artifact is there" - the snapshot index is loose about status codes.
    pub async fn exists(&self, url: &str) -> Result<bool, InstallError> {
        let response = self.client.head(url).send().await?;
        Ok(response.status() != reqwest::StatusCode::NOT_FOUND)
    }

    /// Stream a download straight to disk, reporting (downloaded, total)
    /// after each chunk.
    pub async fn download_to<F>(
        &self,
        url: &str,
        path: &Path,
        mut progress: F,
    ) -> Result<(), InstallError>
    where
        F: FnMut(u64, u64),
    {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let total = response.content_length().unwrap_or(0);

        let mut file =
            std::fs::File::create(path).map_err(|e| InstallError::filesystem(path, e))?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .map_err(|e| InstallError::filesystem(path, e))?;
            downloaded += chunk.len() as u64;
            progress(downloaded, total);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn archive_url_percent_encodes_the_object_name() {
        let endpoints = Endpoints::default();
        let url = endpoints.archive_url(Platform::Linux, 1148114);
        assert!(url.ends_with("/Linux_x64%2F1148114%2Fchrome-linux.zip?alt=media"));
    }

    #[test]
    fn releases_url_capitalizes_the_channel() {
        let endpoints = Endpoints::default();
        let url = endpoints.releases_url(Platform::MacArm, "stable");
        assert!(url.ends_with("?channel=Stable&platform=Mac"));
    }

    #[tokio::test]
    async fn exists_maps_not_found_to_false() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/present"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(None, false).unwrap();
        assert!(!fetcher.exists(&format!("{}/missing", server.uri())).await.unwrap());
        assert!(fetcher.exists(&format!("{}/present", server.uri())).await.unwrap());
    }

    #[tokio::test]
    async fn download_streams_bytes_and_reports_progress() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 2048]))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("archive.zip");
        let fetcher = Fetcher::new(None, false).unwrap();

        let mut last_seen = 0;
        fetcher
            .download_to(&server.uri(), &target, |done, _total| last_seen = done)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&target).unwrap().len(), 2048);
        assert_eq!(last_seen, 2048);
    }
}
