use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use reqwest::Url;

use crate::foundation::error::{PlayerError, PlayerResult};

/// Byte-level access to manifest, frame, archive and audio resources.
///
/// Implementations report plain [`anyhow::Error`]s; callers classify them into the stage-specific
/// [`PlayerError`] variant.
#[async_trait::async_trait]
pub trait AssetSource: Send + Sync {
    /// Fetch the full body behind `url`.
    async fn fetch(&self, url: &Url) -> anyhow::Result<Bytes>;
}

/// HTTP(S) source backed by a shared [`reqwest::Client`].
#[derive(Clone, Debug)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    /// Build a source whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> PlayerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl AssetSource for HttpSource {
    async fn fetch(&self, url: &Url) -> anyhow::Result<Bytes> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("request failed: {url}"))?
            .error_for_status()
            .with_context(|| format!("request returned error: {url}"))?;
        resp.bytes()
            .await
            .with_context(|| format!("read body from {url}"))
    }
}

/// Local filesystem source for `file://` URLs.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileSource;

#[async_trait::async_trait]
impl AssetSource for FileSource {
    async fn fetch(&self, url: &Url) -> anyhow::Result<Bytes> {
        let path = url
            .to_file_path()
            .map_err(|_| anyhow::anyhow!("not a local file url: {url}"))?;
        let data = tokio::fs::read(&path)
            .await
            .with_context(|| format!("read '{}'", path.display()))?;
        Ok(Bytes::from(data))
    }
}

/// Scheme-dispatching source: `http`/`https` go to [`HttpSource`], `file` to [`FileSource`].
#[derive(Clone, Debug)]
pub struct DefaultSource {
    http: HttpSource,
    file: FileSource,
}

impl DefaultSource {
    /// Build with the given HTTP request timeout.
    pub fn new(timeout: Duration) -> PlayerResult<Self> {
        Ok(Self {
            http: HttpSource::new(timeout)?,
            file: FileSource,
        })
    }
}

#[async_trait::async_trait]
impl AssetSource for DefaultSource {
    async fn fetch(&self, url: &Url) -> anyhow::Result<Bytes> {
        match url.scheme() {
            "http" | "https" => self.http.fetch(url).await,
            "file" => self.file.fetch(url).await,
            other => anyhow::bail!("unsupported url scheme '{other}' in {url}"),
        }
    }
}

/// Parse a manifest location given as a URL or a filesystem path.
///
/// Anything that does not parse as an absolute URL is treated as a path, made absolute against the
/// current directory, and turned into a `file://` URL.
pub fn parse_location(location: &str) -> PlayerResult<Url> {
    let location = location.trim();
    if location.is_empty() {
        return Err(PlayerError::manifest("manifest url must be non-empty"));
    }
    if let Ok(url) = Url::parse(location)
        && url.scheme().len() > 1
    {
        return Ok(url);
    }

    let abs = std::path::absolute(location)
        .with_context(|| format!("resolve manifest path '{location}'"))?;
    Url::from_file_path(&abs).map_err(|_| {
        PlayerError::manifest(format!(
            "manifest path '{}' cannot be expressed as a file url",
            abs.display()
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
