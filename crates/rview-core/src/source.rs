#![forbid(unsafe_code)]

//! Where category data files come from.
//!
//! [`ProblemSource`] abstracts the fetch so the store does not care whether
//! payloads are read from a directory or requested over HTTP.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use tracing::debug;

use crate::model::Payload;

/// Failure to obtain a category's payload.
#[derive(Debug)]
pub enum LoadError {
    /// Reading a local file failed.
    Io(std::io::Error),
    /// The HTTP request itself failed.
    Http(reqwest::Error),
    /// The server answered with a non-success status.
    Status(u16),
    /// The body is not JSON.
    Json(serde_json::Error),
    /// A load for this store is already in flight.
    AlreadyLoading,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read data: {err}"),
            Self::Http(err) => write!(f, "failed to fetch data: {err}"),
            Self::Status(status) => write!(f, "failed to load data ({status})"),
            Self::Json(err) => write!(f, "invalid data: {err}"),
            Self::AlreadyLoading => f.write_str("a load is already in progress"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Http(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Status(_) | Self::AlreadyLoading => None,
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<reqwest::Error> for LoadError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// A provider of category payloads, addressed by resource path
/// (e.g. `./examples_panic.json`).
#[async_trait]
pub trait ProblemSource: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Payload, LoadError>;
}

/// Strip the page-relative `./` prefix from a resource path.
fn relative(path: &str) -> &str {
    path.trim_start_matches("./").trim_start_matches('/')
}

// ---------------------------------------------------------------------------
// FileSource
// ---------------------------------------------------------------------------

/// Reads payloads from a directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(relative(path))
    }
}

#[async_trait]
impl ProblemSource for FileSource {
    async fn fetch(&self, path: &str) -> Result<Payload, LoadError> {
        let file = self.resolve(path);
        debug!(path = %file.display(), "reading payload");
        let bytes = tokio::fs::read(&file).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

// ---------------------------------------------------------------------------
// HttpSource
// ---------------------------------------------------------------------------

/// Requests payloads from a base URL, bypassing caches.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), relative(path))
    }
}

#[async_trait]
impl ProblemSource for HttpSource {
    async fn fetch(&self, path: &str) -> Result<Payload, LoadError> {
        let url = self.url_for(path);
        debug!(%url, "requesting payload");
        let response = self
            .client
            .get(&url)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
