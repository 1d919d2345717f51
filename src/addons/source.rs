//! Source reader for addon manifests.
//!
//! Resolves HTTP(S) URLs, `file://` URLs and bare paths to raw bytes.

use super::error::ImportError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// User agent sent with remote fetches.
const USER_AGENT: &str = concat!("addon-import/", env!("CARGO_PKG_VERSION"));

/// Where a source descriptor points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// HTTP or HTTPS URL.
    Remote(Url),
    /// Absolute local file path.
    Local(PathBuf),
}

impl SourceLocation {
    /// Classifies a source descriptor.
    ///
    /// Only `http`, `https` and `file` count as URL schemes. Anything else,
    /// including `C:\...` which parses with scheme `c`, is a bare path and is
    /// made absolute against the working directory.
    pub fn parse(source: &str) -> Result<Self, ImportError> {
        if let Ok(url) = Url::parse(source) {
            match url.scheme() {
                "http" | "https" => return Ok(Self::Remote(url)),
                "file" => {
                    let path = url.to_file_path().map_err(|()| {
                        ImportError::fetch(source, "file URL does not name a local path")
                    })?;
                    return Ok(Self::Local(path));
                }
                _ => {}
            }
        }

        let path = std::path::absolute(Path::new(source))
            .map_err(|e| ImportError::fetch(source, e))?;
        Ok(Self::Local(path))
    }
}

/// Blocking reader shared by every source in a batch.
#[derive(Debug)]
pub struct SourceReader {
    /// HTTP client with the fetch timeout applied.
    client: reqwest::blocking::Client,
}

impl SourceReader {
    /// Creates a reader whose network fetches give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());

        Self { client }
    }

    /// Reads the raw bytes behind `source`.
    pub fn read(&self, source: &str) -> Result<Vec<u8>, ImportError> {
        let location = SourceLocation::parse(source)?;

        match location {
            SourceLocation::Remote(url) => self.read_remote(source, url),
            SourceLocation::Local(path) => {
                debug!("[ADDON-IMPORT] Reading local file {}", path.display());
                fs::read(&path).map_err(|e| ImportError::fetch(source, e))
            }
        }
    }

    /// Performs the HTTP GET. Non-success statuses are failures.
    fn read_remote(&self, source: &str, url: Url) -> Result<Vec<u8>, ImportError> {
        info!("[ADDON-IMPORT] GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| ImportError::fetch(source, e))?;

        let bytes = response
            .bytes()
            .map_err(|e| ImportError::fetch(source, e))?;

        debug!("[ADDON-IMPORT] Received {} bytes from {}", bytes.len(), source);
        Ok(bytes.to_vec())
    }
}
