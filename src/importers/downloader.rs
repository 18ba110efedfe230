use reqwest::Client;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("File not found (404): {0}")]
    NotFound(String),

    #[error("Server error (5xx): {0}")]
    ServerError(String),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// HTTP downloader for raw dataset files
#[derive(Clone)]
pub struct RawFileDownloader {
    client: Client,
}

impl RawFileDownloader {
    pub fn new(timeout: Duration) -> Result<Self, DownloadError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Fetch `url` into memory
    pub async fn download_bytes(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        debug!("GET {url}");
        let response = self.client.get(url).send().await?;

        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await?;
            debug!("Downloaded {url} ({} bytes)", bytes.len());
            Ok(bytes.to_vec())
        } else if status.as_u16() == 404 {
            Err(DownloadError::NotFound(format!("{url} not found on server")))
        } else if status.is_server_error() {
            Err(DownloadError::ServerError(format!(
                "Server error {status} while downloading {url}"
            )))
        } else {
            Err(response
                .error_for_status()
                .err()
                .map(DownloadError::HttpError)
                .unwrap_or_else(|| DownloadError::ServerError(format!("Unexpected status {status}"))))
        }
    }

    /// Fetch `url` and write it to `dest`, creating parent directories
    ///
    /// The body goes to a temp file next to `dest` that is renamed into place
    /// once fully written, so `dest` either holds the whole file or does not
    /// exist.
    pub async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        info!("Downloading {} -> {}", url, dest.display());
        let bytes = self.download_bytes(url).await?;

        let write_err = |source: std::io::Error| DownloadError::Write {
            path: dest.display().to_string(),
            source,
        };
        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(write_err)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(&bytes).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(dest).map_err(|e| write_err(e.error))?;

        info!("Saved {} bytes to {}", bytes.len(), dest.display());
        Ok(bytes.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downloader_builds_with_timeout() {
        assert!(RawFileDownloader::new(Duration::from_secs(5)).is_ok());
    }
}
