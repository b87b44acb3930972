use std::io::{Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::census::http_client;
use crate::error::SyncError;

const CHUNK_SIZE: usize = 10 * 1024 * 1024;

pub trait FileDownloader {
    fn download(&self, url: &str, destination: &Path) -> Result<(), SyncError>;
}

#[derive(Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new(timeout: Duration, verify_tls: bool) -> Result<Self, SyncError> {
        Ok(Self {
            client: http_client(timeout, verify_tls)?,
        })
    }
}

impl FileDownloader for HttpDownloader {
    fn download(&self, url: &str, destination: &Path) -> Result<(), SyncError> {
        info!(%url, destination = %destination.display(), "started download");
        let start = Instant::now();
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|err| SyncError::Transport(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "download failed".to_string());
            return Err(SyncError::TransportStatus { status, message });
        }
        let total = response.content_length();

        let parent = destination
            .parent()
            .ok_or_else(|| SyncError::Filesystem("invalid destination path".to_string()))?;
        std::fs::create_dir_all(parent).map_err(|err| SyncError::Filesystem(err.to_string()))?;
        let mut temp = tempfile::Builder::new()
            .prefix("census-sync-download")
            .tempfile_in(parent)
            .map_err(|err| SyncError::Filesystem(err.to_string()))?;

        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut written = 0u64;
        loop {
            let read = response
                .read(&mut buffer)
                .map_err(|err| SyncError::Transport(err.to_string()))?;
            if read == 0 {
                break;
            }
            temp.write_all(&buffer[..read])
                .map_err(|err| SyncError::Filesystem(err.to_string()))?;
            written += read as u64;
            debug!(bytes = written, total = ?total, "download progress");
        }
        temp.flush()
            .map_err(|err| SyncError::Filesystem(err.to_string()))?;
        temp.persist(destination)
            .map_err(|err| SyncError::Filesystem(err.to_string()))?;

        info!(
            destination = %destination.display(),
            bytes = written,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "finished download"
        );
        Ok(())
    }
}
