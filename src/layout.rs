use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

use crate::error::SyncError;

const SHAPE_ARCHIVE: &str = "cousub.zip";

#[derive(Debug, Clone)]
pub struct DataLayout {
    root: Utf8PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn raw_dir(&self) -> Utf8PathBuf {
        self.root.join("raw")
    }

    pub fn processed_dir(&self) -> Utf8PathBuf {
        self.root.join("processed")
    }

    pub fn external_dir(&self) -> Utf8PathBuf {
        self.root.join("external")
    }

    pub fn shape_archive_path(&self) -> Utf8PathBuf {
        self.external_dir().join(SHAPE_ARCHIVE)
    }

    pub fn ensure(&self) -> Result<(), SyncError> {
        for dir in [self.raw_dir(), self.processed_dir(), self.external_dir()] {
            if dir.as_std_path().exists() {
                continue;
            }
            fs::create_dir_all(dir.as_std_path())
                .map_err(|err| SyncError::Filesystem(format!("create {dir}: {err}")))?;
            info!(%dir, "created data directory");
        }
        Ok(())
    }
}
