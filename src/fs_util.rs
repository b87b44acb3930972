use std::fs;
use std::io::{self, Read};
use std::path::Path;

use zip::ZipArchive;

use crate::error::SyncError;

pub fn read_zip_member(zip_path: &Path, extension: &str) -> Result<Vec<u8>, SyncError> {
    let file = fs::File::open(zip_path)
        .map_err(|err| SyncError::Filesystem(format!("open zip {}: {err}", zip_path.display())))?;
    let mut archive = ZipArchive::new(file).map_err(|err| SyncError::Archive(err.to_string()))?;

    let suffix = format!(".{}", extension.to_ascii_lowercase());
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| SyncError::Archive(err.to_string()))?;
        if entry.is_dir() || entry.enclosed_name().is_none() {
            continue;
        }
        if !entry.name().to_ascii_lowercase().ends_with(&suffix) {
            continue;
        }
        let mut buffer = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buffer)
            .map_err(|err| SyncError::Archive(err.to_string()))?;
        return Ok(buffer);
    }
    Err(SyncError::Archive(format!(
        "no *{suffix} member in {}",
        zip_path.display()
    )))
}

pub fn validate_zip(zip_path: &Path) -> Result<(), SyncError> {
    let file = fs::File::open(zip_path)
        .map_err(|err| SyncError::Filesystem(format!("open zip {}: {err}", zip_path.display())))?;
    let mut archive = ZipArchive::new(file).map_err(|err| SyncError::Archive(err.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| SyncError::Archive(err.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        io::copy(&mut entry, &mut io::sink()).map_err(|err| SyncError::Archive(err.to_string()))?;
    }
    Ok(())
}
