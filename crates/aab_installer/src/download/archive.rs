//! Zip extraction for downloaded tool archives

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

use crate::error::{InstallerError, Result};

fn extract_all(zip_path: &Path, destination: &Path) -> Result<usize> {
    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(file)?;
    fs::create_dir_all(destination)?;
    // Entry paths are sanitised and unix modes restored by the zip crate
    archive.extract(destination)?;
    Ok(archive.len())
}

/// Extract every entry of `zip_path` into `destination`
pub async fn unzip(zip_path: &Path, destination: &Path) -> Result<()> {
    let zip_path: PathBuf = zip_path.to_path_buf();
    let target: PathBuf = destination.to_path_buf();

    let entries = tokio::task::spawn_blocking(move || extract_all(&zip_path, &target))
        .await
        .map_err(|e| InstallerError::CommandFailed(format!("unzip task failed: {}", e)))??;

    debug!("Extracted {} entries into {}", entries, destination.display());
    Ok(())
}

/// Writes a miniature platform-tools archive; `adb` is left out when `with_adb` is false
#[cfg(test)]
pub(crate) fn write_platform_tools_zip(path: &Path, with_adb: bool) {
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    zip.add_directory("platform-tools/", SimpleFileOptions::default())
        .unwrap();
    if with_adb {
        zip.start_file(
            "platform-tools/adb",
            SimpleFileOptions::default().unix_permissions(0o755),
        )
        .unwrap();
        zip.write_all(b"#!/bin/sh\necho adb\n").unwrap();
    }
    zip.start_file("platform-tools/NOTICE.txt", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"notice").unwrap();
    zip.finish().unwrap();
}
