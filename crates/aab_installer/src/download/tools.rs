//! Fetch-once acquisition of bundletool and Android platform-tools

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use super::archive::unzip;
use super::http::{DownloadProgress, Downloader};
use crate::config::{Settings, ToolPaths};
use crate::error::{InstallerError, Result};

/// Makes sure the external tools exist under the working directory
#[derive(Debug, Clone)]
pub struct ToolFetcher {
    paths: ToolPaths,
    settings: Settings,
    downloader: Downloader,
}

impl ToolFetcher {
    pub fn new(paths: ToolPaths, settings: Settings, downloader: Downloader) -> Self {
        Self {
            paths,
            settings,
            downloader,
        }
    }

    pub fn paths(&self) -> &ToolPaths {
        &self.paths
    }

    /// Return the bundletool jar, downloading it on first use
    pub async fn ensure_bundletool(&self, progress: &mut dyn DownloadProgress) -> Result<PathBuf> {
        let jar = self.paths.bundletool_jar();
        fs::create_dir_all(self.paths.bundletool_dir()).await?;

        if fs::try_exists(&jar).await? {
            return Ok(jar);
        }

        let url = self.settings.bundletool_url();
        self.downloader.download(&url, &jar, progress).await?;
        info!("Download bundletool success!");
        Ok(jar)
    }

    /// Return the adb binary, downloading and extracting platform-tools on first use
    pub async fn ensure_platform_tools(
        &self,
        progress: &mut dyn DownloadProgress,
    ) -> Result<PathBuf> {
        let adb = self.paths.adb();
        if fs::try_exists(&adb).await? {
            return Ok(adb);
        }

        self.remove_stale_platform_tools().await?;

        fs::create_dir_all(self.paths.home()).await?;
        let archive = self.paths.platform_tools_zip();
        let url = self.settings.platform_tools_url(self.paths.os());
        self.downloader.download(&url, &archive, progress).await?;
        info!("Download android platform-tool success!");

        self.install_platform_tools(&archive).await
    }

    /// Drop a platform-tools directory that has no adb in it
    async fn remove_stale_platform_tools(&self) -> Result<()> {
        let tools_dir = self.paths.platform_tools_dir();
        if fs::try_exists(&tools_dir).await? {
            warn!(
                "{} exists without {}, fetching platform-tools again",
                tools_dir.display(),
                self.paths.os().adb_binary_name()
            );
            fs::remove_dir_all(&tools_dir).await?;
        }
        Ok(())
    }

    /// Extract a downloaded platform-tools archive into the home directory and
    /// delete it; fails when the archive did not provide adb
    async fn install_platform_tools(&self, archive: &Path) -> Result<PathBuf> {
        // The archive's top-level folder is `platform-tools/`
        let extracted = unzip(archive, self.paths.home()).await;
        fs::remove_file(archive).await.ok();
        extracted?;

        let adb = self.paths.adb();
        if !fs::try_exists(&adb).await? {
            return Err(InstallerError::ToolNotFound(format!(
                "adb not found in {}",
                self.paths.platform_tools_dir().display()
            )));
        }
        Ok(adb)
    }
}
