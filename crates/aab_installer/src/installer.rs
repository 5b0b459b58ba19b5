//! The install pipeline: sign, build, (re)install, launch and follow logs

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::adb::AdbClient;
use crate::bundletool::Bundletool;
use crate::config::Settings;
use crate::download::{DownloadProgress, ToolFetcher};
use crate::error::{InstallerError, Result};
use crate::keystore::{KeystoreConfig, KeystoreStore, Prompter};
use crate::process::{ctrl_c, sleep_or_interrupt};

/// What to install and which optional steps to run
#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub aab: PathBuf,
    pub keystore: PathBuf,
    /// Uninstall the existing package before installing
    pub replace: bool,
    pub launch: bool,
    /// Follow logcat after launching; ignored when `launch` is false
    pub stream_logs: bool,
}

impl InstallRequest {
    pub fn new(aab: impl Into<PathBuf>, keystore: impl Into<PathBuf>) -> Self {
        Self {
            aab: aab.into(),
            keystore: keystore.into(),
            replace: false,
            launch: true,
            stream_logs: true,
        }
    }

    pub fn with_replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    pub fn with_launch(mut self, launch: bool) -> Self {
        self.launch = launch;
        self
    }

    pub fn with_stream_logs(mut self, stream_logs: bool) -> Self {
        self.stream_logs = stream_logs;
        self
    }
}

/// Options that shape how the tools are invoked
#[derive(Debug, Clone, Default)]
pub struct InstallerOptions {
    pub device_id: Option<String>,
    /// Java executable; `java` from PATH when unset
    pub java: Option<PathBuf>,
}

/// Drives bundletool and adb through one install
#[derive(Debug, Clone)]
pub struct Installer {
    bundletool: Bundletool,
    adb: AdbClient,
    store: KeystoreStore,
    launch_wait: Duration,
}

impl Installer {
    pub fn new(
        bundletool: Bundletool,
        adb: AdbClient,
        store: KeystoreStore,
        launch_wait: Duration,
    ) -> Self {
        Self {
            bundletool,
            adb,
            store,
            launch_wait,
        }
    }

    /// Acquire bundletool, then platform-tools, and wire an installer around them
    pub async fn prepare(
        fetcher: &ToolFetcher,
        settings: &Settings,
        options: InstallerOptions,
        progress: &mut dyn DownloadProgress,
    ) -> Result<Self> {
        let jar = fetcher.ensure_bundletool(progress).await?;
        let adb_path = fetcher.ensure_platform_tools(progress).await?;

        let mut bundletool = Bundletool::new(&jar, &adb_path, settings.command_timeout())
            .with_device_id(options.device_id.clone());
        if let Some(java) = options.java {
            bundletool = bundletool.with_java(java);
        }
        let adb = AdbClient::new(&adb_path, settings.command_timeout())
            .with_device_id(options.device_id);
        let store = KeystoreStore::new(fetcher.paths().keystore_config());

        Ok(Self::new(bundletool, adb, store, settings.launch_wait()))
    }

    pub fn store(&self) -> &KeystoreStore {
        &self.store
    }

    pub fn get_keystore_config(
        &self,
        aab: &Path,
        keystore: &Path,
        prompter: &mut dyn Prompter,
    ) -> Result<(KeystoreConfig, bool)> {
        self.store.lookup_or_prompt(aab, keystore, prompter)
    }

    pub fn save_keystore_config(&self, aab: &Path, config: &KeystoreConfig) -> Result<()> {
        self.store.save(aab, config)
    }

    pub async fn create_apks(&self, aab: &Path, config: &KeystoreConfig) -> Result<PathBuf> {
        self.bundletool.build_apks(aab, config).await
    }

    pub async fn install_apks(&self, apks: &Path) -> Result<()> {
        self.bundletool.install_apks(apks).await
    }

    pub async fn uninstall_app(&self, aab: &Path) -> Result<()> {
        let package = self.bundletool.package_name(aab).await?;
        self.adb.uninstall(&package).await
    }

    /// Start the app's launcher activity and optionally follow its logs
    pub async fn launch_app(&self, aab: &Path, stream_logs: bool) -> Result<()> {
        let package = self.bundletool.package_name(aab).await?;
        let launcher = self.adb.resolve_launcher(&package).await?;

        info!("Found launcher: {}", launcher);
        info!("Launch app: {}", package);
        self.adb.start_activity(&launcher).await?;

        if !stream_logs {
            return Ok(());
        }

        info!(
            "Waiting {} second for launch app ..",
            self.launch_wait.as_secs_f64()
        );
        sleep_or_interrupt(self.launch_wait, ctrl_c()).await?;

        let pid = self.adb.pidof(&package).await?;
        info!("Start log (pid {})", pid);
        self.adb.logcat(&pid).await
    }

    async fn ensure_device(&self) -> Result<()> {
        if self.adb.is_connected().await? {
            return Ok(());
        }
        Err(InstallerError::DeviceNotFound(
            self.adb
                .device_id()
                .map(|id| id.to_string())
                .unwrap_or_else(|| "no device attached".to_string()),
        ))
    }

    /// Run every step after tool acquisition
    pub async fn run(&self, request: &InstallRequest, prompter: &mut dyn Prompter) -> Result<()> {
        self.ensure_device().await?;

        let (config, cached) = self.get_keystore_config(&request.aab, &request.keystore, prompter)?;

        let apks = self.create_apks(&request.aab, &config).await?;
        if !cached {
            self.save_keystore_config(&request.aab, &config)?;
        }

        if request.replace {
            self.uninstall_app(&request.aab).await?;
        }

        self.install_apks(&apks).await?;

        if request.launch {
            self.launch_app(&request.aab, request.stream_logs).await?;
        }
        Ok(())
    }
}
