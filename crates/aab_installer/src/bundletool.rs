//! Wrapper around `java -jar bundletool.jar`

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::info;

use crate::error::{InstallerError, Result};
use crate::keystore::KeystoreConfig;
use crate::process::{exec, exec_string, strip_whitespace};

/// The `.apks` path produced for an `.aab`: same location, suffix swapped
pub fn apks_path_for(aab: &Path) -> PathBuf {
    let path = aab.to_string_lossy();
    let stem = path.strip_suffix(".aab").unwrap_or(&path);
    PathBuf::from(format!("{}.apks", stem))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Runs bundletool commands against one adb binary and optional device
#[derive(Debug, Clone)]
pub struct Bundletool {
    java: PathBuf,
    jar: PathBuf,
    adb: PathBuf,
    device_id: Option<String>,
    timeout: Duration,
}

impl Bundletool {
    pub fn new(jar: impl Into<PathBuf>, adb: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            java: PathBuf::from("java"),
            jar: jar.into(),
            adb: adb.into(),
            device_id: None,
            timeout,
        }
    }

    /// Use a specific java executable instead of the one on PATH
    pub fn with_java(mut self, java: impl Into<PathBuf>) -> Self {
        self.java = java.into();
        self
    }

    pub fn with_device_id(mut self, device_id: Option<String>) -> Self {
        self.device_id = device_id;
        self
    }

    fn base_args(&self, subcommand: &str) -> Vec<String> {
        vec![
            "-jar".to_string(),
            self.jar.display().to_string(),
            subcommand.to_string(),
        ]
    }

    fn push_adb(&self, args: &mut Vec<String>) {
        args.push(format!("--adb={}", self.adb.display()));
    }

    fn push_device(&self, args: &mut Vec<String>) {
        if let Some(id) = &self.device_id {
            args.push(format!("--device-id={}", id));
        }
    }

    pub fn build_apks_args(&self, aab: &Path, apks: &Path, config: &KeystoreConfig) -> Vec<String> {
        let mut args = self.base_args("build-apks");
        args.extend([
            "--local-testing".to_string(),
            "--connected-device".to_string(),
            format!("--bundle={}", aab.display()),
            format!("--output={}", apks.display()),
            format!("--ks={}", config.keystore.display()),
            format!("--ks-pass=pass:{}", config.keystore_pass),
            format!("--ks-key-alias={}", config.keystore_alias),
            format!("--key-pass=pass:{}", config.keystore_alias_password),
        ]);
        self.push_device(&mut args);
        self.push_adb(&mut args);
        args
    }

    pub fn install_apks_args(&self, apks: &Path) -> Vec<String> {
        let mut args = self.base_args("install-apks");
        args.push(format!("--apks={}", apks.display()));
        self.push_device(&mut args);
        self.push_adb(&mut args);
        args
    }

    pub fn package_name_args(&self, aab: &Path) -> Vec<String> {
        let mut args = self.base_args("dump");
        args.extend([
            "manifest".to_string(),
            format!("--bundle={}", aab.display()),
            "--xpath=/manifest/@package".to_string(),
        ]);
        self.push_adb(&mut args);
        args
    }

    /// Build a device-specific `.apks` next to `aab`, replacing any previous one
    pub async fn build_apks(&self, aab: &Path, config: &KeystoreConfig) -> Result<PathBuf> {
        let aab = std::path::absolute(aab)?;
        let apks = apks_path_for(&aab);
        let config = KeystoreConfig {
            keystore: std::path::absolute(&config.keystore)?,
            ..config.clone()
        };

        if fs::try_exists(&apks).await? {
            fs::remove_file(&apks).await?;
        }

        info!("Generate apks for {}, please wait ..", file_name(&aab));
        exec(&self.java, &self.build_apks_args(&aab, &apks, &config)).await?;
        Ok(apks)
    }

    /// Install a previously built `.apks` on the device
    pub async fn install_apks(&self, apks: &Path) -> Result<()> {
        let apks = std::path::absolute(apks)?;
        info!("Installing {}, please wait ..", file_name(&apks));
        exec(&self.java, &self.install_apks_args(&apks)).await
    }

    /// Application id declared in the bundle manifest
    pub async fn package_name(&self, aab: &Path) -> Result<String> {
        let aab = std::path::absolute(aab)?;
        let output = exec_string(&self.java, &self.package_name_args(&aab), self.timeout).await?;
        let package = strip_whitespace(&output);
        if package.is_empty() {
            return Err(InstallerError::PackageNameNotFound(
                aab.display().to_string(),
            ));
        }
        Ok(package)
    }
}
