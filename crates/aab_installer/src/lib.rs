//! aab_installer: install Android App Bundles on a connected device
//!
//! This library provides:
//! - Acquisition of bundletool and Android platform-tools into a working directory
//! - A cache of keystore credentials keyed by bundle and keystore path
//! - Wrappers over `bundletool` (build/install apks, manifest dump) and `adb`
//! - The `Installer` pipeline tying them together
//!
//! # Example
//!
//! ```no_run
//! use aab_installer::{
//!     default_home_dir, Downloader, InstallRequest, Installer, InstallerOptions, NoProgress, Os,
//!     Prompter, Settings, ToolFetcher, ToolPaths,
//! };
//!
//! struct Fixed;
//!
//! impl Prompter for Fixed {
//!     fn prompt(&mut self, _label: &str) -> aab_installer::Result<String> {
//!         Ok("android".to_string())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> aab_installer::Result<()> {
//!     let settings = Settings::default();
//!     let paths = ToolPaths::new(default_home_dir(), Os::detect()?);
//!     let fetcher = ToolFetcher::new(paths, settings.clone(), Downloader::new()?);
//!
//!     let installer = Installer::prepare(
//!         &fetcher,
//!         &settings,
//!         InstallerOptions::default(),
//!         &mut NoProgress,
//!     )
//!     .await?;
//!
//!     let request = InstallRequest::new("app-release.aab", "release.jks").with_replace(true);
//!     installer.run(&request, &mut Fixed).await
//! }
//! ```

// Core modules
pub mod error;

// Configuration module
pub mod config;
pub mod platform;

// Tool acquisition and invocation
pub mod adb;
pub mod bundletool;
pub mod download;
pub mod process;

// Core functionality
pub mod installer;
pub mod keystore;

// Re-export commonly used types and functions
pub use error::{InstallerError, Result};

// Config re-exports
pub use config::{default_home_dir, Settings, ToolPaths, CONFIG_FILE_NAME, SETTINGS};
pub use platform::Os;

// Tool re-exports
pub use adb::{AdbClient, ConnectionType, DeviceInfo};
pub use bundletool::{apks_path_for, Bundletool};
pub use download::{human_size, DownloadProgress, Downloader, NoProgress, ToolFetcher};

// Pipeline re-exports
pub use installer::{InstallRequest, Installer, InstallerOptions};
pub use keystore::{KeystoreConfig, KeystoreRecord, KeystoreStore, Prompter};
