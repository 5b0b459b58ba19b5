/// Error types for installer operations
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallerError {
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("Command timeout: {0}")]
    Timeout(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Package name not found in {0}")]
    PackageNameNotFound(String),

    #[error("Launcher activity not found for {0}")]
    LauncherNotFound(String),

    #[error("App is not running: {0}")]
    AppNotRunning(String),

    #[error("Interrupted: {0}")]
    Interrupted(String),

    #[error("Unknown operating system: {0}")]
    UnsupportedPlatform(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, InstallerError>;
