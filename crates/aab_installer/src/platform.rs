//! Host operating system detection

use crate::error::{InstallerError, Result};

/// Operating systems the installer knows how to fetch platform-tools for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Windows,
    Linux,
    Mac,
    Solaris,
}

impl Os {
    /// Detect the host operating system
    pub fn detect() -> Result<Self> {
        Self::from_name(std::env::consts::OS)
    }

    /// Classify an OS name such as `linux`, `Windows 10` or `Mac OS X`
    pub fn from_name(name: &str) -> Result<Self> {
        let os = name.to_lowercase();
        // `darwin` contains `win`, so Mac is matched first
        if os.contains("mac") || os.contains("darwin") {
            Ok(Self::Mac)
        } else if os.contains("win") {
            Ok(Self::Windows)
        } else if os.contains("nix") || os.contains("nux") || os.contains("aix") {
            Ok(Self::Linux)
        } else if os.contains("sunos") || os.contains("solaris") {
            Ok(Self::Solaris)
        } else {
            Err(InstallerError::UnsupportedPlatform(name.to_string()))
        }
    }

    pub fn adb_binary_name(&self) -> &'static str {
        match self {
            Self::Windows => "adb.exe",
            _ => "adb",
        }
    }

    /// Suffix used by the platform-tools download for this OS
    pub fn platform_tools_flavor(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Mac => "darwin",
            Self::Linux | Self::Solaris => "linux",
        }
    }
}
