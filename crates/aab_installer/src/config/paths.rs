//! Layout of the working directory holding downloaded tools and the keystore cache

use std::path::{Path, PathBuf};

use crate::platform::Os;

/// File name of the persisted keystore configuration
pub const CONFIG_FILE_NAME: &str = "nadia_keystore_config.json";

/// `<user home>/nadia`, or `./nadia` when no home directory can be resolved
pub fn default_home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nadia")
}

/// Resolved locations inside the working directory
#[derive(Debug, Clone)]
pub struct ToolPaths {
    home: PathBuf,
    os: Os,
}

impl ToolPaths {
    pub fn new(home: impl Into<PathBuf>, os: Os) -> Self {
        Self {
            home: home.into(),
            os,
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn os(&self) -> Os {
        self.os
    }

    pub fn bundletool_dir(&self) -> PathBuf {
        self.home.join("bundletool")
    }

    pub fn bundletool_jar(&self) -> PathBuf {
        self.bundletool_dir().join("bundletool.jar")
    }

    pub fn platform_tools_dir(&self) -> PathBuf {
        self.home.join("platform-tools")
    }

    pub fn platform_tools_zip(&self) -> PathBuf {
        self.home.join("platform-tools.zip")
    }

    pub fn adb(&self) -> PathBuf {
        self.platform_tools_dir().join(self.os.adb_binary_name())
    }

    pub fn keystore_config(&self) -> PathBuf {
        self.home.join(CONFIG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let paths = ToolPaths::new("/tmp/nadia", Os::Linux);
        assert_eq!(
            paths.bundletool_jar(),
            PathBuf::from("/tmp/nadia/bundletool/bundletool.jar")
        );
        assert_eq!(paths.adb(), PathBuf::from("/tmp/nadia/platform-tools/adb"));
        assert_eq!(
            paths.platform_tools_zip(),
            PathBuf::from("/tmp/nadia/platform-tools.zip")
        );
        assert_eq!(
            paths.keystore_config(),
            PathBuf::from("/tmp/nadia/nadia_keystore_config.json")
        );
    }

    #[test]
    fn test_windows_adb_name() {
        let paths = ToolPaths::new("home", Os::Windows);
        assert!(paths.adb().ends_with("adb.exe"));
    }

    #[test]
    fn test_default_home_ends_with_nadia() {
        assert!(default_home_dir().ends_with("nadia"));
    }
}
