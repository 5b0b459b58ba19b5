//! Tunable settings for tool acquisition and device operations

use lazy_static::lazy_static;
use std::env;
use std::time::Duration;

use crate::platform::Os;

const DEFAULT_BUNDLETOOL_VERSION: &str = "1.11.0";

/// Installer settings, each overridable through an environment variable
#[derive(Debug, Clone)]
pub struct Settings {
    pub bundletool_version: String,
    /// Seconds to wait between launching the app and attaching logcat
    pub launch_wait: f64,
    /// Upper bound in seconds for short query commands
    pub command_timeout: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bundletool_version: env::var("NADIA_BUNDLETOOL_VERSION")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BUNDLETOOL_VERSION.to_string()),
            launch_wait: env::var("NADIA_LAUNCH_WAIT")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(10.0),
            command_timeout: env::var("NADIA_COMMAND_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }
}

impl Settings {
    /// Release URL of the bundletool jar for the configured version
    pub fn bundletool_url(&self) -> String {
        format!(
            "https://github.com/google/bundletool/releases/download/{v}/bundletool-all-{v}.jar",
            v = self.bundletool_version
        )
    }

    /// Download URL of the latest platform-tools archive for `os`
    pub fn platform_tools_url(&self, os: Os) -> String {
        format!(
            "https://dl.google.com/android/repository/platform-tools-latest-{}.zip",
            os.platform_tools_flavor()
        )
    }

    pub fn launch_wait(&self) -> Duration {
        Duration::try_from_secs_f64(self.launch_wait.max(0.0)).unwrap_or_default()
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout)
    }
}

lazy_static! {
    /// Global settings instance
    pub static ref SETTINGS: Settings = Settings::default();
}
