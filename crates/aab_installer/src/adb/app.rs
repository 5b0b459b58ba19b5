//! Per-package device operations: uninstall, launch and log streaming

use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;

use super::connection::AdbClient;
use crate::error::{InstallerError, Result};
use crate::process::{exec_inherit, exec_string, strip_whitespace};

lazy_static! {
    /// `package/activity`, e.g. `com.example/.MainActivity`
    static ref COMPONENT: Regex = Regex::new(r"^[A-Za-z0-9_.]+/[A-Za-z0-9_.$]+$").unwrap();
}

/// Launcher component from `cmd package resolve-activity --brief` output
pub fn parse_launcher(output: &str) -> Option<String> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .last()
        .map(strip_whitespace)
        .filter(|component| COMPONENT.is_match(component))
}

/// Process id from `pidof -s` output
pub fn parse_pid(output: &str) -> Option<String> {
    let pid = strip_whitespace(output);
    if !pid.is_empty() && pid.chars().all(|c| c.is_ascii_digit()) {
        Some(pid)
    } else {
        None
    }
}

impl AdbClient {
    /// Remove `package` from the device; a missing package is not an error
    pub async fn uninstall(&self, package: &str) -> Result<()> {
        info!("Replace enabled, uninstalling {} ...", package);
        exec_inherit(&self.adb_path, &self.command_args(["uninstall", package])).await
    }

    /// Resolve the launcher activity of `package`
    pub async fn resolve_launcher(&self, package: &str) -> Result<String> {
        let args = self.command_args([
            "shell",
            "cmd",
            "package",
            "resolve-activity",
            "--brief",
            "-c",
            "android.intent.category.LAUNCHER",
            package,
        ]);
        let output = exec_string(&self.adb_path, &args, self.timeout).await?;
        parse_launcher(&output).ok_or_else(|| InstallerError::LauncherNotFound(package.to_string()))
    }

    /// Start `component` with the activity manager
    pub async fn start_activity(&self, component: &str) -> Result<()> {
        exec_inherit(
            &self.adb_path,
            &self.command_args(["shell", "am", "start", "-n", component]),
        )
        .await
    }

    /// Process id of the running `package`
    pub async fn pidof(&self, package: &str) -> Result<String> {
        let args = self.command_args(["shell", "pidof", "-s", package]);
        let output = exec_string(&self.adb_path, &args, self.timeout).await?;
        parse_pid(&output).ok_or_else(|| InstallerError::AppNotRunning(package.to_string()))
    }

    /// Stream logcat for `pid` until the user interrupts
    pub async fn logcat(&self, pid: &str) -> Result<()> {
        exec_inherit(
            &self.adb_path,
            &self.command_args(["logcat".to_string(), format!("--pid={}", pid)]),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_launcher_takes_last_line() {
        let output = "priority=0 preferredOrder=0 match=0x108000 specificIndex=-1 isDefault=true\n\
            com.example.app/.MainActivity\n\n";
        assert_eq!(
            parse_launcher(output).as_deref(),
            Some("com.example.app/.MainActivity")
        );
    }

    #[test]
    fn test_parse_launcher_handles_crlf() {
        let output = "com.example.app/com.example.app.ui.SplashActivity\r\n";
        assert_eq!(
            parse_launcher(output).as_deref(),
            Some("com.example.app/com.example.app.ui.SplashActivity")
        );
    }

    #[test]
    fn test_parse_launcher_rejects_no_activity() {
        assert_eq!(parse_launcher("No activity found\n"), None);
        assert_eq!(parse_launcher(""), None);
    }

    #[test]
    fn test_parse_pid() {
        assert_eq!(parse_pid("12345\n").as_deref(), Some("12345"));
        assert_eq!(parse_pid("  \n"), None);
        assert_eq!(parse_pid("pidof: not found"), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pidof_reports_missing_process() {
        // `true` stands in for adb and prints nothing
        let client = AdbClient::new("true", Duration::from_secs(5));
        let result = client.pidof("com.example.app").await;
        assert!(matches!(result, Err(InstallerError::AppNotRunning(_))));
    }
}
