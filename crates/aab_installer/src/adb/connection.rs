//! ADB client bound to a downloaded adb binary

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::process::exec_string;

/// Type of ADB connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionType {
    Usb,
    Emulator,
    Remote,
}

/// Information about an attached device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_id: String,
    pub status: String,
    pub connection_type: ConnectionType,
    pub model: Option<String>,
}

impl DeviceInfo {
    /// Whether adb can run commands on this device
    pub fn is_ready(&self) -> bool {
        self.status == "device"
    }
}

/// States `adb devices` reports for a transport
const DEVICE_STATES: &[&str] = &[
    "device",
    "offline",
    "unauthorized",
    "bootloader",
    "recovery",
    "sideload",
    "rescue",
    "authorizing",
    "connecting",
    "host",
    "no",
    "unknown",
];

/// Parse the output of `adb devices -l`
pub fn parse_devices(output: &str) -> Vec<DeviceInfo> {
    let mut devices = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("List of devices") || line.starts_with('*') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 || !DEVICE_STATES.contains(&parts[1]) {
            continue;
        }

        let device_id = parts[0].to_string();
        let connection_type = if device_id.contains(':') {
            ConnectionType::Remote
        } else if device_id.starts_with("emulator-") {
            ConnectionType::Emulator
        } else {
            ConnectionType::Usb
        };

        let model = parts[2..]
            .iter()
            .find_map(|part| part.strip_prefix("model:"))
            .map(|m| m.to_string());

        devices.push(DeviceInfo {
            device_id,
            status: parts[1].to_string(),
            connection_type,
            model,
        });
    }

    devices
}

/// Runs adb commands, optionally pinned to one device
#[derive(Debug, Clone)]
pub struct AdbClient {
    pub(super) adb_path: PathBuf,
    pub(super) device_id: Option<String>,
    pub(super) timeout: Duration,
}

impl AdbClient {
    pub fn new(adb_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            adb_path: adb_path.into(),
            device_id: None,
            timeout,
        }
    }

    pub fn with_device_id(mut self, device_id: Option<String>) -> Self {
        self.device_id = device_id;
        self
    }

    pub fn adb_path(&self) -> &Path {
        &self.adb_path
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    /// Arguments for one adb invocation, with `-s <id>` when a device is pinned
    pub fn command_args<I, S>(&self, args: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut full = Vec::new();
        if let Some(id) = &self.device_id {
            full.push("-s".to_string());
            full.push(id.clone());
        }
        full.extend(args.into_iter().map(Into::into));
        full
    }

    /// List all attached devices
    pub async fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        let args = vec!["devices".to_string(), "-l".to_string()];
        let output = exec_string(&self.adb_path, &args, self.timeout).await?;
        Ok(parse_devices(&output))
    }

    /// Check whether the pinned device, or any device, is ready
    pub async fn is_connected(&self) -> Result<bool> {
        let devices = self.list_devices().await?;
        Ok(match &self.device_id {
            Some(id) => devices.iter().any(|d| &d.device_id == id && d.is_ready()),
            None => devices.iter().any(DeviceInfo::is_ready),
        })
    }
}
