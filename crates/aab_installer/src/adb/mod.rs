//! ADB (Android Debug Bridge) module for the installed app's lifecycle
//!
//! This module provides:
//! - `connection`: the client and attached-device listing
//! - `app`: uninstall, launch and log streaming for one package

mod app;
mod connection;

pub use app::{parse_launcher, parse_pid};
pub use connection::{parse_devices, AdbClient, ConnectionType, DeviceInfo};
