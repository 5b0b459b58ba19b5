//! Configuration module for aab_installer
//!
//! This module contains:
//! - `settings`: env-tunable versions and delays
//! - `paths`: on-disk layout of the working directory

mod paths;
mod settings;

pub use paths::{default_home_dir, ToolPaths, CONFIG_FILE_NAME};
pub use settings::{Settings, SETTINGS};
