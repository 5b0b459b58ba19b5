//! Acquisition of the external tools the installer drives
//!
//! - `http`: streaming downloads with progress reporting
//! - `archive`: zip extraction
//! - `tools`: fetch-once logic for bundletool and platform-tools

mod archive;
mod http;
mod tools;

pub use archive::unzip;
pub use http::{copy_stream, human_size, DownloadProgress, Downloader, NoProgress};
pub use tools::ToolFetcher;
