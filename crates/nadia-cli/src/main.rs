//! Nadia CLI - Android App Bundle installer
//!
//! Usage:
//!     nadia --aab <FILE> --keystore <FILE> [--replace]
//!
//! Environment Variables:
//!     NADIA_HOME: Working directory for tools and the keystore cache (default: ~/nadia)
//!     NADIA_DEVICE_ID: ADB serial of the target device
//!     NADIA_LOG: Log filter (default: info)
//!     NADIA_BUNDLETOOL_VERSION: bundletool release to download (default: 1.11.0)
//!     NADIA_LAUNCH_WAIT: Seconds to wait after launch before attaching logcat (default: 10)
//!     NADIA_COMMAND_TIMEOUT: Seconds allowed for short adb/bundletool queries (default: 60)

use aab_installer::{
    default_home_dir, human_size, AdbClient, DownloadProgress, Downloader, InstallRequest,
    Installer, InstallerOptions, Os, Prompter, ToolFetcher, ToolPaths, SETTINGS,
};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing_subscriber::EnvFilter;

const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

/// Nadia - Android App Bundle Installer (aab installer)
#[derive(Parser, Debug)]
#[command(name = "nadia", version)]
#[command(about = "Nadia - Android App Bundle Installer (aab installer)")]
#[command(after_help = r#"Examples:
    # Build, install and launch a bundle, then follow its logs
    nadia --aab app-release.aab --keystore release.jks

    # Uninstall the previous version first
    nadia -a app-release.aab -k release.jks --replace

    # Target one device when several are attached
    nadia -a app-release.aab -k release.jks --device-id emulator-5554

    # List attached devices
    nadia --list-devices
"#)]
struct Cli {
    /// Bundle aab file
    #[arg(short = 'a', long, value_parser = parse_aab, required_unless_present = "list_devices")]
    aab: Option<PathBuf>,

    /// Keystore of aab file
    #[arg(short = 'k', long, value_parser = parse_keystore, required_unless_present = "list_devices")]
    keystore: Option<PathBuf>,

    /// Enable replace, the application will be uninstalled first before installing the new version of the aab
    #[arg(short = 'r', long)]
    replace: bool,

    /// ADB device serial for multi-device setups
    #[arg(short = 's', long, env = "NADIA_DEVICE_ID")]
    device_id: Option<String>,

    /// Working directory for downloaded tools and the keystore cache
    #[arg(long, env = "NADIA_HOME")]
    home: Option<PathBuf>,

    /// Install without launching the app
    #[arg(long)]
    no_launch: bool,

    /// Launch the app without following its logcat output
    #[arg(long)]
    no_log: bool,

    /// List attached devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "NADIA_LOG", default_value = "info")]
    log_level: String,
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| allowed.iter().any(|a| e.eq_ignore_ascii_case(a)))
        .unwrap_or(false)
}

fn parse_existing_file(value: &str, allowed: &[&str], invalid: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if !has_extension(&path, allowed) {
        return Err(invalid.to_string());
    }
    if !path.is_file() {
        return Err(format!("{} does not exist", path.display()));
    }
    Ok(path)
}

fn parse_aab(value: &str) -> Result<PathBuf, String> {
    parse_existing_file(value, &["aab"], "Aab invalid!")
}

fn parse_keystore(value: &str) -> Result<PathBuf, String> {
    parse_existing_file(value, &["keystore", "jks"], "Keystore invalid!")
}

/// Reads missing keystore credentials from the terminal
struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn prompt(&mut self, label: &str) -> aab_installer::Result<String> {
        print!("{}: ", label);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;
        Ok(input.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Single-line console progress for tool downloads
#[derive(Default)]
struct ConsoleProgress {
    last_printed: u64,
}

impl DownloadProgress for ConsoleProgress {
    fn on_start(&mut self, _name: &str, _total: Option<u64>) {
        self.last_printed = 0;
    }

    fn on_progress(&mut self, name: &str, downloaded: u64, total: Option<u64>) {
        let done = total == Some(downloaded);
        if !done && downloaded - self.last_printed < 256 * 1024 {
            return;
        }
        self.last_printed = downloaded;

        let total = total.map(human_size).unwrap_or_else(|| "?".to_string());
        print!(
            "Downloading {}: {} of {}{}\r",
            name,
            human_size(downloaded),
            total,
            " ".repeat(20)
        );
        io::stdout().flush().ok();
    }

    fn on_finish(&mut self, _name: &str, _downloaded: u64) {
        println!();
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .compact()
        .init();
}

fn print_header() {
    println!("{}", "-".repeat(44));
    println!("  Nadia");
    println!("  Android App Bundle Installer (aab installer)");
    println!("  {}", VERSION);
    println!("{}", "-".repeat(44));
    println!();
}

/// Check that a Java runtime is available for bundletool
async fn check_system_requirements() -> Result<PathBuf> {
    print!("Checking Java installation... ");
    io::stdout().flush().ok();

    let java = match which::which("java") {
        Ok(path) => path,
        Err(_) => {
            println!("\u{274C} FAILED");
            println!("   Error: java is not installed or not in PATH.");
            println!("   Solution: Install a Java runtime (11 or newer):");
            println!("     - macOS: brew install openjdk");
            println!("     - Linux: sudo apt install default-jre");
            println!("     - Windows: Download from https://adoptium.net");
            anyhow::bail!("java not found");
        }
    };

    // `java -version` writes to stderr
    let version = tokio::time::timeout(
        Duration::from_secs(10),
        Command::new(&java).arg("-version").output(),
    )
    .await;

    match version {
        Ok(Ok(output)) if output.status.success() => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let line = stderr.lines().next().unwrap_or("installed");
            println!("\u{2705} OK ({})", line.trim());
            Ok(java)
        }
        Ok(Ok(_)) => {
            println!("\u{274C} FAILED");
            anyhow::bail!("java -version failed to run")
        }
        Ok(Err(e)) => {
            println!("\u{274C} FAILED");
            Err(e).context("java could not be started")
        }
        Err(_) => {
            println!("\u{274C} FAILED");
            anyhow::bail!("java -version timed out")
        }
    }
}

async fn list_devices(fetcher: &ToolFetcher) -> Result<()> {
    let adb_path = fetcher
        .ensure_platform_tools(&mut ConsoleProgress::default())
        .await?;
    let adb = AdbClient::new(adb_path, SETTINGS.command_timeout());
    let devices = adb.list_devices().await?;

    if devices.is_empty() {
        println!("No devices connected.");
        return Ok(());
    }

    println!("Connected devices:");
    println!("{}", "-".repeat(60));
    for device in devices {
        let status_icon = if device.is_ready() {
            "\u{2713}"
        } else {
            "\u{2717}"
        };
        let model_info = device
            .model
            .map(|m| format!(" ({})", m))
            .unwrap_or_default();
        println!(
            "  {} {:<30} [{:?}] {}{}",
            status_icon, device.device_id, device.connection_type, device.status, model_info
        );
    }
    Ok(())
}

async fn run(args: Cli) -> Result<()> {
    let home = args.home.clone().unwrap_or_else(default_home_dir);
    let os = Os::detect()?;
    let paths = ToolPaths::new(&home, os);
    let fetcher = ToolFetcher::new(paths, SETTINGS.clone(), Downloader::new()?);
    tracing::debug!("Working directory: {}", home.display());

    if args.list_devices {
        return list_devices(&fetcher).await;
    }

    let (Some(aab), Some(keystore)) = (args.aab, args.keystore) else {
        anyhow::bail!("--aab and --keystore are required");
    };

    let java = check_system_requirements().await?;

    let options = InstallerOptions {
        device_id: args.device_id,
        java: Some(java),
    };
    let installer = Installer::prepare(
        &fetcher,
        &SETTINGS,
        options,
        &mut ConsoleProgress::default(),
    )
    .await
    .context("Failed to prepare bundletool and platform-tools")?;

    let request = InstallRequest::new(aab, keystore)
        .with_replace(args.replace)
        .with_launch(!args.no_launch)
        .with_stream_logs(!args.no_log);

    installer.run(&request, &mut StdinPrompter).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    init_tracing(&args.log_level);
    print_header();

    if let Err(e) = run(args).await {
        eprintln!("> Failure: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_aab_checks_extension() {
        let temp_dir = tempdir().unwrap();
        let apk = temp_dir.path().join("app.apk");
        std::fs::write(&apk, b"").unwrap();

        assert_eq!(parse_aab(apk.to_str().unwrap()).unwrap_err(), "Aab invalid!");
    }

    #[test]
    fn test_parse_aab_requires_existing_file() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("missing.aab");
        assert!(parse_aab(missing.to_str().unwrap())
            .unwrap_err()
            .contains("does not exist"));
    }

    #[test]
    fn test_parse_keystore_accepts_jks_and_keystore() {
        let temp_dir = tempdir().unwrap();
        let jks = temp_dir.path().join("release.jks");
        let keystore = temp_dir.path().join("debug.KEYSTORE");
        let p12 = temp_dir.path().join("release.p12");
        for file in [&jks, &keystore, &p12] {
            std::fs::write(file, b"").unwrap();
        }

        assert!(parse_keystore(jks.to_str().unwrap()).is_ok());
        assert!(parse_keystore(keystore.to_str().unwrap()).is_ok());
        assert_eq!(
            parse_keystore(p12.to_str().unwrap()).unwrap_err(),
            "Keystore invalid!"
        );
    }

    #[test]
    fn test_cli_parses_install_flags() {
        let temp_dir = tempdir().unwrap();
        let aab = temp_dir.path().join("app.aab");
        let jks = temp_dir.path().join("release.jks");
        std::fs::write(&aab, b"").unwrap();
        std::fs::write(&jks, b"").unwrap();

        let cli = Cli::try_parse_from([
            "nadia",
            "-a",
            aab.to_str().unwrap(),
            "-k",
            jks.to_str().unwrap(),
            "-r",
            "--no-log",
        ])
        .unwrap();

        assert_eq!(cli.aab.as_deref(), Some(aab.as_path()));
        assert_eq!(cli.keystore.as_deref(), Some(jks.as_path()));
        assert!(cli.replace);
        assert!(cli.no_log);
        assert!(!cli.no_launch);
    }

    #[test]
    fn test_cli_requires_aab_unless_listing() {
        assert!(Cli::try_parse_from(["nadia"]).is_err());
        let cli = Cli::try_parse_from(["nadia", "--list-devices"]).unwrap();
        assert!(cli.list_devices);
        assert!(cli.aab.is_none());
    }
}
