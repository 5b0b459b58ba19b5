//! Subprocess helpers shared by the bundletool and adb wrappers

use lazy_static::lazy_static;
use regex::Regex;
use std::ffi::OsStr;
use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{InstallerError, Result};

lazy_static! {
    static ref PASSWORD_ARG: Regex = Regex::new(r"pass:\S*").unwrap();
}

/// Render a command line for logs with `pass:<secret>` values masked
pub fn display_command(program: &OsStr, args: &[String]) -> String {
    let mut rendered = Path::new(program).display().to_string();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(&PASSWORD_ARG.replace_all(arg, "pass:****"));
    }
    rendered
}

/// Remove every whitespace character, including interior ones
pub fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Whether a tool output line reports a failure
pub fn is_error_line(line: &str) -> bool {
    line.contains("Error: ") || line.contains("Exception: ")
}

/// Run a command and capture its stdout as text
pub async fn exec_string(
    program: impl AsRef<OsStr>,
    args: &[String],
    timeout: Duration,
) -> Result<String> {
    let program = program.as_ref();
    debug!("exec_string: {}", display_command(program, args));

    let output = tokio::time::timeout(
        timeout,
        Command::new(program).args(args).kill_on_drop(true).output(),
    )
    .await
    .map_err(|_| {
        InstallerError::Timeout(format!(
            "{} did not finish within {}s",
            display_command(program, args),
            timeout.as_secs()
        ))
    })?
    .map_err(InstallerError::Io)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("exec_string exit {}: {}", output.status, stderr.trim());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Echo a stream line by line, failing on the first error line.
///
/// Lines are decoded lossily; tools may print in the console's legacy encoding.
async fn scan_lines<R: AsyncRead + Unpin>(reader: R) -> Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        if is_error_line(&line) {
            return Err(InstallerError::CommandFailed(line.trim().to_string()));
        }
        if !line.trim().is_empty() {
            info!("> {}", line.trim_end());
        }
    }
}

/// Resolves on Ctrl-C; never resolves if the signal handler cannot be installed
pub async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Sleep for `duration` unless `interrupt` resolves first
pub async fn sleep_or_interrupt<F>(duration: Duration, interrupt: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::select! {
        _ = tokio::time::sleep(duration) => Ok(()),
        _ = interrupt => Err(InstallerError::Interrupted("wait cancelled".to_string())),
    }
}

/// Run a command, echoing its output and treating error lines as failure
pub async fn exec(program: impl AsRef<OsStr>, args: &[String]) -> Result<()> {
    exec_until(program.as_ref(), args, ctrl_c()).await
}

/// `exec` that kills the child and fails with `Interrupted` once `interrupt` resolves
pub async fn exec_until<F>(program: &OsStr, args: &[String], interrupt: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let rendered = display_command(program, args);
    debug!("exec: {}", rendered);

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(InstallerError::Io)?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| InstallerError::CommandFailed("stdout not captured".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| InstallerError::CommandFailed("stderr not captured".to_string()))?;

    let scanned = tokio::select! {
        scanned = async { tokio::try_join!(scan_lines(stdout), scan_lines(stderr)) } => scanned,
        _ = interrupt => Err(InstallerError::Interrupted(rendered.clone())),
    };
    if let Err(e) = scanned {
        child.kill().await.ok();
        return Err(e);
    }

    let status = child.wait().await.map_err(InstallerError::Io)?;
    if !status.success() {
        return Err(InstallerError::CommandFailed(format!(
            "{} exited with {}",
            rendered, status
        )));
    }
    Ok(())
}

/// Run a command attached to the terminal until it exits or Ctrl-C is pressed
pub async fn exec_inherit(program: impl AsRef<OsStr>, args: &[String]) -> Result<()> {
    let program = program.as_ref();
    let rendered = display_command(program, args);
    debug!("exec_inherit: {}", rendered);

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(InstallerError::Io)?;

    tokio::select! {
        status = child.wait() => {
            let status = status.map_err(InstallerError::Io)?;
            if !status.success() {
                warn!("{} exited with {}", rendered, status);
            }
        }
        _ = ctrl_c() => {
            child.kill().await.ok();
            info!("Interrupted, stopped {}", Path::new(program).display());
        }
    }
    Ok(())
}
