//! HTTP downloads streamed to disk

use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::error::{InstallerError, Result};

/// Receives progress updates while a file is downloading
pub trait DownloadProgress: Send {
    fn on_start(&mut self, _name: &str, _total: Option<u64>) {}

    fn on_progress(&mut self, name: &str, downloaded: u64, total: Option<u64>);

    fn on_finish(&mut self, _name: &str, _downloaded: u64) {}
}

/// Progress sink that discards every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl DownloadProgress for NoProgress {
    fn on_progress(&mut self, _name: &str, _downloaded: u64, _total: Option<u64>) {}
}

/// `bytes / unit` with two decimals, rounded up in exact integer arithmetic
fn two_decimals_up(bytes: u64, unit: u64) -> String {
    let hundredths = (u128::from(bytes) * 100).div_ceil(u128::from(unit));
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

/// Render a byte count as `KB`/`MB` with two decimals, rounded up
pub fn human_size(bytes: u64) -> String {
    if bytes >= 1_024_000 {
        format!("{}MB", two_decimals_up(bytes, 1_024_000))
    } else {
        format!("{}KB", two_decimals_up(bytes, 1024))
    }
}

/// Write every chunk of `stream` to `writer`, reporting progress; returns bytes written
pub async fn copy_stream<S, B, E, W>(
    stream: S,
    writer: &mut W,
    name: &str,
    total: Option<u64>,
    progress: &mut dyn DownloadProgress,
) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    InstallerError: From<E>,
    W: AsyncWrite + Unpin,
{
    let mut stream = std::pin::pin!(stream);
    let mut downloaded: u64 = 0;
    progress.on_start(name, total);

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let bytes = chunk.as_ref();
        writer.write_all(bytes).await?;
        downloaded += bytes.len() as u64;
        progress.on_progress(name, downloaded, total);
    }

    writer.flush().await?;
    progress.on_finish(name, downloaded);
    Ok(downloaded)
}

fn part_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    target.with_file_name(name)
}

/// Thin wrapper over a shared HTTP client
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
}

impl Downloader {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("nadia/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Download `url` into `target`.
    ///
    /// The body goes to `<target>.part` first and is renamed once complete,
    /// so an interrupted download never leaves a truncated tool behind.
    pub async fn download(
        &self,
        url: &str,
        target: &Path,
        progress: &mut dyn DownloadProgress,
    ) -> Result<PathBuf> {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| target.display().to_string());
        info!("Start download {}...", name);
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InstallerError::DownloadFailed(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }
        let total = response.content_length().filter(|len| *len > 0);

        let part = part_path(target);
        let mut file = fs::File::create(&part).await?;
        let copied = copy_stream(
            response.bytes_stream(),
            &mut file,
            &name,
            total,
            progress,
        )
        .await;
        drop(file);

        let downloaded = match copied {
            Ok(n) => n,
            Err(e) => {
                fs::remove_file(&part).await.ok();
                return Err(e);
            }
        };

        if let Some(expected) = total {
            if downloaded != expected {
                fs::remove_file(&part).await.ok();
                return Err(InstallerError::DownloadFailed(format!(
                    "{}: received {} of {} bytes",
                    name, downloaded, expected
                )));
            }
        }

        fs::rename(&part, target).await?;
        info!("Download {} success! ({})", name, human_size(downloaded));
        Ok(target.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        started: Option<Option<u64>>,
        updates: Vec<u64>,
        finished: Option<u64>,
    }

    impl DownloadProgress for Recorder {
        fn on_start(&mut self, _name: &str, total: Option<u64>) {
            self.started = Some(total);
        }

        fn on_progress(&mut self, _name: &str, downloaded: u64, _total: Option<u64>) {
            self.updates.push(downloaded);
        }

        fn on_finish(&mut self, _name: &str, downloaded: u64) {
            self.finished = Some(downloaded);
        }
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(2_048_000), "2.00MB");
        assert_eq!(human_size(1_536_001), "1.51MB");
        assert_eq!(human_size(1_126_400), "1.10MB");
        assert_eq!(human_size(1_024_000), "1.00MB");
        assert_eq!(human_size(1_023_999), "1000.00KB");
        assert_eq!(human_size(512), "0.50KB");
        assert_eq!(human_size(1025), "1.01KB");
        assert_eq!(human_size(0), "0.00KB");
    }

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("/home/nadia/bundletool/bundletool.jar")),
            PathBuf::from("/home/nadia/bundletool/bundletool.jar.part")
        );
    }

    #[tokio::test]
    async fn test_copy_stream_writes_all_chunks() {
        let chunks: Vec<std::result::Result<Vec<u8>, InstallerError>> =
            vec![Ok(b"hello ".to_vec()), Ok(b"world".to_vec())];
        let stream = futures::stream::iter(chunks);
        let mut sink: Vec<u8> = Vec::new();
        let mut recorder = Recorder::default();

        let written = copy_stream(stream, &mut sink, "file", Some(11), &mut recorder)
            .await
            .unwrap();

        assert_eq!(written, 11);
        assert_eq!(sink, b"hello world");
        assert_eq!(recorder.started, Some(Some(11)));
        assert_eq!(recorder.updates, vec![6, 11]);
        assert_eq!(recorder.finished, Some(11));
    }

    #[tokio::test]
    async fn test_copy_stream_propagates_errors() {
        let chunks: Vec<std::result::Result<Vec<u8>, InstallerError>> = vec![
            Ok(b"partial".to_vec()),
            Err(InstallerError::DownloadFailed("connection reset".to_string())),
        ];
        let stream = futures::stream::iter(chunks);
        let mut sink: Vec<u8> = Vec::new();

        let result = copy_stream(stream, &mut sink, "file", None, &mut NoProgress).await;

        assert!(matches!(result, Err(InstallerError::DownloadFailed(_))));
        assert_eq!(sink, b"partial");
    }
}
