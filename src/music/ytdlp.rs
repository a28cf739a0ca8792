//! [`AudioSource`] backed by the `yt-dlp` command line tool.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::task::{ready, Context, Poll};

use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use tokio::io::{AsyncRead, ReadBuf};
use tokio::process::{Child, ChildStdout, Command};

use crate::config::MusicConfig;
use crate::logutil::escape_log;
use crate::music::errors::PlaybackError;
use crate::music::ports::AudioSource;
use crate::music::types::{AudioStream, TrackMetadata};

pub struct YtDlpSource {
    binary: String,
    format: String,
    rate_limit: String,
}

#[derive(Debug, Deserialize)]
struct DumpedInfo {
    title: Option<String>,
    channel: Option<String>,
    uploader: Option<String>,
    webpage_url: Option<String>,
    thumbnail: Option<String>,
    duration: Option<f64>,
}

impl YtDlpSource {
    pub fn new(config: &MusicConfig) -> Self {
        Self {
            binary: config.ytdlp_path.clone(),
            format: config.audio_format.clone(),
            rate_limit: config.rate_limit.clone(),
        }
    }
}

fn parse_info(raw: &[u8], requested: &str) -> Result<TrackMetadata, PlaybackError> {
    let info: DumpedInfo = serde_json::from_slice(raw)
        .map_err(|e| PlaybackError::Source(format!("unreadable metadata: {}", e)))?;
    Ok(TrackMetadata {
        title: info.title.unwrap_or_else(|| "Unknown title".to_string()),
        channel: info
            .channel
            .or(info.uploader)
            .unwrap_or_else(|| "Unknown artist".to_string()),
        url: info.webpage_url.unwrap_or_else(|| requested.to_string()),
        thumbnail: info.thumbnail,
        duration_secs: info.duration.map(|d| d.max(0.0).round() as u64).unwrap_or(0),
    })
}

#[async_trait]
impl AudioSource for YtDlpSource {
    async fn metadata(&self, url: &str) -> Result<TrackMetadata, PlaybackError> {
        debug!("yt-dlp metadata for {}", escape_log(url));
        let output = Command::new(&self.binary)
            .args(["--dump-single-json", "--no-playlist", "--no-warnings", url])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| PlaybackError::Source(format!("could not run {}: {}", self.binary, e)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("yt-dlp metadata failed: {}", escape_log(stderr.trim()));
            return Err(PlaybackError::Source("couldn't fetch info for that link".to_string()));
        }
        parse_info(&output.stdout, url)
    }

    async fn open_stream(&self, url: &str) -> Result<AudioStream, PlaybackError> {
        debug!("yt-dlp stream for {}", escape_log(url));
        let child = Command::new(&self.binary)
            .args([
                "-o",
                "-",
                "-q",
                "--no-playlist",
                "-f",
                &self.format,
                "-r",
                &self.rate_limit,
                url,
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlaybackError::Source(format!("could not run {}: {}", self.binary, e)))?;
        Ok(Box::pin(ChildStream::new(child)?))
    }
}

type ExitFuture = Pin<Box<dyn Future<Output = io::Result<ExitStatus>> + Send>>;

/// Process output as a stream. The process lives as long as the stream; at
/// end of output the exit status is awaited and a failed run surfaces as a
/// read error.
struct ChildStream {
    stdout: ChildStdout,
    exit: ExitFuture,
    at_eof: bool,
    done: bool,
}

impl ChildStream {
    fn new(mut child: Child) -> Result<Self, PlaybackError> {
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PlaybackError::Source("yt-dlp produced no output pipe".to_string()))?;
        Ok(Self {
            stdout,
            exit: Box::pin(async move { child.wait().await }),
            at_eof: false,
            done: false,
        })
    }
}

impl AsyncRead for ChildStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.done || buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }
        if !this.at_eof {
            let before = buf.filled().len();
            ready!(Pin::new(&mut this.stdout).poll_read(cx, buf))?;
            if buf.filled().len() > before {
                return Poll::Ready(Ok(()));
            }
            this.at_eof = true;
        }
        let status = ready!(this.exit.as_mut().poll(cx));
        this.done = true;
        match status {
            Ok(status) if status.success() => Poll::Ready(Ok(())),
            Ok(status) => {
                warn!("yt-dlp stream ended with {}", status);
                Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("yt-dlp exited with {}", status),
                )))
            }
            Err(e) => Poll::Ready(Err(e)),
        }
    }
}
