//! Stream watcher
//!
//! Tees one daemon output stream to the console and scans it line by line for
//! an upgrade marker. After a marker or an error is reported the watcher keeps
//! passing bytes through until the stream closes, so the daemon never blocks
//! on a full pipe and the operator still sees its last words.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::errors::RunError;
use crate::domain::models::{StreamKind, UpgradeDescriptor};
use crate::services::ResultAggregator;

const READ_CHUNK: usize = 8 * 1024;

/// Scanner over one daemon output stream
pub struct StreamWatcher<R, W> {
    stream: StreamKind,
    reader: R,
    sink: W,
    max_line: usize,
    pending: Vec<u8>,
}

impl<R, W> StreamWatcher<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Create a watcher reading `reader`, copying every byte to `sink`.
    ///
    /// `max_line` is the longest line the scanner accepts.
    pub fn new(stream: StreamKind, reader: R, sink: W, max_line: usize) -> Self {
        Self {
            stream,
            reader,
            sink,
            max_line,
            pending: Vec::new(),
        }
    }

    /// Stream this watcher reads.
    pub const fn stream(&self) -> StreamKind {
        self.stream
    }

    /// Scan until the first upgrade marker or the end of the stream.
    pub async fn scan(&mut self) -> Result<Option<UpgradeDescriptor>, RunError> {
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            while let Some(end) = self.pending.iter().position(|&b| b == b'\n') {
                if end > self.max_line {
                    return Err(self.too_long());
                }
                let line: Vec<u8> = self.pending.drain(..=end).collect();
                if let Some(upgrade) = self.match_line(&line[..end])? {
                    return Ok(Some(upgrade));
                }
            }
            if self.pending.len() > self.max_line {
                return Err(self.too_long());
            }

            let read = self
                .reader
                .read(&mut chunk)
                .await
                .map_err(|source| RunError::StreamRead {
                    stream: self.stream,
                    source: Arc::new(source),
                })?;

            if read == 0 {
                // Final line without a trailing newline
                if self.pending.is_empty() {
                    return Ok(None);
                }
                let line = std::mem::take(&mut self.pending);
                return self.match_line(&line);
            }

            self.forward(&chunk[..read]).await?;
            self.pending.extend_from_slice(&chunk[..read]);
        }
    }

    /// Pass the rest of the stream through to the sink, discarding it when
    /// the sink is broken.
    pub async fn drain(&mut self, sink_ok: bool) {
        self.pending.clear();
        let copied = if sink_ok {
            tokio::io::copy(&mut self.reader, &mut self.sink).await
        } else {
            tokio::io::copy(&mut self.reader, &mut tokio::io::sink()).await
        };
        match copied {
            Ok(bytes) => debug!(stream = %self.stream, bytes, "drained daemon stream"),
            Err(err) => debug!(stream = %self.stream, error = %err, "daemon stream closed while draining"),
        }
        if let Err(err) = self.sink.flush().await {
            debug!(stream = %self.stream, error = %err, "failed flushing console after drain");
        }
    }

    /// Run the watcher to completion, reporting into `aggregator`.
    ///
    /// A detected upgrade is recorded before the kill request is sent.
    pub async fn watch(
        mut self,
        aggregator: Arc<ResultAggregator>,
        kill: mpsc::UnboundedSender<()>,
    ) {
        let sink_ok = match self.scan().await {
            Ok(None) => {
                debug!(stream = %self.stream, "daemon stream closed");
                return;
            }
            Ok(Some(upgrade)) => {
                info!(
                    stream = %self.stream,
                    name = %upgrade.name,
                    height = upgrade.height,
                    "upgrade marker detected"
                );
                aggregator.set_upgrade(upgrade);
                if kill.send(()).is_err() {
                    debug!(stream = %self.stream, "daemon already reaped, no kill needed");
                }
                true
            }
            Err(err) => {
                warn!(stream = %self.stream, error = %err, "stream watcher failed");
                let sink_ok = !matches!(err, RunError::Sink { .. });
                aggregator.set_error(err);
                sink_ok
            }
        };
        self.drain(sink_ok).await;
    }

    async fn forward(&mut self, bytes: &[u8]) -> Result<(), RunError> {
        let stream = self.stream;
        let sink_err = |source| RunError::Sink {
            stream,
            source: Arc::new(source),
        };
        self.sink.write_all(bytes).await.map_err(sink_err)?;
        self.sink.flush().await.map_err(sink_err)
    }

    fn match_line(&self, line: &[u8]) -> Result<Option<UpgradeDescriptor>, RunError> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        UpgradeDescriptor::parse_marker(&String::from_utf8_lossy(line)).map_err(|source| {
            RunError::MarkerParse {
                stream: self.stream,
                source: Arc::new(source),
            }
        })
    }

    const fn too_long(&self) -> RunError {
        RunError::LineTooLong {
            stream: self.stream,
            limit: self.max_line,
        }
    }
}
