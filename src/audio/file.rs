use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::capture::{AudioFragment, CaptureConfig, CaptureDevice};

/// Default fragment size when slicing a file.
const DEFAULT_FRAGMENT_BYTES: usize = 32 * 1024;

/// Capture device backed by a recorded file.
///
/// Slices the file into fragments and replays them through the same path a
/// live stream takes. Used by the CLI for batch transcription and by the
/// end-to-end tests. Unpaced by default; `paced` replays at the configured
/// slicing interval instead.
pub struct FileCaptureDevice {
    path: PathBuf,
    fragment_bytes: usize,
    paced: bool,
    capturing: bool,
    flush: Arc<AtomicBool>,
    aborted: Arc<AtomicBool>,
    emitter: Option<JoinHandle<()>>,
}

impl FileCaptureDevice {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            fragment_bytes: DEFAULT_FRAGMENT_BYTES,
            paced: false,
            capturing: false,
            flush: Arc::new(AtomicBool::new(false)),
            aborted: Arc::new(AtomicBool::new(false)),
            emitter: None,
        }
    }

    /// Emit fragments at the slicing interval instead of all at once.
    pub fn paced(mut self) -> Self {
        self.paced = true;
        self
    }

    pub fn with_fragment_bytes(mut self, fragment_bytes: usize) -> Self {
        self.fragment_bytes = fragment_bytes.max(1);
        self
    }

    fn mime(&self) -> &'static str {
        match self.path.extension().and_then(|e| e.to_str()) {
            Some("wav") => "audio/wav",
            Some("flac") => "audio/flac",
            Some("ogg") => "audio/ogg",
            Some("mp3") => "audio/mpeg",
            _ => "application/octet-stream",
        }
    }
}

#[async_trait::async_trait]
impl CaptureDevice for FileCaptureDevice {
    fn supported_formats(&self) -> Vec<String> {
        vec![self.mime().to_string()]
    }

    async fn start(
        &mut self,
        config: &CaptureConfig,
        format: &str,
    ) -> Result<mpsc::Receiver<AudioFragment>> {
        if self.capturing {
            anyhow::bail!("file device already capturing");
        }

        let data = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        if data.is_empty() {
            anyhow::bail!("{} is empty", self.path.display());
        }

        debug!(
            echo_cancellation = config.echo_cancellation,
            noise_suppression = config.noise_suppression,
            "capability hints ignored by file device"
        );
        info!(
            path = %self.path.display(),
            bytes = data.len(),
            %format,
            "file capture started"
        );

        let (tx, rx) = mpsc::channel(64);
        let fragment_bytes = self.fragment_bytes;
        let interval = Duration::from_millis(config.slice_interval_ms);
        let paced = self.paced;
        let flush = Arc::new(AtomicBool::new(false));
        let aborted = Arc::new(AtomicBool::new(false));
        self.flush = Arc::clone(&flush);
        self.aborted = Arc::clone(&aborted);

        self.emitter = Some(tokio::spawn(async move {
            for (index, slice) in data.chunks(fragment_bytes).enumerate() {
                if aborted.load(Ordering::SeqCst) {
                    break;
                }
                if paced && !flush.load(Ordering::SeqCst) {
                    tokio::time::sleep(interval).await;
                }
                let fragment = AudioFragment {
                    bytes: slice.to_vec(),
                    timestamp_ms: index as u64 * interval.as_millis() as u64,
                };
                if tx.send(fragment).await.is_err() {
                    break;
                }
            }
        }));
        self.capturing = true;

        Ok(rx)
    }

    async fn finalize(&mut self) -> Result<()> {
        // Flush: the remaining slices count as buffered-but-unsent data, so
        // a paced replay bursts them out before the channel closes.
        self.flush.store(true, Ordering::SeqCst);
        if let Some(emitter) = self.emitter.take() {
            emitter.await.ok();
        }
        self.capturing = false;
        Ok(())
    }

    fn abort(&mut self) {
        self.aborted.store(true, Ordering::SeqCst);
        if let Some(emitter) = self.emitter.take() {
            emitter.abort();
        }
        self.capturing = false;
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "file"
    }
}
