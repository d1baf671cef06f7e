use std::sync::{Arc, Mutex};

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// One encoded fragment emitted by a capture device.
#[derive(Debug, Clone)]
pub struct AudioFragment {
    /// Raw container bytes; fragments concatenate into one decodable blob.
    pub bytes: Vec<u8>,
    /// Milliseconds since capture started, best effort.
    pub timestamp_ms: u64,
}

/// Hints and parameters passed to the capture device when opening a stream.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Ask the device to cancel echo. Best effort; unsupported is not an
    /// error.
    pub echo_cancellation: bool,
    /// Ask the device to suppress noise. Best effort.
    pub noise_suppression: bool,
    /// Fragment formats in preference order. The device default applies if
    /// none of these are supported.
    pub preferred_formats: Vec<String>,
    /// Interval at which the device slices its buffer into fragments.
    pub slice_interval_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            preferred_formats: vec![
                "audio/wav".to_string(),
                "audio/flac".to_string(),
                "audio/ogg".to_string(),
            ],
            slice_interval_ms: 100,
        }
    }
}

/// Capture device abstraction.
///
/// Implementations own the underlying hardware handle. The file-backed
/// device in this crate replays recordings for batch processing and tests;
/// live microphone backends are host-provided.
#[async_trait::async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Formats this device can emit fragments in, most preferred first.
    fn supported_formats(&self) -> Vec<String>;

    /// Request the stream and begin emitting fragments in `format`.
    ///
    /// The receiver yields fragments at the configured slicing interval
    /// until the device is finalized or aborted. Permission or device
    /// failures are reported here; on success the device holds live tracks
    /// until released.
    async fn start(
        &mut self,
        config: &CaptureConfig,
        format: &str,
    ) -> Result<mpsc::Receiver<AudioFragment>>;

    /// Flush buffered-but-unsent data and end the stream. The fragment
    /// channel closes once the flush completes; no fragments follow.
    async fn finalize(&mut self) -> Result<()>;

    /// Release the underlying tracks immediately. Must be safe to call in
    /// any state, including repeatedly and after a failed `finalize`.
    fn abort(&mut self);

    fn is_capturing(&self) -> bool;

    /// Device name for logging.
    fn name(&self) -> &str;
}

/// Pick the first preferred format the device supports, falling back to
/// the device default (its first supported format).
pub fn negotiate_format(supported: &[String], preferred: &[String]) -> Option<String> {
    preferred
        .iter()
        .find(|format| supported.contains(format))
        .or_else(|| supported.first())
        .cloned()
}

/// A live capture stream plus the fragments collected from it.
///
/// Owns the device handle exclusively for the duration of one recording.
/// Dropping the session releases the device tracks.
pub struct AudioCaptureSession {
    device: Box<dyn CaptureDevice>,
    format: String,
    chunks: Arc<Mutex<Vec<Vec<u8>>>>,
    pump: Option<JoinHandle<usize>>,
}

impl AudioCaptureSession {
    /// Negotiate a fragment format, open the device and start collecting.
    pub async fn open(mut device: Box<dyn CaptureDevice>, config: &CaptureConfig) -> Result<Self> {
        let supported = device.supported_formats();
        let format = negotiate_format(&supported, &config.preferred_formats).ok_or_else(|| {
            anyhow::anyhow!("device '{}' offers no fragment format", device.name())
        })?;

        info!(device = device.name(), %format, "opening capture stream");
        let mut fragments = device.start(config, &format).await?;

        let chunks = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&chunks);
        let pump = tokio::spawn(async move {
            let mut received = 0usize;
            while let Some(fragment) = fragments.recv().await {
                debug!(
                    bytes = fragment.bytes.len(),
                    at_ms = fragment.timestamp_ms,
                    "fragment received"
                );
                sink.lock().unwrap().push(fragment.bytes);
                received += 1;
            }
            received
        });

        Ok(Self {
            device,
            format,
            chunks,
            pump: Some(pump),
        })
    }

    /// The negotiated fragment format.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Fragments collected so far.
    pub fn chunk_count(&self) -> usize {
        self.chunks.lock().unwrap().len()
    }

    /// Flush the device and return every collected fragment in arrival
    /// order. Consumes the session; the device tracks are released even if
    /// the flush fails.
    pub async fn finalize(mut self) -> Vec<Vec<u8>> {
        if let Err(e) = self.device.finalize().await {
            warn!("device flush failed: {e}");
        }
        if let Some(pump) = self.pump.take() {
            match pump.await {
                Ok(received) => debug!(fragments = received, "capture pump drained"),
                Err(e) => warn!("capture pump failed: {e}"),
            }
        }
        let chunks = std::mem::take(&mut *self.chunks.lock().unwrap());
        info!(chunks = chunks.len(), "capture finalized");
        chunks
    }

    /// Hard stop: release the tracks and discard everything collected.
    /// Used on error paths where the flush result no longer matters.
    pub fn abort(mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        self.device.abort();
        let discarded = {
            let mut chunks = self.chunks.lock().unwrap();
            let n = chunks.len();
            chunks.clear();
            n
        };
        warn!(discarded, "capture aborted");
    }
}

impl Drop for AudioCaptureSession {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        // Never leave the microphone open; abort is idempotent.
        self.device.abort();
    }
}
