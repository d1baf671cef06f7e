use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audio::{
    decode_fragments, downmix, encode_wav, resample, AudioCaptureSession, CaptureDevice,
};
use crate::error::PipelineError;
use crate::transcribe::TranscriptionClient;

use super::{RecorderConfig, RecorderEvent, RecorderState, RecorderStats};

/// Produces a fresh capture device handle for each recording.
pub type DeviceFactory = Box<dyn Fn() -> Box<dyn CaptureDevice> + Send + Sync>;

/// Orchestrates one recording at a time: capture, transcode, upload.
///
/// All external triggers funnel through `start`, `stop` and the armed cap
/// timer; the session is only mutated with the controller lock held, so
/// between suspension points nothing else touches it. Controllers are
/// plain instances; several may run in sequence without shared state.
pub struct RecordingController {
    config: RecorderConfig,
    client: TranscriptionClient,
    devices: DeviceFactory,
    events: mpsc::Sender<RecorderEvent>,
    inner: Mutex<Inner>,
    /// Bumped on every start and stop. A cap timer that lost the race to
    /// an explicit stop sees a stale generation and does nothing.
    generation: AtomicU64,
}

#[derive(Default)]
struct Inner {
    state: RecorderState,
    session: Option<AudioCaptureSession>,
    recording_id: Option<Uuid>,
    started: Option<(Instant, DateTime<Utc>)>,
}

impl RecordingController {
    /// Create a controller and the event stream consumed by the UI
    /// adapter.
    pub fn new(
        config: RecorderConfig,
        client: TranscriptionClient,
        devices: DeviceFactory,
    ) -> (Arc<Self>, mpsc::Receiver<RecorderEvent>) {
        let (events, events_rx) = mpsc::channel(64);
        let controller = Arc::new(Self {
            config,
            client,
            devices,
            events,
            inner: Mutex::new(Inner::default()),
            generation: AtomicU64::new(0),
        });
        (controller, events_rx)
    }

    /// Begin a new recording. Valid only from `Idle`; while another
    /// recording is active the call is rejected and the active session is
    /// left untouched.
    pub async fn start(self: &Arc<Self>) -> Result<(), PipelineError> {
        let mut inner = self.inner.lock().await;

        if inner.state != RecorderState::Idle {
            let err = PipelineError::AlreadyRecording;
            warn!(state = ?inner.state, "start rejected: {err}");
            self.emit(RecorderEvent::Failed {
                kind: err.kind(),
                message: err.to_string(),
            })
            .await;
            return Err(err);
        }

        let recording_id = Uuid::new_v4();
        info!(%recording_id, "starting recording");

        let device = (self.devices)();
        let session = match AudioCaptureSession::open(device, &self.config.capture).await {
            Ok(session) => session,
            Err(e) => {
                let err = PipelineError::PermissionDenied(e.to_string());
                error!("capture device unavailable: {e:#}");
                self.set_state(&mut inner, RecorderState::Error).await;
                self.emit(RecorderEvent::Failed {
                    kind: err.kind(),
                    message: err.to_string(),
                })
                .await;
                self.set_state(&mut inner, RecorderState::Idle).await;
                return Err(err);
            }
        };

        inner.session = Some(session);
        inner.recording_id = Some(recording_id);
        inner.started = Some((Instant::now(), Utc::now()));
        self.set_state(&mut inner, RecorderState::Recording).await;

        // Arm the hard cap. The watchdog holds a weak handle so a dropped
        // controller is not kept alive for the remainder of the sleep.
        let armed = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let watchdog = Arc::downgrade(self);
        let cap = self.config.max_duration;
        tokio::spawn(async move {
            tokio::time::sleep(cap).await;
            if let Some(controller) = watchdog.upgrade() {
                controller.cap_timer_fired(armed).await;
            }
        });

        Ok(())
    }

    /// Stop the active recording and run the processing pipeline through
    /// to a transcript. Valid only from `Recording`; a stray stop in any
    /// other state is ignored and returns `Ok(None)`.
    pub async fn stop(&self) -> Result<Option<String>, PipelineError> {
        let mut inner = self.inner.lock().await;

        if inner.state != RecorderState::Recording {
            warn!(state = ?inner.state, "stop ignored: no active recording");
            return Ok(None);
        }

        // Disarm the cap timer before anything else.
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.finish(&mut inner).await.map(Some)
    }

    /// Snapshot for status displays.
    pub async fn stats(&self) -> RecorderStats {
        let inner = self.inner.lock().await;
        RecorderStats {
            state: inner.state,
            recording_id: inner.recording_id,
            started_at: inner.started.map(|(_, wall)| wall),
            duration_secs: inner
                .started
                .map(|(instant, _)| instant.elapsed().as_secs_f64())
                .unwrap_or(0.0),
            chunks_collected: inner
                .session
                .as_ref()
                .map(AudioCaptureSession::chunk_count)
                .unwrap_or(0),
        }
    }

    pub async fn state(&self) -> RecorderState {
        self.inner.lock().await.state
    }

    /// Invoked by the armed watchdog when the hard cap elapses. An
    /// explicit stop that already won the race left a stale generation
    /// behind, and the firing is a silent no-op.
    async fn cap_timer_fired(&self, armed: u64) {
        let mut inner = self.inner.lock().await;

        if self.generation.load(Ordering::SeqCst) != armed
            || inner.state != RecorderState::Recording
        {
            debug!("duration cap fired after stop; ignoring");
            return;
        }
        self.generation.fetch_add(1, Ordering::SeqCst);

        warn!(
            "maximum recording duration of {:?} reached; stopping",
            self.config.max_duration
        );
        self.emit(RecorderEvent::DurationCapReached).await;
        let _ = self.finish(&mut inner).await;
    }

    /// The stop path: finalize capture, transcode, upload. Ends in `Idle`
    /// regardless of outcome, with the device released and the chunk
    /// buffer cleared.
    async fn finish(&self, inner: &mut Inner) -> Result<String, PipelineError> {
        self.set_state(inner, RecorderState::Stopping).await;

        let Some(session) = inner.session.take() else {
            return self.fail(inner, PipelineError::EmptyRecording).await;
        };
        let format = session.format().to_string();
        let chunks = session.finalize().await;

        self.set_state(inner, RecorderState::Processing).await;

        if chunks.is_empty() {
            return self.fail(inner, PipelineError::EmptyRecording).await;
        }

        let total: usize = chunks.iter().map(Vec::len).sum();
        debug!(chunks = chunks.len(), bytes = total, "processing captured audio");
        let mut data = Vec::with_capacity(total);
        for chunk in &chunks {
            data.extend_from_slice(chunk);
        }

        match self.process(data, &format).await {
            Ok(text) => {
                self.emit(RecorderEvent::TranscriptReady { text: text.clone() })
                    .await;
                self.cleanup(inner);
                self.set_state(inner, RecorderState::Idle).await;
                info!(chars = text.len(), "recording transcribed");
                Ok(text)
            }
            Err(err) => self.fail(inner, err).await,
        }
    }

    /// Decode, downmix, resample, encode, transcribe.
    async fn process(&self, data: Vec<u8>, format: &str) -> Result<String, PipelineError> {
        let decoded = decode_fragments(&data, format)?;
        debug!(
            seconds = decoded.duration_seconds(),
            channels = decoded.channel_count(),
            "decoded recording"
        );
        let mono = downmix(&decoded);
        let resampled = resample(&mono, decoded.sample_rate, self.config.target_sample_rate);
        debug!(
            source_rate = decoded.sample_rate,
            target_rate = self.config.target_sample_rate,
            samples = resampled.len(),
            "transcoded to mono"
        );
        let wav = encode_wav(&resampled, self.config.target_sample_rate);
        self.client.transcribe(wav).await
    }

    async fn fail(&self, inner: &mut Inner, err: PipelineError) -> Result<String, PipelineError> {
        error!("pipeline failed: {err}");
        self.set_state(inner, RecorderState::Error).await;
        self.emit(RecorderEvent::Failed {
            kind: err.kind(),
            message: err.to_string(),
        })
        .await;
        self.cleanup(inner);
        self.set_state(inner, RecorderState::Idle).await;
        Err(err)
    }

    /// Release the capture device and forget the session. Runs on every
    /// terminal transition, success or failure.
    fn cleanup(&self, inner: &mut Inner) {
        if let Some(session) = inner.session.take() {
            session.abort();
        }
        inner.recording_id = None;
        inner.started = None;
    }

    async fn set_state(&self, inner: &mut Inner, state: RecorderState) {
        if inner.state == state {
            return;
        }
        debug!(from = ?inner.state, to = ?state, "state transition");
        inner.state = state;
        self.emit(RecorderEvent::StateChanged { state }).await;
    }

    async fn emit(&self, event: RecorderEvent) {
        if self.events.send(event).await.is_err() {
            debug!("event receiver dropped");
        }
    }
}
