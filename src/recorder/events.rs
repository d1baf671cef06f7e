use serde::Serialize;

use crate::error::ErrorKind;

/// Controller lifecycle states.
///
/// `Error` is transient: every failure passes through it and resolves back
/// to `Idle` with the capture device released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
    Stopping,
    Processing,
    Error,
}

/// Events surfaced to the UI adapter.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RecorderEvent {
    StateChanged { state: RecorderState },
    TranscriptReady { text: String },
    Failed { kind: ErrorKind, message: String },
    /// The hard duration cap stopped the recording. Informational; a
    /// transcription attempt over the captured audio still follows.
    DurationCapReached,
}
