use serde::Serialize;
use thiserror::Error;

/// Failures the pipeline can surface to the UI adapter.
///
/// Every variant recovers locally: the controller returns to idle with the
/// capture device released. None are retried internally.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Device access was refused or the device is unavailable. Fatal to
    /// this attempt; the user must retry.
    #[error("microphone unavailable: {0}")]
    PermissionDenied(String),

    /// `start` was called while a recording is active. Rejected without
    /// touching the active session.
    #[error("a recording is already in progress")]
    AlreadyRecording,

    /// The recording stopped with zero captured fragments.
    #[error("recording produced no audio")]
    EmptyRecording,

    /// The concatenated fragments could not be decoded as audio.
    #[error("captured audio could not be decoded: {0}")]
    Decode(String),

    /// The transcription endpoint answered with a non-success status.
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),

    /// The transcription endpoint could not be reached.
    #[error("transcription service unreachable: {0}")]
    Network(String),
}

/// Machine-readable error category, emitted alongside the human-readable
/// message in failure events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    PermissionDenied,
    AlreadyRecording,
    EmptyRecording,
    DecodeError,
    TranscriptionFailed,
    NetworkError,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::AlreadyRecording => ErrorKind::AlreadyRecording,
            Self::EmptyRecording => ErrorKind::EmptyRecording,
            Self::Decode(_) => ErrorKind::DecodeError,
            Self::TranscriptionFailed(_) => ErrorKind::TranscriptionFailed,
            Self::Network(_) => ErrorKind::NetworkError,
        }
    }
}
