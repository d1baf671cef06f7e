pub mod audio;
pub mod config;
pub mod error;
pub mod recorder;
pub mod transcribe;

pub use audio::{
    decode_fragments, downmix, encode_wav, resample, AudioCaptureSession, AudioFragment,
    CaptureConfig, CaptureDevice, DecodedAudio, FileCaptureDevice, TARGET_SAMPLE_RATE,
    WAV_HEADER_LEN,
};
pub use config::Config;
pub use error::{ErrorKind, PipelineError};
pub use recorder::{
    DeviceFactory, RecorderConfig, RecorderEvent, RecorderState, RecorderStats,
    RecordingController,
};
pub use transcribe::TranscriptionClient;
