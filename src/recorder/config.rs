use std::time::Duration;

use crate::audio::{CaptureConfig, TARGET_SAMPLE_RATE};

/// Configuration for a recording controller.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Hard cap on a single recording. Reaching it forces a stop and still
    /// attempts transcription over whatever was captured.
    pub max_duration: Duration,

    /// Sample rate of the encoded container handed to transcription.
    pub target_sample_rate: u32,

    /// Capture device hints and fragment negotiation.
    pub capture: CaptureConfig,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_millis(120_000),
            target_sample_rate: TARGET_SAMPLE_RATE,
            capture: CaptureConfig::default(),
        }
    }
}
