use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

use crate::audio::CaptureConfig;
use crate::recorder::RecorderConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub transcription: TranscriptionConfig,
    pub recorder: RecorderSettings,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptionConfig {
    /// Upload endpoint, e.g. "http://localhost:8080/api/transcribe".
    pub endpoint: String,
}

#[derive(Debug, Deserialize)]
pub struct RecorderSettings {
    pub max_duration_ms: u64,
    pub target_sample_rate: u32,
    pub slice_interval_ms: u64,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn recorder_config(&self) -> RecorderConfig {
        RecorderConfig {
            max_duration: Duration::from_millis(self.recorder.max_duration_ms),
            target_sample_rate: self.recorder.target_sample_rate,
            capture: CaptureConfig {
                slice_interval_ms: self.recorder.slice_interval_ms,
                ..CaptureConfig::default()
            },
        }
    }
}
