//! The recording state machine.
//!
//! This module provides the `RecordingController` abstraction that manages:
//! - Capture session lifecycle (open, fragment collection, release)
//! - The hard duration cap on runaway recordings
//! - The stop-time transcoding pipeline (decode, downmix/resample, encode)
//! - The transcription upload and its failure paths

mod config;
mod controller;
mod events;
mod stats;

pub use config::RecorderConfig;
pub use controller::{DeviceFactory, RecordingController};
pub use events::{RecorderEvent, RecorderState};
pub use stats::RecorderStats;
