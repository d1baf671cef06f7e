//! Upload of encoded recordings to the transcription endpoint.

mod client;

pub use client::TranscriptionClient;
