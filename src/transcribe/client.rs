use reqwest::multipart;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::PipelineError;

/// Success body of the transcription endpoint.
#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    #[serde(default)]
    transcription: Option<String>,
}

/// Failure body of the transcription endpoint. The message is optional.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Uploads encoded recordings and parses the result.
///
/// Retry policy belongs to the caller; nothing here is retried.
#[derive(Debug, Clone)]
pub struct TranscriptionClient {
    http: reqwest::Client,
    endpoint: String,
}

impl TranscriptionClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Upload a WAV container as the multipart `audio` field and return
    /// the transcript. An empty transcript is a valid outcome (no speech),
    /// not an error.
    pub async fn transcribe(&self, wav: Vec<u8>) -> Result<String, PipelineError> {
        debug!(bytes = wav.len(), endpoint = %self.endpoint, "uploading recording");

        let part = multipart::Part::bytes(wav)
            .file_name("recording.wav")
            .mime_str("audio/wav")
            .map_err(|e| PipelineError::TranscriptionFailed(format!("invalid upload part: {e}")))?;
        let form = multipart::Form::new().part("audio", part);

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PipelineError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| format!("transcription service returned {status}"));
            return Err(PipelineError::TranscriptionFailed(message));
        }

        let parsed: TranscribeResponse = serde_json::from_slice(&body)
            .map_err(|e| PipelineError::TranscriptionFailed(format!("malformed response: {e}")))?;
        let text = parsed.transcription.unwrap_or_default();
        info!(chars = text.len(), "transcription received");
        Ok(text)
    }
}
