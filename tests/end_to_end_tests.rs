// End-to-end tests: file-backed capture device, full controller pipeline,
// and a local transcription endpoint.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use voicepipe::{
    encode_wav, FileCaptureDevice, PipelineError, RecorderConfig, RecorderEvent, RecorderState,
    RecordingController, TranscriptionClient, TARGET_SAMPLE_RATE,
};

/// Bind a router on an ephemeral port and return the endpoint URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api/transcribe")
}

/// Endpoint that checks the multipart `audio` field carries a WAV
/// container and answers with a fixed transcript.
fn transcribing_app() -> Router {
    async fn transcribe(mut multipart: Multipart) -> (StatusCode, Json<Value>) {
        while let Some(field) = multipart.next_field().await.unwrap() {
            if field.name() == Some("audio") {
                let bytes = field.bytes().await.unwrap();
                if !bytes.starts_with(b"RIFF") || bytes.len() < 44 {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(json!({"error": "not a WAV container"})),
                    );
                }
                return (
                    StatusCode::OK,
                    Json(json!({"transcription": "hello world"})),
                );
            }
        }
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "missing audio field"})),
        )
    }
    Router::new().route("/api/transcribe", post(transcribe))
}

/// A temp WAV file of 0.2 seconds of quiet tone.
fn fixture_wav() -> tempfile::NamedTempFile {
    let samples: Vec<f32> = (0..3200)
        .map(|i| 0.2 * (i as f32 * std::f32::consts::TAU * 440.0 / 16000.0).sin())
        .collect();
    let wav = encode_wav(&samples, TARGET_SAMPLE_RATE);

    let mut file = tempfile::Builder::new()
        .prefix("voicepipe-fixture")
        .suffix(".wav")
        .tempfile()
        .unwrap();
    file.write_all(&wav).unwrap();
    file.flush().unwrap();
    file
}

fn file_controller(
    fixture: &tempfile::NamedTempFile,
    endpoint: String,
    config: RecorderConfig,
) -> (Arc<RecordingController>, mpsc::Receiver<RecorderEvent>) {
    let path = fixture.path().to_path_buf();
    RecordingController::new(
        config,
        TranscriptionClient::new(endpoint),
        Box::new(move || Box::new(FileCaptureDevice::new(&path).with_fragment_bytes(1000))),
    )
}

fn drain(events: &mut mpsc::Receiver<RecorderEvent>) -> Vec<RecorderEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

#[tokio::test]
async fn test_record_and_transcribe() {
    let endpoint = serve(transcribing_app()).await;
    let fixture = fixture_wav();
    let (controller, mut events) =
        file_controller(&fixture, endpoint, RecorderConfig::default());

    controller.start().await.unwrap();
    let transcript = controller.stop().await.unwrap();

    assert_eq!(transcript.as_deref(), Some("hello world"));
    assert_eq!(controller.state().await, RecorderState::Idle);

    let seen = drain(&mut events);
    assert!(seen
        .iter()
        .any(|event| matches!(event, RecorderEvent::TranscriptReady { text } if text == "hello world")));
    assert!(matches!(
        seen.last(),
        Some(RecorderEvent::StateChanged {
            state: RecorderState::Idle
        })
    ));
}

#[tokio::test]
async fn test_server_error_surfaces_transcription_failed() {
    async fn failing() -> (StatusCode, Json<Value>) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "model exploded"})),
        )
    }
    let endpoint = serve(Router::new().route("/api/transcribe", post(failing))).await;
    let fixture = fixture_wav();
    let (controller, _events) =
        file_controller(&fixture, endpoint, RecorderConfig::default());

    controller.start().await.unwrap();
    let err = controller.stop().await.unwrap_err();

    match err {
        PipelineError::TranscriptionFailed(message) => assert_eq!(message, "model exploded"),
        other => panic!("expected TranscriptionFailed, got {other:?}"),
    }
    assert_eq!(controller.state().await, RecorderState::Idle);
}

#[tokio::test]
async fn test_server_error_without_message_uses_status() {
    async fn failing() -> StatusCode {
        StatusCode::SERVICE_UNAVAILABLE
    }
    let endpoint = serve(Router::new().route("/api/transcribe", post(failing))).await;
    let fixture = fixture_wav();
    let (controller, _events) =
        file_controller(&fixture, endpoint, RecorderConfig::default());

    controller.start().await.unwrap();
    let err = controller.stop().await.unwrap_err();

    match err {
        PipelineError::TranscriptionFailed(message) => {
            assert!(message.contains("503"), "got: {message}")
        }
        other => panic!("expected TranscriptionFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_transcription_field_is_empty_transcript() {
    async fn silent() -> Json<Value> {
        Json(json!({}))
    }
    let endpoint = serve(Router::new().route("/api/transcribe", post(silent))).await;
    let fixture = fixture_wav();
    let (controller, _events) =
        file_controller(&fixture, endpoint, RecorderConfig::default());

    controller.start().await.unwrap();
    let transcript = controller.stop().await.unwrap();

    // Absence of speech is not an error.
    assert_eq!(transcript.as_deref(), Some(""));
    assert_eq!(controller.state().await, RecorderState::Idle);
}

#[tokio::test]
async fn test_duration_cap_still_produces_a_transcript() {
    let endpoint = serve(transcribing_app()).await;
    let fixture = fixture_wav();
    let config = RecorderConfig {
        max_duration: Duration::from_millis(150),
        ..RecorderConfig::default()
    };

    // A paced device is still mid-replay when the cap fires; the finalize
    // flush must deliver the rest before processing starts.
    let path = fixture.path().to_path_buf();
    let (controller, mut events) = RecordingController::new(
        config,
        TranscriptionClient::new(endpoint),
        Box::new(move || {
            Box::new(
                FileCaptureDevice::new(&path)
                    .with_fragment_bytes(1000)
                    .paced(),
            )
        }),
    );

    controller.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(controller.state().await, RecorderState::Idle);
    let seen = drain(&mut events);
    assert!(seen
        .iter()
        .any(|event| matches!(event, RecorderEvent::DurationCapReached)));
    assert!(seen
        .iter()
        .any(|event| matches!(event, RecorderEvent::TranscriptReady { text } if text == "hello world")));
}
