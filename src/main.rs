use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use voicepipe::{
    Config, FileCaptureDevice, RecorderEvent, RecordingController, TranscriptionClient,
};

/// Batch-transcribe a recorded audio file through the capture pipeline.
#[derive(Parser, Debug)]
#[command(name = "voicepipe", version)]
struct Args {
    /// Configuration file (without extension).
    #[arg(short, long, default_value = "config/voicepipe")]
    config: String,

    /// Recorded audio file to transcribe.
    input: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config).context("failed to load configuration")?;

    info!(endpoint = %cfg.transcription.endpoint, "voicepipe v0.1.0");

    let client = TranscriptionClient::new(cfg.transcription.endpoint.clone());
    let input = args.input.clone();
    let (controller, mut events) = RecordingController::new(
        cfg.recorder_config(),
        client,
        Box::new(move || Box::new(FileCaptureDevice::new(&input))),
    );

    let reporter = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                RecorderEvent::StateChanged { state } => info!(?state, "recorder"),
                RecorderEvent::DurationCapReached => warn!("maximum recording time reached"),
                RecorderEvent::Failed { kind, message } => error!(?kind, "{message}"),
                RecorderEvent::TranscriptReady { .. } => {}
            }
        }
    });

    controller.start().await?;
    let transcript = controller.stop().await?;

    drop(controller);
    reporter.await.ok();

    match transcript {
        Some(text) if !text.is_empty() => println!("{text}"),
        _ => eprintln!("(no speech recognized)"),
    }

    Ok(())
}
