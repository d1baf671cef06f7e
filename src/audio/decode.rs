// Decoding of captured fragment bytes into per-channel float buffers.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::error::PipelineError;

/// Per-channel float samples decoded from the captured fragments, plus the
/// rate they were captured at. Derived once per stop and consumed by the
/// downmix/resample step.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// One buffer per channel, in channel order.
    pub channels: Vec<Vec<f32>>,
    /// Source sample rate in Hz.
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn duration_seconds(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }
}

/// Decode the concatenated fragment bytes into per-channel samples.
///
/// `format` is the negotiated fragment MIME type, used only as a probe
/// hint; symphonia identifies the actual container. Anything that cannot
/// be decoded as audio is a [`PipelineError::Decode`].
pub fn decode_fragments(data: &[u8], format: &str) -> Result<DecodedAudio, PipelineError> {
    if data.is_empty() {
        return Err(PipelineError::Decode("no audio data".into()));
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(data.to_vec())), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension_for_mime(format) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| PipelineError::Decode(format!("probe failed: {e}")))?;

    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| PipelineError::Decode("no audio track found".into()))?;

    let codec_params = track.codec_params.clone();
    let track_id = track.id;
    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| PipelineError::Decode("source sample rate unknown".into()))?;
    let channel_count = codec_params.channels.map_or(1, |c| c.count());

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| PipelineError::Decode(format!("codec init failed: {e}")))?;

    let mut channels: Vec<Vec<f32>> = vec![Vec::new(); channel_count];

    loop {
        let packet = match reader.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(PipelineError::Decode(format!("packet read: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| PipelineError::Decode(format!("decode: {e}")))?;

        let spec = *decoded.spec();
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        for frame in sample_buf.samples().chunks(channel_count) {
            for (ch, &sample) in frame.iter().enumerate() {
                channels[ch].push(sample);
            }
        }
    }

    let audio = DecodedAudio {
        channels,
        sample_rate,
    };
    if audio.is_empty() {
        return Err(PipelineError::Decode("no samples decoded".into()));
    }

    debug!(
        channels = audio.channel_count(),
        sample_rate = audio.sample_rate,
        samples = audio.len(),
        "decoded captured audio"
    );
    Ok(audio)
}

fn extension_for_mime(mime: &str) -> Option<&'static str> {
    // Parameters like ";codecs=..." are not part of the container hint.
    let base = mime.split(';').next().unwrap_or(mime).trim();
    match base {
        "audio/wav" | "audio/wave" | "audio/x-wav" => Some("wav"),
        "audio/flac" | "audio/x-flac" => Some("flac"),
        "audio/ogg" => Some("ogg"),
        "audio/mpeg" | "audio/mp3" => Some("mp3"),
        _ => None,
    }
}
