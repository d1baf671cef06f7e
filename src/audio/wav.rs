/// Sample rate of the container handed to the transcription service.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Bytes occupied by the RIFF/WAVE header preceding the sample data.
pub const WAV_HEADER_LEN: usize = 44;

/// Encode mono float samples as a 16-bit PCM WAV container.
///
/// The layout is a fixed 44-byte header (all fields little-endian) followed
/// by the quantized samples. This is pure data-to-bytes logic with no host
/// dependency so it can be tested in isolation.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let data_size = (samples.len() * 2) as u32;

    let mut buf = Vec::with_capacity(WAV_HEADER_LEN + samples.len() * 2);
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // "fmt " subchunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&1u16.to_le_bytes()); // mono
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&(sample_rate * 2).to_le_bytes()); // byte rate
    buf.extend_from_slice(&2u16.to_le_bytes()); // block align
    buf.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    // "data" subchunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&quantize(sample).to_le_bytes());
    }

    buf
}

/// Clamp to [-1, 1] and scale to a signed 16-bit integer: negative values
/// against 32768, non-negative against 32767, truncating. Non-finite
/// samples become silence.
fn quantize(sample: f32) -> i16 {
    if !sample.is_finite() {
        return 0;
    }
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32768.0) as i16
    } else {
        (clamped * 32767.0) as i16
    }
}
