// Downmix and sample-rate conversion for decoded capture audio.
//
// Both transforms are pure: the output depends only on the input, which
// keeps the transcoding step testable without any capture hardware.

use super::decode::DecodedAudio;

/// Collapse all channels into one by per-index arithmetic mean.
///
/// A single channel passes through unchanged. Channels of unequal length
/// are padded with silence to the longest.
pub fn downmix(audio: &DecodedAudio) -> Vec<f32> {
    match audio.channels.len() {
        0 => Vec::new(),
        1 => audio.channels[0].clone(),
        n => {
            let len = audio.channels.iter().map(Vec::len).max().unwrap_or(0);
            (0..len)
                .map(|i| {
                    let sum: f32 = audio
                        .channels
                        .iter()
                        .map(|ch| ch.get(i).copied().unwrap_or(0.0))
                        .sum();
                    sum / n as f32
                })
                .collect()
        }
    }
}

/// Resample a mono buffer by linear interpolation.
///
/// The output length is exactly `ceil(len * target_rate / source_rate)`.
/// Equal rates pass the buffer through unchanged; a zero rate or empty
/// input yields an empty buffer.
pub fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if samples.is_empty() || source_rate == 0 || target_rate == 0 {
        return Vec::new();
    }
    if source_rate == target_rate {
        return samples.to_vec();
    }

    let out_len = {
        let numer = samples.len() as u64 * target_rate as u64;
        let denom = source_rate as u64;
        ((numer + denom - 1) / denom) as usize
    };

    let step = source_rate as f64 / target_rate as f64;
    let last = samples.len() - 1;
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let pos = i as f64 * step;
        let idx = (pos as usize).min(last);
        let next = (idx + 1).min(last);
        let frac = (pos - idx as f64) as f32;
        out.push(samples[idx] + (samples[next] - samples[idx]) * frac);
    }
    out
}
