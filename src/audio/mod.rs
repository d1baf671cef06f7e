pub mod capture;
pub mod decode;
pub mod file;
pub mod resample;
pub mod wav;

pub use capture::{negotiate_format, AudioCaptureSession, AudioFragment, CaptureConfig, CaptureDevice};
pub use decode::{decode_fragments, DecodedAudio};
pub use file::FileCaptureDevice;
pub use resample::{downmix, resample};
pub use wav::{encode_wav, TARGET_SAMPLE_RATE, WAV_HEADER_LEN};
