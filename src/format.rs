//! Canonical sample format shared by every segment, and the container types
//! segments and final outputs are written in.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Sample rate every segment is converted to (the speech service's native rate).
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("unreadable WAV file: {0}")]
    Wav(#[from] hound::Error),
    #[error("expected {expected}, found {found}")]
    Mismatch { expected: String, found: String },
}

/// Fixed sample rate / channel count / bit depth of every segment.
///
/// Keeping all segments in one format makes concatenation a plain join
/// followed by the optional loudness filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl Default for CanonicalFormat {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
            bits_per_sample: 16,
        }
    }
}

impl CanonicalFormat {
    /// ffmpeg codec name for PCM samples at this bit depth.
    pub fn pcm_codec(&self) -> String {
        match self.bits_per_sample {
            8 => "pcm_u8".to_string(),
            bits => format!("pcm_s{bits}le"),
        }
    }

    /// ffmpeg channel layout name used by the silence source.
    pub fn channel_layout(&self) -> String {
        match self.channels {
            1 => "mono".to_string(),
            2 => "stereo".to_string(),
            n => format!("{n}c"),
        }
    }

    pub fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: hound::SampleFormat::Int,
        }
    }

    /// Verify that the WAV file at `path` is in this format.
    ///
    /// Returns the duration of the file in seconds.
    pub fn check_wav(&self, path: &Path) -> Result<f64, FormatError> {
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let expected = self.wav_spec();
        if spec != expected {
            return Err(FormatError::Mismatch {
                expected: describe(&expected),
                found: describe(&spec),
            });
        }
        Ok(reader.duration() as f64 / spec.sample_rate as f64)
    }
}

fn describe(spec: &hound::WavSpec) -> String {
    format!(
        "{} Hz, {} ch, {}-bit {:?}",
        spec.sample_rate, spec.channels, spec.bits_per_sample, spec.sample_format
    )
}

/// Audio container, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioContainer {
    #[default]
    Wav,
    Mp3,
}

impl AudioContainer {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
        }
    }

    /// Infer the container from a path's extension (case-insensitive).
    ///
    /// Returns `None` for anything other than `.wav` / `.mp3`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::from_extension(&ext)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "wav" => Some(Self::Wav),
            "mp3" => Some(Self::Mp3),
            _ => None,
        }
    }
}

impl std::fmt::Display for AudioContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}
