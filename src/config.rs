//! Pipeline configuration.
//!
//! [`PipelineConfig`] is an explicit, immutable value handed to the
//! [`Pipeline`](crate::pipeline::Pipeline); nothing is read from global state.
//! It can be built in code with [`PipelineConfigBuilder`] or loaded from a
//! JSON file with [`ConfigFile`]:
//!
//! ```json
//! {
//!   "voices": { "NARRATOR": "alloy", "BECCA": "nova" },
//!   "fallback_speaker": "NARRATOR",
//!   "aliases": [{ "pattern": "\\bA\\.L\\.I\\.E\\.", "replacement": "Allie" }],
//!   "interline_pause": 0.25,
//!   "loudness": { "integrated_lufs": -16, "true_peak_db": -1.5, "loudness_range": 11 },
//!   "segment_format": "wav",
//!   "model": "gpt-4o-mini-tts"
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::Deserialize;

use crate::assemble::LoudnessTarget;
use crate::error::PipelineError;
use crate::format::{AudioContainer, CanonicalFormat};
use crate::normalize::PronunciationAliases;
use crate::script::DEFAULT_FALLBACK_PAUSE;
use crate::voices::{VoiceMap, DEFAULT_FALLBACK_SPEAKER};

/// Pause appended after every dialogue line, in seconds.
pub const DEFAULT_INTERLINE_PAUSE: f64 = 0.25;

/// Directory segments are written to when none is configured.
pub const DEFAULT_WORK_DIR: &str = "output_build";

/// Everything a pipeline run needs besides the engine and media tool.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), default, build_fn(validate = "Self::validate"))]
pub struct PipelineConfig {
    /// Directory holding every segment file; kept after the run.
    pub work_dir: PathBuf,
    pub voices: VoiceMap,
    pub aliases: PronunciationAliases,
    /// Sample format every segment is converted to.
    pub format: CanonicalFormat,
    /// Container of the per-segment files.
    pub segment_container: AudioContainer,
    pub interline_pause: f64,
    /// Used for `[PAUSE=...]` rows whose value does not parse.
    pub fallback_pause: f64,
    /// `None` disables loudness normalization.
    pub loudness: Option<LoudnessTarget>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
            voices: VoiceMap::default(),
            aliases: PronunciationAliases::default(),
            format: CanonicalFormat::default(),
            segment_container: AudioContainer::Wav,
            interline_pause: DEFAULT_INTERLINE_PAUSE,
            fallback_pause: DEFAULT_FALLBACK_PAUSE,
            loudness: Some(LoudnessTarget::default()),
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

impl PipelineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("interline_pause", self.interline_pause),
            ("fallback_pause", self.fallback_pause),
        ] {
            if let Some(seconds) = value {
                if !seconds.is_finite() || seconds < 0.0 {
                    return Err(format!(
                        "{name} must be a non-negative number of seconds, got {seconds}"
                    ));
                }
            }
        }
        if let Some(format) = &self.format {
            if format.sample_rate == 0 || format.channels == 0 {
                return Err("sample rate and channel count must be non-zero".to_string());
            }
            if !matches!(format.bits_per_sample, 8 | 16 | 24 | 32) {
                return Err(format!(
                    "unsupported bit depth {}",
                    format.bits_per_sample
                ));
            }
        }
        Ok(())
    }
}

/// One pronunciation alias in a config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AliasEntry {
    pub pattern: String,
    pub replacement: String,
}

/// JSON configuration file. Every field is optional and overrides the
/// corresponding default.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub voices: Option<BTreeMap<String, String>>,
    pub fallback_speaker: Option<String>,
    pub aliases: Option<Vec<AliasEntry>>,
    pub interline_pause: Option<f64>,
    pub fallback_pause: Option<f64>,
    /// `false` disables loudness normalization.
    pub loudnorm: Option<bool>,
    pub loudness: Option<LoudnessTarget>,
    pub segment_format: Option<AudioContainer>,
    pub sample_rate: Option<u32>,
    pub work_dir: Option<PathBuf>,
    /// Speech model identifier, passed to the synthesis engine.
    pub model: Option<String>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|message| PipelineError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        serde_json::from_str(content).map_err(|e| e.to_string())
    }

    /// Apply the file's settings on top of `builder`.
    pub fn apply(&self, builder: &mut PipelineConfigBuilder) -> Result<(), PipelineError> {
        let fallback = self
            .fallback_speaker
            .as_deref()
            .unwrap_or(DEFAULT_FALLBACK_SPEAKER);
        match &self.voices {
            Some(voices) => {
                builder.voices(VoiceMap::new(voices, fallback)?);
            }
            None if self.fallback_speaker.is_some() => {
                builder.voices(VoiceMap::default().with_fallback(fallback)?);
            }
            None => {}
        }

        if let Some(aliases) = &self.aliases {
            builder.aliases(PronunciationAliases::new(
                aliases
                    .iter()
                    .map(|a| (a.pattern.as_str(), a.replacement.as_str())),
            )?);
        }
        if let Some(seconds) = self.interline_pause {
            builder.interline_pause(seconds);
        }
        if let Some(seconds) = self.fallback_pause {
            builder.fallback_pause(seconds);
        }
        if let Some(container) = self.segment_format {
            builder.segment_container(container);
        }
        if let Some(sample_rate) = self.sample_rate {
            builder.format(CanonicalFormat {
                sample_rate,
                ..CanonicalFormat::default()
            });
        }
        if let Some(dir) = &self.work_dir {
            builder.work_dir(dir.clone());
        }

        match (self.loudnorm, self.loudness) {
            (Some(false), _) => {
                builder.loudness(None::<LoudnessTarget>);
            }
            (_, Some(target)) => {
                builder.loudness(target);
            }
            _ => {}
        }
        Ok(())
    }
}
