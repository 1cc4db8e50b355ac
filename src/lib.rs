//! # tts-stitch
//!
//! Turn a script of `SPEAKER|line` rows and `[PAUSE=seconds]` markers into a
//! single audiobook-style audio file.
//!
//! ## Pipeline
//!
//! 1. The script is parsed row by row ([`script`]).
//! 2. Each dialogue line is normalized ([`normalize`]), mapped to a voice
//!    ([`voices`]) and sent to a [`SynthesisEngine`]; the result is converted
//!    into the [`CanonicalFormat`](format::CanonicalFormat) ([`segment`]).
//! 3. A short pause follows every line; pause rows produce silence.
//! 4. All segments are concatenated in order and loudness-normalized by the
//!    [`MediaTool`](media::MediaTool) ([`assemble`]).
//!
//! Segment files are kept in the work directory after the run so single lines
//! can be inspected or re-taken.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! tts-stitch = { version = "2026.10", features = ["openai"] }
//! ```
//!
//! ```ignore
//! use std::path::Path;
//! use tts_stitch::{
//!     config::PipelineConfig,
//!     engines::openai::{OpenAiEngine, OpenAiParams},
//!     media::FfmpegTool,
//!     pipeline::Pipeline,
//! };
//!
//! let engine = OpenAiEngine::new(OpenAiParams::from_env()?)?;
//! let mut pipeline = Pipeline::new(PipelineConfig::default(), engine, FfmpegTool::new());
//! let summary = pipeline.run(Path::new("script.csv"), Path::new("book.wav"))?;
//! println!("{} segments", summary.segments.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod assemble;
pub mod config;
pub mod engines;
pub mod error;
pub mod format;
pub mod media;
pub mod normalize;
pub mod pipeline;
pub mod script;
pub mod segment;
pub mod voices;

use std::path::Path;

pub use error::{BoxError, PipelineError};
use format::AudioContainer;

/// Common interface for text-to-speech services.
///
/// An engine turns one line of text in one voice into an encoded audio file.
/// The pipeline converts that file into the canonical segment format
/// afterwards, so engines only need to report which container they write.
pub trait SynthesisEngine {
    /// Container of the files written by [`synthesize_to_file`](Self::synthesize_to_file).
    fn native_container(&self) -> AudioContainer;

    /// Synthesize `text` spoken by `voice` and write the encoded audio to `path`.
    fn synthesize_to_file(&mut self, text: &str, voice: &str, path: &Path) -> Result<(), BoxError>;
}
