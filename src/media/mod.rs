//! External media tool boundary.
//!
//! The pipeline needs three things from a media tool: transcode one file into
//! the canonical format, generate silence, and concatenate an ordered list of
//! segments into the final output. [`FfmpegTool`] provides them by running
//! `ffmpeg` as a child process.
//!
//! # System Requirements
//!
//! **ffmpeg** must be installed and on `PATH` (or configured explicitly with
//! [`FfmpegTool::with_program`]):
//! - **Linux**: `sudo apt-get install ffmpeg`
//! - **macOS**: `brew install ffmpeg`
//! - **Windows**: Download a build from <https://ffmpeg.org/download.html>

pub mod ffmpeg;

use std::path::{Path, PathBuf};

use crate::assemble::LoudnessTarget;
use crate::format::{AudioContainer, CanonicalFormat};

pub use ffmpeg::FfmpegTool;

#[derive(thiserror::Error, Debug)]
pub enum MediaError {
    #[error(
        "{program} not found. Install: Linux: `sudo apt-get install ffmpeg`, \
         macOS: `brew install ffmpeg`, Windows: https://ffmpeg.org/download.html"
    )]
    NotFound { program: PathBuf },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{operation} exited with code {code:?}: {stderr}")]
    Failed {
        operation: &'static str,
        code: Option<i32>,
        stderr: String,
    },
}

/// Options for the final concatenation.
#[derive(Debug, Clone, Default)]
pub struct ConcatOptions {
    /// Loudness normalization filter, if any.
    pub loudness: Option<LoudnessTarget>,
    /// Sample format forced onto WAV and MP3 outputs.
    pub format: CanonicalFormat,
    /// Container inferred from the output path; `None` leaves encoding to the tool.
    pub container: Option<AudioContainer>,
}

/// Media operations the pipeline delegates to an external tool.
pub trait MediaTool {
    /// Fail early if the tool cannot be run at all.
    fn ensure_available(&self) -> Result<(), MediaError>;

    /// Convert `src` into `format`, written to `dst` in `container`.
    fn transcode(
        &self,
        src: &Path,
        dst: &Path,
        format: &CanonicalFormat,
        container: AudioContainer,
    ) -> Result<(), MediaError>;

    /// Write `seconds` of silence in `format` to `dst`.
    fn silence(
        &self,
        seconds: f64,
        dst: &Path,
        format: &CanonicalFormat,
        container: AudioContainer,
    ) -> Result<(), MediaError>;

    /// Concatenate the files listed in `manifest`, in order, into `output`.
    fn concat(
        &self,
        manifest: &Path,
        output: &Path,
        options: &ConcatOptions,
    ) -> Result<(), MediaError>;
}
