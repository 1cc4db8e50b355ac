use std::path::PathBuf;

use crate::config::PipelineConfigBuilderError;
use crate::format::FormatError;
use crate::media::MediaError;

/// Boxed error returned across the [`SynthesisEngine`](crate::SynthesisEngine) boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that abort a pipeline run.
///
/// Silence generation failures and malformed pause values never show up
/// here: they are replaced by a placeholder segment and a default duration.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("media tool unavailable: {0}")]
    MediaUnavailable(#[source] MediaError),
    #[error("synthesis failed for segment {index:05} (voice '{voice}'): {source}")]
    Synthesis {
        index: usize,
        voice: String,
        #[source]
        source: BoxError,
    },
    #[error("transcode failed for segment {index:05}: {source}")]
    Transcode {
        index: usize,
        #[source]
        source: MediaError,
    },
    #[error("segment {index:05} is not in the canonical format: {source}")]
    Format {
        index: usize,
        #[source]
        source: FormatError,
    },
    #[error("assembling {} failed: {source}", .output.display())]
    Assemble {
        output: PathBuf,
        #[source]
        source: MediaError,
    },
    #[error("failed to read script {}: {source}", .path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("voice map has no entry for the fallback speaker '{0}'")]
    MissingFallbackVoice(String),
    #[error("invalid pronunciation alias pattern '{pattern}': {source}")]
    Alias {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid config file {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(#[from] PipelineConfigBuilderError),
    #[error("script produced no segments, nothing to assemble")]
    EmptyScript,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
