//! Per-row audio segments: synthesized speech and generated silence.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::format::AudioContainer;
use crate::media::MediaTool;
use crate::SynthesisEngine;

/// What a segment contains.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentKind {
    /// Synthesized speech in the given voice.
    Speech { voice: String },
    /// Silence. `placeholder` is set when generation failed and an empty
    /// file was written in its place.
    Silence { seconds: f64, placeholder: bool },
}

/// One audio file in the final sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Position in the output; also the file name prefix.
    pub index: usize,
    pub kind: SegmentKind,
    pub path: PathBuf,
}

impl Segment {
    pub fn is_silence(&self) -> bool {
        matches!(self.kind, SegmentKind::Silence { .. })
    }
}

/// Path of the speech segment `index` spoken by `voice`.
pub fn speech_path(dir: &Path, index: usize, voice: &str, container: AudioContainer) -> PathBuf {
    dir.join(format!(
        "{index:05}_{}.{}",
        file_safe(voice),
        container.extension()
    ))
}

/// Path of the silence segment `index`.
pub fn silence_path(dir: &Path, index: usize, container: AudioContainer) -> PathBuf {
    dir.join(format!("{index:05}_silence.{}", container.extension()))
}

fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Synthesize `text` in `voice` into segment `index`.
///
/// The text is normalized first. Whatever the engine returns is converted to
/// the canonical format unless both the engine and the segments use MP3, in
/// which case the engine's file is kept as-is. Every failure here is fatal.
pub fn synthesize<E, M>(
    engine: &mut E,
    media: &M,
    config: &PipelineConfig,
    text: &str,
    voice: &str,
    index: usize,
) -> Result<Segment, PipelineError>
where
    E: SynthesisEngine + ?Sized,
    M: MediaTool + ?Sized,
{
    let text = config.aliases.normalize(text);
    let native = engine.native_container();
    let target = config.segment_container;
    let path = speech_path(&config.work_dir, index, voice, target);

    let synthesis_error = |source| PipelineError::Synthesis {
        index,
        voice: voice.to_string(),
        source,
    };

    if native == target && target == AudioContainer::Mp3 {
        engine
            .synthesize_to_file(&text, voice, &path)
            .map_err(synthesis_error)?;
        return Ok(Segment {
            index,
            kind: SegmentKind::Speech {
                voice: voice.to_string(),
            },
            path,
        });
    }

    let fetched = if native == target {
        config.work_dir.join(format!(
            "{index:05}_{}.native.{}",
            file_safe(voice),
            native.extension()
        ))
    } else {
        speech_path(&config.work_dir, index, voice, native)
    };

    engine
        .synthesize_to_file(&text, voice, &fetched)
        .map_err(synthesis_error)?;

    media
        .transcode(&fetched, &path, &config.format, target)
        .map_err(|source| PipelineError::Transcode { index, source })?;

    if let Err(e) = fs::remove_file(&fetched) {
        log::debug!("Could not remove {}: {e}", fetched.display());
    }

    if target == AudioContainer::Wav {
        config
            .format
            .check_wav(&path)
            .map_err(|source| PipelineError::Format { index, source })?;
    }

    Ok(Segment {
        index,
        kind: SegmentKind::Speech {
            voice: voice.to_string(),
        },
        path,
    })
}

/// Generate `seconds` of silence into segment `index`.
///
/// Generation failures do not abort the run: the segment is written as an
/// empty placeholder file instead and marked as such. Only a failure to
/// write the placeholder itself is returned.
pub fn make_silence<M: MediaTool + ?Sized>(
    media: &M,
    config: &PipelineConfig,
    seconds: f64,
    index: usize,
) -> Result<Segment, PipelineError> {
    let container = config.segment_container;
    let path = silence_path(&config.work_dir, index, container);

    let generated = media
        .silence(seconds, &path, &config.format, container)
        .map_err(|e| e.to_string())
        .and_then(|()| match container {
            AudioContainer::Wav => config
                .format
                .check_wav(&path)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            AudioContainer::Mp3 => Ok(()),
        });

    let placeholder = match generated {
        Ok(()) => false,
        Err(reason) => {
            log::warn!(
                "Silence generation failed for segment {index:05} ({seconds}s): {reason}; \
                 writing empty placeholder"
            );
            fs::write(&path, b"")?;
            true
        }
    };

    Ok(Segment {
        index,
        kind: SegmentKind::Silence {
            seconds,
            placeholder,
        },
        path,
    })
}
