use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::assemble;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::format::AudioContainer;
use crate::media::MediaTool;
use crate::script::{self, ScriptRow};
use crate::segment::{self, Segment};
use crate::SynthesisEngine;

/// Characters of dialogue shown in the per-line progress log.
const PREVIEW_CHARS: usize = 70;

/// Outcome of a completed [`Pipeline::run`].
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output: PathBuf,
    pub segments: Vec<Segment>,
    /// Summed duration of all readable WAV segments, in seconds.
    pub audio_secs: f64,
    pub elapsed: Duration,
}

/// Script → segments → single output file.
///
/// Rows are processed strictly one at a time, in order. Each emitted segment
/// takes the next index, so segment files sort in playback order.
pub struct Pipeline<E, M> {
    config: PipelineConfig,
    engine: E,
    media: M,
}

impl<E: SynthesisEngine, M: MediaTool> Pipeline<E, M> {
    pub fn new(config: PipelineConfig, engine: E, media: M) -> Self {
        Self {
            config,
            engine,
            media,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    /// Turn rows into an ordered list of segments.
    ///
    /// Every dialogue row yields a speech segment followed by the inter-line
    /// pause; every pause row yields one silence segment; other rows yield
    /// nothing. Stops at the first fatal error, leaving already written
    /// segment files in place.
    pub fn dispatch<I>(&mut self, rows: I) -> Result<Vec<Segment>, PipelineError>
    where
        I: IntoIterator<Item = ScriptRow>,
    {
        fs::create_dir_all(&self.config.work_dir)?;

        let mut segments = Vec::new();
        let mut index = 0usize;

        for row in rows {
            match row {
                ScriptRow::Dialogue { speaker, text } => {
                    let voice = self.config.voices.resolve(&speaker).to_string();
                    log::info!("[{index:05}] {speaker} → {voice}: {}", preview(&text));

                    let speech = segment::synthesize(
                        &mut self.engine,
                        &self.media,
                        &self.config,
                        &text,
                        &voice,
                        index,
                    )?;
                    segments.push(speech);
                    index += 1;

                    let pause = segment::make_silence(
                        &self.media,
                        &self.config,
                        self.config.interline_pause,
                        index,
                    )?;
                    segments.push(pause);
                    index += 1;
                }
                ScriptRow::Pause(seconds) => {
                    log::info!("[{index:05}] pause {seconds}s");
                    let pause = segment::make_silence(&self.media, &self.config, seconds, index)?;
                    segments.push(pause);
                    index += 1;
                }
                ScriptRow::Header => log::debug!("Skipping header row"),
                ScriptRow::Noise => log::debug!("Skipping unrecognised single-cell row"),
                ScriptRow::Blank => {}
            }
        }

        Ok(segments)
    }

    /// Concatenate `segments` into `output`, applying the configured loudness
    /// normalization.
    pub fn assemble(&self, segments: &[Segment], output: &Path) -> Result<(), PipelineError> {
        assemble::assemble(
            &self.media,
            segments,
            &self.config.work_dir,
            output,
            &self.config.format,
            self.config.loudness,
        )
    }

    /// Read the script at `script`, synthesize every row, and write the
    /// stitched result to `output`.
    pub fn run(&mut self, script: &Path, output: &Path) -> Result<RunSummary, PipelineError> {
        let start = Instant::now();
        self.media
            .ensure_available()
            .map_err(PipelineError::MediaUnavailable)?;

        let rows = script::read_script(script, self.config.fallback_pause)?;
        let segments = self.dispatch(rows)?;
        self.assemble(&segments, output)?;

        let audio_secs = self.audio_secs(&segments);
        let elapsed = start.elapsed();
        log::info!(
            "Wrote {} ({} segments, {:.1}s of audio) in {:.1}s",
            output.display(),
            segments.len(),
            audio_secs,
            elapsed.as_secs_f64()
        );

        Ok(RunSummary {
            output: output.to_path_buf(),
            segments,
            audio_secs,
            elapsed,
        })
    }

    fn audio_secs(&self, segments: &[Segment]) -> f64 {
        if self.config.segment_container != AudioContainer::Wav {
            return 0.0;
        }
        segments
            .iter()
            .filter_map(|s| self.config.format.check_wav(&s.path).ok())
            .sum()
    }
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::preview;

    #[test]
    fn preview_truncates_long_lines() {
        assert_eq!(preview("short"), "short");
        let long = "é".repeat(80);
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), 73);
        assert_eq!(preview(&"a".repeat(70)), "a".repeat(70));
    }
}
