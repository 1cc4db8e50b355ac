//! Final concatenation of all segments into one output file.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::format::{AudioContainer, CanonicalFormat};
use crate::media::{ConcatOptions, MediaTool};
use crate::segment::Segment;

/// File name of the concat manifest written into the work directory.
pub const MANIFEST_FILE_NAME: &str = "concat.txt";

/// Parameters of the EBU R128 loudness normalization pass.
///
/// Fields missing from a config file keep their audiobook defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoudnessTarget {
    /// Integrated loudness target in LUFS.
    pub integrated_lufs: f64,
    /// Maximum true peak in dBTP.
    pub true_peak_db: f64,
    /// Loudness range target in LU.
    pub loudness_range: f64,
}

impl Default for LoudnessTarget {
    fn default() -> Self {
        Self {
            integrated_lufs: -16.0,
            true_peak_db: -1.5,
            loudness_range: 11.0,
        }
    }
}

impl LoudnessTarget {
    /// ffmpeg `loudnorm` filter expression.
    pub fn filter(&self) -> String {
        format!(
            "loudnorm=I={}:TP={}:LRA={}",
            self.integrated_lufs, self.true_peak_db, self.loudness_range
        )
    }
}

/// Write a concat manifest listing every segment by absolute path, in order.
pub fn write_manifest(segments: &[Segment], manifest: &Path) -> Result<(), PipelineError> {
    let mut out = BufWriter::new(fs::File::create(manifest)?);
    for segment in segments {
        let path = fs::canonicalize(&segment.path)?;
        writeln!(out, "file '{}'", quote_path(&path))?;
    }
    out.flush()?;
    Ok(())
}

/// Escape a path for a single-quoted concat manifest entry.
fn quote_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', r"'\''")
}

/// Concatenate `segments` into `output`.
///
/// The manifest is written into `work_dir` and removed once the media tool
/// has finished. The output container (and therefore its encoding) follows
/// the extension of `output`.
pub fn assemble<M: MediaTool + ?Sized>(
    media: &M,
    segments: &[Segment],
    work_dir: &Path,
    output: &Path,
    format: &CanonicalFormat,
    loudness: Option<LoudnessTarget>,
) -> Result<(), PipelineError> {
    if segments.is_empty() {
        return Err(PipelineError::EmptyScript);
    }

    let manifest: PathBuf = work_dir.join(MANIFEST_FILE_NAME);
    write_manifest(segments, &manifest)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let options = ConcatOptions {
        loudness,
        format: *format,
        container: AudioContainer::from_path(output),
    };
    log::info!(
        "Concatenating {} segments into {}{}",
        segments.len(),
        output.display(),
        if loudness.is_some() {
            " (loudness normalized)"
        } else {
            ""
        }
    );

    media
        .concat(&manifest, output, &options)
        .map_err(|source| PipelineError::Assemble {
            output: output.to_path_buf(),
            source,
        })?;

    if let Err(e) = fs::remove_file(&manifest) {
        log::debug!("Could not remove manifest {}: {e}", manifest.display());
    }
    Ok(())
}
