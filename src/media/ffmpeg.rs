use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::format::{AudioContainer, CanonicalFormat};

use super::{ConcatOptions, MediaError, MediaTool};

/// Bitrate used for MP3 final outputs.
pub const MP3_OUTPUT_BITRATE: &str = "128k";

/// VBR quality used for MP3 segments.
const MP3_SEGMENT_QUALITY: &str = "3";

/// [`MediaTool`] backed by the `ffmpeg` command-line tool.
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    program: PathBuf,
}

impl Default for FfmpegTool {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegTool {
    /// Use `ffmpeg` from PATH.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
        }
    }

    /// Use an explicit ffmpeg binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, operation: &'static str, args: &[OsString]) -> Result<(), MediaError> {
        log::debug!("{} {:?}", self.program.display(), args);
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MediaError::NotFound {
                        program: self.program.clone(),
                    }
                } else {
                    MediaError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::Failed {
                operation,
                code: output.status.code(),
                stderr: last_lines(&stderr, 5),
            });
        }
        Ok(())
    }
}

impl MediaTool for FfmpegTool {
    fn ensure_available(&self) -> Result<(), MediaError> {
        let found = if self.program.components().count() > 1 {
            self.program.is_file()
        } else {
            executable_in_path(&self.program)
        };
        if found {
            Ok(())
        } else {
            Err(MediaError::NotFound {
                program: self.program.clone(),
            })
        }
    }

    fn transcode(
        &self,
        src: &Path,
        dst: &Path,
        format: &CanonicalFormat,
        container: AudioContainer,
    ) -> Result<(), MediaError> {
        self.run("transcode", &transcode_args(src, dst, format, container))
    }

    fn silence(
        &self,
        seconds: f64,
        dst: &Path,
        format: &CanonicalFormat,
        container: AudioContainer,
    ) -> Result<(), MediaError> {
        self.run("silence", &silence_args(seconds, dst, format, container))
    }

    fn concat(
        &self,
        manifest: &Path,
        output: &Path,
        options: &ConcatOptions,
    ) -> Result<(), MediaError> {
        self.run("concat", &concat_args(manifest, output, options))
    }
}

fn args<I, S>(items: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    items.into_iter().map(Into::into).collect()
}

fn sample_args(format: &CanonicalFormat) -> Vec<OsString> {
    args([
        "-ar".to_string(),
        format.sample_rate.to_string(),
        "-ac".to_string(),
        format.channels.to_string(),
    ])
}

fn segment_codec_args(format: &CanonicalFormat, container: AudioContainer) -> Vec<OsString> {
    match container {
        AudioContainer::Wav => args(["-c:a".to_string(), format.pcm_codec()]),
        AudioContainer::Mp3 => args(["-q:a", MP3_SEGMENT_QUALITY]),
    }
}

pub(crate) fn transcode_args(
    src: &Path,
    dst: &Path,
    format: &CanonicalFormat,
    container: AudioContainer,
) -> Vec<OsString> {
    let mut cmd = args(["-y", "-i"]);
    cmd.push(src.into());
    cmd.extend(sample_args(format));
    cmd.extend(segment_codec_args(format, container));
    cmd.push(dst.into());
    cmd
}

pub(crate) fn silence_args(
    seconds: f64,
    dst: &Path,
    format: &CanonicalFormat,
    container: AudioContainer,
) -> Vec<OsString> {
    let source = format!(
        "anullsrc=channel_layout={}:sample_rate={}",
        format.channel_layout(),
        format.sample_rate
    );
    let mut cmd = args(["-y", "-f", "lavfi", "-i"]);
    cmd.push(source.into());
    cmd.extend(args(["-t".to_string(), seconds.to_string()]));
    cmd.extend(sample_args(format));
    cmd.extend(segment_codec_args(format, container));
    cmd.push(dst.into());
    cmd
}

pub(crate) fn concat_args(manifest: &Path, output: &Path, options: &ConcatOptions) -> Vec<OsString> {
    let mut cmd = args(["-y", "-f", "concat", "-safe", "0", "-i"]);
    cmd.push(manifest.into());

    if let Some(loudness) = &options.loudness {
        cmd.extend(args(["-af".to_string(), loudness.filter()]));
    }

    match options.container {
        Some(AudioContainer::Wav) => {
            cmd.extend(sample_args(&options.format));
            cmd.extend(args(["-c:a".to_string(), options.format.pcm_codec()]));
        }
        Some(AudioContainer::Mp3) => {
            cmd.extend(sample_args(&options.format));
            cmd.extend(args(["-b:a", MP3_OUTPUT_BITRATE]));
        }
        None => {}
    }

    cmd.push(output.into());
    cmd
}

/// Search PATH for an executable named `command`.
fn executable_in_path(command: &Path) -> bool {
    let Some(path_var) = std::env::var_os("PATH") else {
        return false;
    };

    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(command);
        if candidate.is_file() {
            return true;
        }
        #[cfg(windows)]
        {
            if candidate.with_extension("exe").is_file() {
                return true;
            }
        }
    }

    false
}

fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
