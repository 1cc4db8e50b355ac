use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};

use tts_stitch::{
    assemble::LoudnessTarget,
    config::{ConfigFile, PipelineConfig},
    engines::openai::{OpenAiEngine, OpenAiParams, DEFAULT_MODEL},
    format::AudioContainer,
    media::FfmpegTool,
    pipeline::Pipeline,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SegmentFormat {
    Wav,
    Mp3,
}

impl From<SegmentFormat> for AudioContainer {
    fn from(format: SegmentFormat) -> Self {
        match format {
            SegmentFormat::Wav => AudioContainer::Wav,
            SegmentFormat::Mp3 => AudioContainer::Mp3,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "tts-stitch", version)]
#[command(about = "Synthesize a SPEAKER|Text script line by line and stitch it into one audio file")]
struct Cli {
    /// Script file: `SPEAKER|Text` rows and `[PAUSE=seconds]` markers
    script: PathBuf,
    /// Final audio file; `.wav` and `.mp3` get audiobook-friendly encoding
    output: PathBuf,
    /// JSON config file (voices, aliases, pauses, loudness)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory for per-line segment files
    #[arg(long)]
    work_dir: Option<PathBuf>,
    /// Speech model identifier
    #[arg(long)]
    model: Option<String>,
    /// Container of the per-line segment files
    #[arg(long, value_enum)]
    segment_format: Option<SegmentFormat>,
    /// Skip the loudness normalization pass
    #[arg(long)]
    no_loudnorm: bool,
    /// ffmpeg binary to use
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,
}

/// Help and version requests succeed; every other argument error exits with 1.
fn usage_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn parse_cli() -> Cli {
    Cli::try_parse().unwrap_or_else(|e| {
        let _ = e.print();
        std::process::exit(usage_exit_code(e.kind()))
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = parse_cli();

    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let file = cli.config.as_deref().map(ConfigFile::load).transpose()?;

    let mut builder = PipelineConfig::builder();
    if let Some(file) = &file {
        file.apply(&mut builder)?;
    }
    if let Some(dir) = cli.work_dir {
        builder.work_dir(dir);
    }
    if let Some(format) = cli.segment_format {
        builder.segment_container(AudioContainer::from(format));
    }
    if cli.no_loudnorm {
        builder.loudness(None::<LoudnessTarget>);
    }
    let config = builder.build()?;

    let model = cli
        .model
        .or_else(|| file.and_then(|f| f.model))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let engine = OpenAiEngine::new(OpenAiParams::from_env()?.with_model(model))?;

    let work_dir = config.work_dir.clone();
    let mut pipeline = Pipeline::new(config, engine, FfmpegTool::with_program(cli.ffmpeg));
    let summary = pipeline.run(&cli.script, &cli.output)?;

    println!(
        "Wrote {} in {:.1}s",
        summary.output.display(),
        summary.elapsed.as_secs_f64()
    );
    println!("Per-line audio kept in {}/ for easy retakes.", work_dir.display());
    Ok(())
}
