use std::time::Instant;

use tts_stitch::{
    assemble::{assemble, LoudnessTarget},
    config::PipelineConfig,
    engines::openai::{OpenAiEngine, OpenAiParams},
    media::{FfmpegTool, MediaTool},
    segment::synthesize,
};

const VOICES: &[&str] = &[
    "alloy", "echo", "fable", "onyx", "nova", "shimmer", "coral", "verse", "ballad", "ash",
    "sage", "marin", "cedar",
];

const LINE: &str = "Hello, this is a short audition line for our audiobook.";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = PipelineConfig::builder()
        .work_dir("output")
        .loudness(None::<LoudnessTarget>)
        .build()?;
    std::fs::create_dir_all(&config.work_dir)?;

    let media = FfmpegTool::new();
    media.ensure_available()?;
    let mut engine = OpenAiEngine::new(OpenAiParams::from_env()?)?;

    let start = Instant::now();
    let mut segments = Vec::with_capacity(VOICES.len());
    for (index, voice) in VOICES.iter().enumerate() {
        println!("Generating {voice}...");
        let text = format!("{} voice speaking. {LINE}", capitalize(voice));
        segments.push(synthesize(&mut engine, &media, &config, &text, voice, index)?);
    }

    let output = config.work_dir.join("all_voices_demo.wav");
    assemble(
        &media,
        &segments,
        &config.work_dir,
        &output,
        &config.format,
        None,
    )?;

    println!(
        "Stitched {} voices into {} in {:.2?}",
        VOICES.len(),
        output.display(),
        start.elapsed()
    );
    Ok(())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
