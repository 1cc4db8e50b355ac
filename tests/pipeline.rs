use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use tts_stitch::{
    config::PipelineConfig,
    format::{AudioContainer, CanonicalFormat},
    media::{ConcatOptions, MediaError, MediaTool},
    pipeline::Pipeline,
    script::ScriptRow,
    segment::{Segment, SegmentKind},
    BoxError, PipelineError, SynthesisEngine,
};

const SPEECH_SAMPLES: usize = 2_400; // 0.1s @ 24kHz
const SPEECH_AMPLITUDE: i16 = 1_000;

fn write_wav(path: &Path, format: &CanonicalFormat, samples: impl IntoIterator<Item = i16>) {
    let mut writer = hound::WavWriter::create(path, format.wav_spec()).unwrap();
    for sample in samples {
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
}

fn read_wav(path: &Path) -> Vec<i16> {
    hound::WavReader::open(path)
        .unwrap()
        .into_samples::<i16>()
        .map(Result::unwrap)
        .collect()
}

/// Records every request and writes a short constant tone.
struct FakeEngine {
    native: AudioContainer,
    calls: Vec<(String, String)>,
    fail_on_call: Option<usize>,
}

impl FakeEngine {
    fn wav() -> Self {
        Self {
            native: AudioContainer::Wav,
            calls: Vec::new(),
            fail_on_call: None,
        }
    }

    fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::wav()
        }
    }
}

impl SynthesisEngine for FakeEngine {
    fn native_container(&self) -> AudioContainer {
        self.native
    }

    fn synthesize_to_file(&mut self, text: &str, voice: &str, path: &Path) -> Result<(), BoxError> {
        if self.fail_on_call == Some(self.calls.len()) {
            return Err("429 quota exceeded".into());
        }
        self.calls.push((text.to_string(), voice.to_string()));
        match self.native {
            AudioContainer::Wav => write_wav(
                path,
                &CanonicalFormat::default(),
                std::iter::repeat(SPEECH_AMPLITUDE).take(SPEECH_SAMPLES),
            ),
            AudioContainer::Mp3 => fs::write(path, b"ID3 fake mp3")?,
        }
        Ok(())
    }
}

/// Media tool that writes real WAV files with hound and records every call.
#[derive(Default)]
struct FakeMedia {
    unavailable: bool,
    fail_silence: bool,
    fail_transcode_on: Option<usize>,
    fail_concat: bool,
    transcodes: Cell<usize>,
    silences: RefCell<Vec<f64>>,
    concats: RefCell<Vec<Vec<PathBuf>>>,
}

impl MediaTool for FakeMedia {
    fn ensure_available(&self) -> Result<(), MediaError> {
        if self.unavailable {
            Err(MediaError::NotFound {
                program: PathBuf::from("ffmpeg"),
            })
        } else {
            Ok(())
        }
    }

    fn transcode(
        &self,
        src: &Path,
        dst: &Path,
        _format: &CanonicalFormat,
        _container: AudioContainer,
    ) -> Result<(), MediaError> {
        let call = self.transcodes.get();
        self.transcodes.set(call + 1);
        if self.fail_transcode_on == Some(call) {
            return Err(MediaError::Failed {
                operation: "transcode",
                code: Some(1),
                stderr: "Invalid data found when processing input".to_string(),
            });
        }
        fs::copy(src, dst)?;
        Ok(())
    }

    fn silence(
        &self,
        seconds: f64,
        dst: &Path,
        format: &CanonicalFormat,
        container: AudioContainer,
    ) -> Result<(), MediaError> {
        self.silences.borrow_mut().push(seconds);
        if self.fail_silence {
            return Err(MediaError::Failed {
                operation: "silence",
                code: Some(1),
                stderr: "anullsrc: invalid argument".to_string(),
            });
        }
        match container {
            AudioContainer::Wav => {
                let samples = (seconds * format.sample_rate as f64).round() as usize;
                write_wav(dst, format, std::iter::repeat(0).take(samples));
            }
            AudioContainer::Mp3 => fs::write(dst, b"ID3 fake silence")?,
        }
        Ok(())
    }

    fn concat(
        &self,
        manifest: &Path,
        output: &Path,
        options: &ConcatOptions,
    ) -> Result<(), MediaError> {
        if self.fail_concat {
            return Err(MediaError::Failed {
                operation: "concat",
                code: Some(1),
                stderr: "concat.txt: Invalid argument".to_string(),
            });
        }
        let listing = fs::read_to_string(manifest)?;
        let paths: Vec<PathBuf> = listing
            .lines()
            .map(|line| {
                let quoted = line.strip_prefix("file '").and_then(|l| l.strip_suffix('\''));
                PathBuf::from(quoted.expect("manifest line is a quoted file entry"))
            })
            .collect();

        if options.container == Some(AudioContainer::Wav) {
            let mut samples = Vec::new();
            for path in &paths {
                if fs::metadata(path)?.len() > 0 {
                    samples.extend(read_wav(path));
                }
            }
            write_wav(output, &options.format, samples);
        } else {
            fs::write(output, b"stitched")?;
        }

        self.concats.borrow_mut().push(paths);
        Ok(())
    }
}

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn work_dir(&self) -> PathBuf {
        self.dir.path().join("segments")
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("out").join("book.wav")
    }

    fn script(&self, content: &str) -> PathBuf {
        let path = self.dir.path().join("script.csv");
        fs::write(&path, content).unwrap();
        path
    }

    fn config(&self) -> PipelineConfig {
        PipelineConfig::builder()
            .work_dir(self.work_dir())
            .build()
            .unwrap()
    }

    fn pipeline(&self, engine: FakeEngine, media: FakeMedia) -> Pipeline<FakeEngine, FakeMedia> {
        Pipeline::new(self.config(), engine, media)
    }
}

fn speech(voice: &str) -> SegmentKind {
    SegmentKind::Speech {
        voice: voice.to_string(),
    }
}

fn silence(seconds: f64) -> SegmentKind {
    SegmentKind::Silence {
        seconds,
        placeholder: false,
    }
}

fn kinds(segments: &[Segment]) -> Vec<SegmentKind> {
    segments.iter().map(|s| s.kind.clone()).collect()
}

fn file_names(segments: &[Segment]) -> Vec<String> {
    segments
        .iter()
        .map(|s| s.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn single_narrator_line_is_speech_then_interline_pause() {
    let fx = Fixture::new();
    let script = fx.script("NARRATOR|Hello world\n");
    let mut pipeline = fx.pipeline(FakeEngine::wav(), FakeMedia::default());

    let summary = pipeline.run(&script, &fx.output()).unwrap();

    assert_eq!(kinds(&summary.segments), vec![speech("alloy"), silence(0.25)]);
    assert_eq!(
        pipeline.engine().calls,
        vec![("Hello world".to_string(), "alloy".to_string())]
    );

    let concats = pipeline.media().concats.borrow();
    assert_eq!(concats.len(), 1);
    let expected: Vec<PathBuf> = summary
        .segments
        .iter()
        .map(|s| fs::canonicalize(&s.path).unwrap())
        .collect();
    assert_eq!(concats[0], expected);

    let samples = read_wav(&fx.output());
    assert_eq!(samples.len(), SPEECH_SAMPLES + 6_000);
    assert!(samples[..SPEECH_SAMPLES].iter().all(|&s| s == SPEECH_AMPLITUDE));
    assert!(samples[SPEECH_SAMPLES..].iter().all(|&s| s == 0));
    assert!((summary.audio_secs - 0.35).abs() < 1e-6);

    assert!(!fx.work_dir().join("concat.txt").exists());
}

#[test]
fn leading_pause_then_dialogue_keeps_row_order() {
    let fx = Fixture::new();
    let script = fx.script("[PAUSE=1]\nCHRIS|Hi\n");
    let mut pipeline = fx.pipeline(FakeEngine::wav(), FakeMedia::default());

    let summary = pipeline.run(&script, &fx.output()).unwrap();

    assert_eq!(
        kinds(&summary.segments),
        vec![silence(1.0), speech("verse"), silence(0.25)]
    );
    assert_eq!(
        file_names(&summary.segments),
        vec!["00000_silence.wav", "00001_verse.wav", "00002_silence.wav"]
    );
    assert_eq!(*pipeline.media().silences.borrow(), vec![1.0, 0.25]);
    assert_eq!(pipeline.engine().calls[0].0, "Hi");
}

#[test]
fn malformed_pause_uses_default_duration() {
    let fx = Fixture::new();
    let script = fx.script("[PAUSE=abc]\n");
    let mut pipeline = fx.pipeline(FakeEngine::wav(), FakeMedia::default());

    let summary = pipeline.run(&script, &fx.output()).unwrap();

    assert_eq!(kinds(&summary.segments), vec![silence(0.5)]);
    assert!(pipeline.engine().calls.is_empty());
}

#[test]
fn unknown_speaker_falls_back_to_narrator_voice() {
    let fx = Fixture::new();
    let script = fx.script("ZEB|Test\n");
    let mut pipeline = fx.pipeline(FakeEngine::wav(), FakeMedia::default());

    let summary = pipeline.run(&script, &fx.output()).unwrap();

    assert_eq!(kinds(&summary.segments), vec![speech("alloy"), silence(0.25)]);
    assert_eq!(
        pipeline.engine().calls,
        vec![("Test".to_string(), "alloy".to_string())]
    );
}

#[test]
fn text_is_normalized_before_synthesis() {
    let fx = Fixture::new();
    let script = fx.script("a.l.i.e.|\"Hello,   I am  A.L.I.E. \"\n");
    let mut pipeline = fx.pipeline(FakeEngine::wav(), FakeMedia::default());

    pipeline.run(&script, &fx.output()).unwrap();

    assert_eq!(
        pipeline.engine().calls,
        vec![("Hello, I am Allie".to_string(), "nova".to_string())]
    );
}

#[test]
fn ignorable_rows_emit_no_segments() {
    let fx = Fixture::new();
    let mut pipeline = fx.pipeline(FakeEngine::wav(), FakeMedia::default());

    let segments = pipeline
        .dispatch(vec![
            ScriptRow::Blank,
            ScriptRow::Header,
            ScriptRow::Noise,
        ])
        .unwrap();
    assert!(segments.is_empty());

    let script = fx.script("Speaker|Text\n\n   \njust a stage note\n");
    let err = pipeline.run(&script, &fx.output()).unwrap_err();
    assert!(matches!(err, PipelineError::EmptyScript));
    assert!(pipeline.media().concats.borrow().is_empty());
    assert!(pipeline.engine().calls.is_empty());
}

#[test]
fn indices_follow_processing_order() {
    let fx = Fixture::new();
    let rows = vec![
        ScriptRow::Dialogue {
            speaker: "BECCA".to_string(),
            text: "One".to_string(),
        },
        ScriptRow::Noise,
        ScriptRow::Pause(2.5),
        ScriptRow::Dialogue {
            speaker: "WU".to_string(),
            text: "Two".to_string(),
        },
        ScriptRow::Pause(0.0),
    ];
    let mut pipeline = fx.pipeline(FakeEngine::wav(), FakeMedia::default());

    let segments = pipeline.dispatch(rows).unwrap();

    let indices: Vec<usize> = segments.iter().map(|s| s.index).collect();
    assert_eq!(indices, (0..6).collect::<Vec<_>>());
    assert_eq!(
        kinds(&segments),
        vec![
            speech("nova"),
            silence(0.25),
            silence(2.5),
            speech("cedar"),
            silence(0.25),
            silence(0.0),
        ]
    );
    for segment in &segments {
        assert!(segment.path.exists(), "{}", segment.path.display());
    }
    // intermediate engine output is removed after transcoding
    assert!(!fx.work_dir().join("00000_nova.native.wav").exists());
}

#[test]
fn synthesis_failure_aborts_before_assembly_and_keeps_earlier_segments() {
    let fx = Fixture::new();
    let script = fx.script("NARRATOR|First\nBECCA|Second\nCHRIS|Third\n");
    let mut pipeline = fx.pipeline(FakeEngine::failing_on(1), FakeMedia::default());

    let err = pipeline.run(&script, &fx.output()).unwrap_err();

    match err {
        PipelineError::Synthesis { index, voice, .. } => {
            assert_eq!(index, 2);
            assert_eq!(voice, "nova");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(pipeline.media().concats.borrow().is_empty());
    assert!(!fx.output().exists());
    assert!(fx.work_dir().join("00000_alloy.wav").exists());
    assert!(fx.work_dir().join("00001_silence.wav").exists());
    assert!(!fx.work_dir().join("00002_nova.wav").exists());
}

#[test]
fn silence_failure_writes_placeholder_and_continues() {
    let fx = Fixture::new();
    let script = fx.script("NARRATOR|Hello\n[PAUSE=2]\n");
    let media = FakeMedia {
        fail_silence: true,
        ..FakeMedia::default()
    };
    let mut pipeline = fx.pipeline(FakeEngine::wav(), media);

    let summary = pipeline.run(&script, &fx.output()).unwrap();

    assert_eq!(
        kinds(&summary.segments),
        vec![
            speech("alloy"),
            SegmentKind::Silence {
                seconds: 0.25,
                placeholder: true,
            },
            SegmentKind::Silence {
                seconds: 2.0,
                placeholder: true,
            },
        ]
    );
    for segment in summary.segments.iter().filter(|s| s.is_silence()) {
        assert_eq!(fs::metadata(&segment.path).unwrap().len(), 0);
    }
    assert_eq!(pipeline.media().concats.borrow()[0].len(), 3);
}

#[test]
fn missing_media_tool_fails_before_any_processing() {
    let fx = Fixture::new();
    let script = fx.script("NARRATOR|Hello\n");
    let media = FakeMedia {
        unavailable: true,
        ..FakeMedia::default()
    };
    let mut pipeline = fx.pipeline(FakeEngine::wav(), media);

    let err = pipeline.run(&script, &fx.output()).unwrap_err();

    assert!(matches!(err, PipelineError::MediaUnavailable(_)));
    assert!(pipeline.engine().calls.is_empty());
    assert!(!fx.work_dir().exists());
}

#[test]
fn mp3_segments_from_mp3_engine_skip_transcoding() {
    let fx = Fixture::new();
    let config = PipelineConfig::builder()
        .work_dir(fx.work_dir())
        .segment_container(AudioContainer::Mp3)
        .build()
        .unwrap();
    let engine = FakeEngine {
        native: AudioContainer::Mp3,
        ..FakeEngine::wav()
    };
    let mut pipeline = Pipeline::new(config, engine, FakeMedia::default());
    let output = fx.dir.path().join("book.mp3");

    let summary = pipeline
        .run(&fx.script("NARRATOR|Hello\n"), &output)
        .unwrap();

    assert_eq!(pipeline.media().transcodes.get(), 0);
    assert_eq!(
        file_names(&summary.segments),
        vec!["00000_alloy.mp3", "00001_silence.mp3"]
    );
    assert!(output.exists());
}

#[test]
fn copied_mp3_fails_canonical_wav_check() {
    let fx = Fixture::new();
    let engine = FakeEngine {
        native: AudioContainer::Mp3,
        ..FakeEngine::wav()
    };
    let mut pipeline = fx.pipeline(engine, FakeMedia::default());

    // the fake transcoder copies bytes, so the "mp3" never becomes a valid WAV
    let err = pipeline
        .dispatch(vec![ScriptRow::Dialogue {
            speaker: "NARRATOR".to_string(),
            text: "Hello".to_string(),
        }])
        .unwrap_err();

    assert!(matches!(err, PipelineError::Format { index: 0, .. }));
    assert_eq!(pipeline.media().transcodes.get(), 1);
    assert!(!fx.work_dir().join("00000_alloy.mp3").exists());
}

#[test]
fn transcode_failure_aborts_the_run() {
    let fx = Fixture::new();
    let script = fx.script("NARRATOR|First\nBECCA|Second\nCHRIS|Third\n");
    let media = FakeMedia {
        fail_transcode_on: Some(1),
        ..FakeMedia::default()
    };
    let mut pipeline = fx.pipeline(FakeEngine::wav(), media);

    let err = pipeline.run(&script, &fx.output()).unwrap_err();

    match &err {
        PipelineError::Transcode { index, source } => {
            assert_eq!(*index, 2);
            assert!(matches!(source, MediaError::Failed { operation: "transcode", .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(pipeline.engine().calls.len(), 2);
    assert!(pipeline.media().concats.borrow().is_empty());
    assert!(fx.work_dir().join("00000_alloy.wav").exists());
    assert!(!fx.work_dir().join("00002_nova.wav").exists());
    assert!(!fx.work_dir().join("00003_silence.wav").exists());
    assert!(!fx.output().exists());
}

#[test]
fn concat_failure_is_fatal() {
    let fx = Fixture::new();
    let script = fx.script("NARRATOR|Hello\n");
    let media = FakeMedia {
        fail_concat: true,
        ..FakeMedia::default()
    };
    let mut pipeline = fx.pipeline(FakeEngine::wav(), media);

    let err = pipeline.run(&script, &fx.output()).unwrap_err();

    match &err {
        PipelineError::Assemble { output, source } => {
            assert_eq!(*output, fx.output());
            assert!(matches!(source, MediaError::Failed { operation: "concat", .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("book.wav"), "{err}");
    assert!(!fx.output().exists());
    // segments stay on disk for retakes
    assert!(fx.work_dir().join("00000_alloy.wav").exists());
    assert!(fx.work_dir().join("00001_silence.wav").exists());
    assert!(!fx.work_dir().join("00002_silence.wav").exists());
}
