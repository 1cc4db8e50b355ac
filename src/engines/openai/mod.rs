//! OpenAI speech engine.
//!
//! Sends each line to `POST {base_url}/audio/speech` and streams the encoded
//! audio (MP3 by default) to disk. The pipeline transcodes it into the
//! canonical segment format afterwards.
//!
//! # Credentials
//!
//! [`OpenAiParams::from_env`] reads `OPENAI_API_KEY`, and `OPENAI_BASE_URL`
//! when set (for compatible gateways).
//!
//! # Models and Voices
//!
//! | Model | Notes |
//! |---|---|
//! | `gpt-4o-mini-tts` | Default |
//! | `tts-1` | Lower latency |
//! | `tts-1-hd` | Higher quality |
//!
//! Voices include `alloy`, `ash`, `ballad`, `cedar`, `coral`, `echo`, `fable`,
//! `marin`, `nova`, `onyx`, `sage`, `shimmer` and `verse`.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use tts_stitch::SynthesisEngine;
//! use tts_stitch::engines::openai::{OpenAiEngine, OpenAiParams};
//!
//! let mut engine = OpenAiEngine::new(OpenAiParams::from_env()?.with_model("tts-1"))?;
//! engine.synthesize_to_file("Hello, world!", "alloy", Path::new("hello.mp3"))?;
//! # Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
//! ```

pub mod client;
pub mod engine;

pub use client::{OpenAiError, SpeechClient, SpeechRequest};
pub use engine::{OpenAiEngine, OpenAiParams, DEFAULT_BASE_URL, DEFAULT_MODEL};
