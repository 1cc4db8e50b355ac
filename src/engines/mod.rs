//! Speech synthesis engines.
//!
//! This module contains implementations of [`SynthesisEngine`](crate::SynthesisEngine).
//!
//! # Available Engines
//!
//! Enable engines via Cargo features:
//! - `openai` - OpenAI speech endpoint over HTTPS (default)

#[cfg(feature = "openai")]
pub mod openai;
