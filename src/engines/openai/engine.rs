use std::path::Path;
use std::time::Duration;

use crate::format::AudioContainer;
use crate::{BoxError, SynthesisEngine};

use super::client::{OpenAiError, SpeechClient, SpeechRequest};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini-tts";

/// Parameters for the OpenAI speech engine.
#[derive(Debug, Clone)]
pub struct OpenAiParams {
    pub api_key: String,
    /// Speech model, e.g. `"gpt-4o-mini-tts"`, `"tts-1"` or `"tts-1-hd"`.
    pub model: String,
    pub base_url: String,
    /// Container requested from the service.
    pub response_format: AudioContainer,
    pub connect_timeout: Duration,
    /// Whole-request timeout, including streaming the audio body.
    pub timeout: Duration,
}

impl OpenAiParams {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            response_format: AudioContainer::Mp3,
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(120),
        }
    }

    /// Read `OPENAI_API_KEY` (and optionally `OPENAI_BASE_URL`) from the environment.
    pub fn from_env() -> Result<Self, OpenAiError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(OpenAiError::MissingApiKey)?;
        let mut params = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            params.base_url = base_url;
        }
        Ok(params)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// OpenAI text-to-speech engine.
///
/// One blocking `POST /audio/speech` per line; the response body is streamed
/// straight into the segment file. Errors are returned as-is, there is no
/// retry.
pub struct OpenAiEngine {
    client: SpeechClient,
    params: OpenAiParams,
}

impl OpenAiEngine {
    pub fn new(params: OpenAiParams) -> Result<Self, OpenAiError> {
        let client = SpeechClient::new(
            &params.base_url,
            &params.api_key,
            params.connect_timeout,
            params.timeout,
        )?;
        Ok(Self { client, params })
    }

    pub fn model(&self) -> &str {
        &self.params.model
    }
}

impl SynthesisEngine for OpenAiEngine {
    fn native_container(&self) -> AudioContainer {
        self.params.response_format
    }

    fn synthesize_to_file(&mut self, text: &str, voice: &str, path: &Path) -> Result<(), BoxError> {
        log::debug!(
            "Requesting {} speech from {} (voice '{voice}', {} chars)",
            self.params.response_format,
            self.params.model,
            text.chars().count()
        );
        let request = SpeechRequest {
            model: &self.params.model,
            voice,
            input: text,
            response_format: self.params.response_format,
        };
        self.client.speech_to_file(&request, path)?;
        Ok(())
    }
}
