use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::Serialize;

use crate::format::AudioContainer;

#[derive(thiserror::Error, Debug)]
pub enum OpenAiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("speech request rejected with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("OPENAI_API_KEY is not set. Export it or add it to a .env file.")]
    MissingApiKey,
}

/// JSON body of `POST /audio/speech`.
#[derive(Debug, Serialize)]
pub struct SpeechRequest<'a> {
    pub model: &'a str,
    pub voice: &'a str,
    pub input: &'a str,
    pub response_format: AudioContainer,
}

/// Thin blocking client for the speech endpoint.
pub struct SpeechClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl SpeechClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, OpenAiError> {
        let http = Client::builder()
            .user_agent(concat!("tts-stitch/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn speech_url(&self) -> String {
        format!("{}/audio/speech", self.base_url)
    }

    pub(crate) fn request(&self, body: &SpeechRequest<'_>) -> RequestBuilder {
        self.http
            .post(self.speech_url())
            .bearer_auth(&self.api_key)
            .json(body)
    }

    /// Send `body` and stream the returned audio into `dest`.
    ///
    /// The audio is written to a temporary sibling first and renamed into
    /// place, so `dest` never holds a truncated response.
    pub fn speech_to_file(&self, body: &SpeechRequest<'_>, dest: &Path) -> Result<(), OpenAiError> {
        let mut response = self.request(body).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(OpenAiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let temp_path = dest.with_extension("download.tmp");
        let result = (|| -> Result<(), OpenAiError> {
            let mut file = File::create(&temp_path)?;
            io::copy(&mut response, &mut file)?;
            file.flush()?;
            fs::rename(&temp_path, dest)?;
            Ok(())
        })();

        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }
}
