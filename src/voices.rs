use std::collections::HashMap;

use crate::error::PipelineError;

/// Speaker key that unknown speakers fall back to.
pub const DEFAULT_FALLBACK_SPEAKER: &str = "NARRATOR";

/// Mapping from speaker label to voice identifier.
///
/// Labels are matched case-insensitively. The fallback speaker's voice is
/// used for every label without an entry, so resolution never fails.
///
/// ```rust,no_run
/// use tts_stitch::voices::VoiceMap;
///
/// let voices = VoiceMap::new([("NARRATOR", "alloy"), ("Becca", "nova")], "narrator")?;
/// assert_eq!(voices.resolve("becca"), "nova");
/// assert_eq!(voices.resolve("ZEB"), "alloy");
/// # Ok::<(), tts_stitch::PipelineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct VoiceMap {
    voices: HashMap<String, String>,
    fallback_speaker: String,
    fallback_voice: String,
}

impl Default for VoiceMap {
    fn default() -> Self {
        Self::new(
            [
                ("NARRATOR", "alloy"),
                ("BECCA", "nova"),
                ("CHRIS", "verse"),
                ("WU", "cedar"),
                ("BACKGROUND", "marin"),
                ("CADOGAN", "ash"),
                ("A.L.I.E.", "nova"),
                ("MARA", "shimmer"),
                ("JONAH", "cedar"),
            ],
            DEFAULT_FALLBACK_SPEAKER,
        )
        .expect("default voice map contains the fallback speaker")
    }
}

impl VoiceMap {
    /// Build a voice map. `fallback_speaker` must be one of the entries.
    pub fn new<I, S, V>(entries: I, fallback_speaker: &str) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: Into<String>,
    {
        let voices: HashMap<String, String> = entries
            .into_iter()
            .map(|(speaker, voice)| (speaker_key(speaker.as_ref()), voice.into()))
            .collect();

        let fallback_speaker = speaker_key(fallback_speaker);
        let fallback_voice = voices
            .get(&fallback_speaker)
            .cloned()
            .ok_or_else(|| PipelineError::MissingFallbackVoice(fallback_speaker.clone()))?;

        Ok(Self {
            voices,
            fallback_speaker,
            fallback_voice,
        })
    }

    /// Same table with a different fallback speaker.
    pub fn with_fallback(self, fallback_speaker: &str) -> Result<Self, PipelineError> {
        Self::new(self.voices, fallback_speaker)
    }

    /// Voice for `speaker`, or the fallback voice if the speaker is unknown.
    pub fn resolve(&self, speaker: &str) -> &str {
        self.voices
            .get(&speaker_key(speaker))
            .map(String::as_str)
            .unwrap_or(&self.fallback_voice)
    }

    pub fn fallback_speaker(&self) -> &str {
        &self.fallback_speaker
    }

    pub fn fallback_voice(&self) -> &str {
        &self.fallback_voice
    }

    /// Distinct voice identifiers in the table, sorted.
    pub fn voices(&self) -> Vec<&str> {
        let mut voices: Vec<&str> = self.voices.values().map(String::as_str).collect();
        voices.sort_unstable();
        voices.dedup();
        voices
    }
}

fn speaker_key(speaker: &str) -> String {
    speaker.trim().to_uppercase()
}
