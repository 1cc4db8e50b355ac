use std::sync::OnceLock;

use regex::{NoExpand, Regex};

use crate::error::PipelineError;

static WHITESPACE: OnceLock<Regex> = OnceLock::new();

fn whitespace() -> &'static Regex {
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// One regex → literal replacement rule.
#[derive(Debug, Clone)]
pub struct Alias {
    pattern: Regex,
    replacement: String,
}

impl Alias {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, PipelineError> {
        let compiled = Regex::new(pattern).map_err(|source| PipelineError::Alias {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern: compiled,
            replacement: replacement.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }
}

/// Ordered pronunciation aliases applied to every line before synthesis.
///
/// Aliases run in declaration order, each over the output of the previous
/// one. Overlapping patterns are not detected.
#[derive(Debug, Clone)]
pub struct PronunciationAliases {
    aliases: Vec<Alias>,
}

impl Default for PronunciationAliases {
    fn default() -> Self {
        Self {
            aliases: vec![Alias::new(r"\bA\.L\.I\.E\.", "Allie").expect("default alias is valid")],
        }
    }
}

impl PronunciationAliases {
    /// Build a table from `(pattern, replacement)` pairs, keeping their order.
    pub fn new<I, P, R>(pairs: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = (P, R)>,
        P: AsRef<str>,
        R: Into<String>,
    {
        let aliases = pairs
            .into_iter()
            .map(|(pattern, replacement)| Alias::new(pattern.as_ref(), replacement))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { aliases })
    }

    pub fn empty() -> Self {
        Self {
            aliases: Vec::new(),
        }
    }

    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    /// Collapse whitespace, trim, then apply every alias in order.
    pub fn normalize(&self, text: &str) -> String {
        let mut text = whitespace().replace_all(text, " ").trim().to_string();
        for alias in &self.aliases {
            text = alias
                .pattern
                .replace_all(&text, NoExpand(&alias.replacement))
                .into_owned();
        }
        text
    }
}
