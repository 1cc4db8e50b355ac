//! Script parsing.
//!
//! A script is `|`-delimited text, one row per line:
//!
//! ```text
//! Speaker|Text
//! NARRATOR|"It was a dark and stormy night."
//! [PAUSE=1.5]
//! BECCA|Did you hear that?
//! ```
//!
//! Rows are classified positionally by [`classify`]; nothing in a script is
//! ever reported as an error apart from unreadable input.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::PipelineError;

/// Pause used when a `[PAUSE=...]` value cannot be parsed.
pub const DEFAULT_FALLBACK_PAUSE: f64 = 0.5;

const PAUSE_PREFIX: &str = "[PAUSE=";
const PAUSE_SUFFIX: &str = "]";
const HEADER_KEYWORD: &str = "speaker";

/// One classified script row.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptRow {
    /// A line of dialogue to synthesize.
    Dialogue { speaker: String, text: String },
    /// Silence of the given number of seconds.
    Pause(f64),
    /// Empty row.
    Blank,
    /// Column header such as `Speaker|Text`.
    Header,
    /// Single cell that is neither a header nor a pause.
    Noise,
}

/// Classify one row given its cells.
///
/// `fallback_pause` replaces pause values that are not a finite,
/// non-negative number.
pub fn classify<S: AsRef<str>>(cells: &[S], fallback_pause: f64) -> ScriptRow {
    match cells {
        [] => ScriptRow::Blank,
        [cell] => classify_single(cell.as_ref().trim(), fallback_pause),
        [speaker, text, ..] => {
            let speaker = speaker.as_ref().trim();
            let text = text.as_ref().trim().trim_matches('"');
            if speaker.is_empty() && text.is_empty() {
                ScriptRow::Blank
            } else if speaker.eq_ignore_ascii_case(HEADER_KEYWORD) {
                ScriptRow::Header
            } else {
                ScriptRow::Dialogue {
                    speaker: speaker.to_string(),
                    text: text.to_string(),
                }
            }
        }
    }
}

fn classify_single(cell: &str, fallback_pause: f64) -> ScriptRow {
    if cell.is_empty() {
        return ScriptRow::Blank;
    }
    if starts_with_ignore_case(cell, HEADER_KEYWORD) {
        return ScriptRow::Header;
    }
    match cell
        .strip_prefix(PAUSE_PREFIX)
        .and_then(|rest| rest.strip_suffix(PAUSE_SUFFIX))
    {
        Some(value) => ScriptRow::Pause(parse_pause(value, fallback_pause)),
        None => ScriptRow::Noise,
    }
}

fn parse_pause(value: &str, fallback_pause: f64) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => seconds,
        _ => {
            log::warn!("Malformed pause value {value:?}, using {fallback_pause}s");
            fallback_pause
        }
    }
}

fn starts_with_ignore_case(cell: &str, prefix: &str) -> bool {
    cell.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Parse every row of a script.
pub fn parse_script<R: Read>(reader: R, fallback_pause: f64) -> Result<Vec<ScriptRow>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells: Vec<&str> = record.iter().collect();
        rows.push(classify(&cells, fallback_pause));
    }
    Ok(rows)
}

/// Read and parse the script at `path`.
pub fn read_script(path: &Path, fallback_pause: f64) -> Result<Vec<ScriptRow>, PipelineError> {
    let file = File::open(path).map_err(|e| PipelineError::Script {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    parse_script(file, fallback_pause).map_err(|source| PipelineError::Script {
        path: path.to_path_buf(),
        source,
    })
}
