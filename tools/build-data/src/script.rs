//! Script line grammar: comments, verbs and commands.

use crate::tokenizer::split_parameters;

/// Comment markers, applied in this order
const COMMENT_MARKERS: &[&str] = &["//", "#"];

/// Build verbs understood by the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// Copy matched files unchanged
    Copy,
    /// Encode WAV files to Ogg Vorbis
    WaveToOgg,
    /// Encode WAV files to Ogg Vorbis, down-mixing to mono
    WaveToOggMono,
    /// Decode MP3 files to WAV, then encode to Ogg Vorbis
    Mp3ToOgg,
}

impl Verb {
    /// Look up a verb keyword. Accepts the older `wav-` spellings too.
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "copy" => Some(Self::Copy),
            "wave-to-ogg" | "wav-to-ogg" => Some(Self::WaveToOgg),
            "wave-to-ogg-mono" | "wav-to-ogg-mono" => Some(Self::WaveToOggMono),
            "mp3-to-ogg" => Some(Self::Mp3ToOgg),
            _ => None,
        }
    }

    /// Number of parameters the verb requires
    pub fn arity(self) -> usize {
        2
    }

    /// Extension of the produced files, if it differs from the source
    pub fn output_extension(self) -> Option<&'static str> {
        match self {
            Self::Copy => None,
            Self::WaveToOgg | Self::WaveToOggMono | Self::Mp3ToOgg => Some("ogg"),
        }
    }
}

/// One executable script line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCommand {
    /// 1-based line number in the script
    pub line: usize,
    pub verb: String,
    pub parameters: Vec<String>,
}

/// Remove everything from the first comment marker to the end of the line.
///
/// Each marker truncates what the previous one left, so the leftmost wins.
pub fn strip_comments(line: &str) -> &str {
    let mut rest = line;
    for marker in COMMENT_MARKERS {
        if let Some(pos) = rest.find(marker) {
            rest = &rest[..pos];
        }
    }
    rest
}

/// Parse a single script line. Blank and comment-only lines give `None`.
pub fn parse_line(line_number: usize, line: &str) -> Option<ScriptCommand> {
    let line = strip_comments(line).trim();
    if line.is_empty() {
        return None;
    }

    let (verb, raw) = match line.split_once(' ') {
        Some((verb, raw)) => (verb, raw),
        None => (line, ""),
    };

    Some(ScriptCommand {
        line: line_number,
        verb: verb.to_string(),
        parameters: split_parameters(raw),
    })
}

/// Parse all commands of a script, in order
pub fn parse_script(text: &str) -> Vec<ScriptCommand> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| parse_line(index + 1, line))
        .collect()
}
