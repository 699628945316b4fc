//! Furigana annotation over tokenizer output.

use std::fmt;

use serde::Serialize;

use crate::analyzer::{Token, TokenizerHandle};
use crate::kana::{contains_kanji, katakana_to_hiragana};

/// One unit of annotated output, in input order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    /// Text shown as-is
    Plain { text: String },
    /// Kanji-bearing text with a hiragana reading
    Annotated { base: String, reading: String },
}

impl Segment {
    pub fn plain(text: impl Into<String>) -> Self {
        Segment::Plain { text: text.into() }
    }

    pub fn annotated(base: impl Into<String>, reading: impl Into<String>) -> Self {
        Segment::Annotated {
            base: base.into(),
            reading: reading.into(),
        }
    }

    /// The original text this segment covers
    pub fn base(&self) -> &str {
        match self {
            Segment::Plain { text } => text,
            Segment::Annotated { base, .. } => base,
        }
    }

    pub fn reading(&self) -> Option<&str> {
        match self {
            Segment::Plain { .. } => None,
            Segment::Annotated { reading, .. } => Some(reading),
        }
    }

    /// Decide how a single token is shown
    fn from_token(token: &Token) -> Self {
        match token.known_reading() {
            Some(reading) if contains_kanji(&token.surface_form) => {
                Segment::annotated(&token.surface_form, katakana_to_hiragana(reading))
            }
            _ => Segment::plain(&token.surface_form),
        }
    }
}

/// Inline form used on terminals: `高い(たかい)`
impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Plain { text } => f.write_str(text),
            Segment::Annotated { base, reading } => write!(f, "{}({})", base, reading),
        }
    }
}

/// Concatenate the base text of every segment
pub fn base_text(segments: &[Segment]) -> String {
    segments.iter().map(Segment::base).collect()
}

/// Render segments inline, e.g. `私(わたし)は本(ほん)を読む(よむ)`
pub fn to_inline(segments: &[Segment]) -> String {
    segments.iter().map(ToString::to_string).collect()
}

/// Render segments as HTML ruby markup
pub fn to_ruby_markup(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Plain { text } => push_escaped(&mut out, text),
            Segment::Annotated { base, reading } => {
                out.push_str("<ruby>");
                push_escaped(&mut out, base);
                out.push_str("<rt>");
                push_escaped(&mut out, reading);
                out.push_str("</rt></ruby>");
            }
        }
    }
    out
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// Attaches hiragana readings to kanji-bearing morphemes.
///
/// Holds only a handle to the tokenizer; while the handle is not ready every
/// call passes the input through as a single plain segment.
#[derive(Debug, Clone, Default)]
pub struct FuriganaAnnotator {
    tokenizer: TokenizerHandle,
}

impl FuriganaAnnotator {
    pub fn new(tokenizer: TokenizerHandle) -> Self {
        Self { tokenizer }
    }

    pub fn is_ready(&self) -> bool {
        self.tokenizer.is_ready()
    }

    /// Annotate text with furigana.
    ///
    /// The base text of the returned segments always concatenates back to
    /// `text`.
    pub fn annotate(&self, text: &str) -> Vec<Segment> {
        if text.is_empty() {
            return Vec::new();
        }

        let Some(tokenizer) = self.tokenizer.get() else {
            return vec![Segment::plain(text)];
        };

        let tokens = tokenizer.tokenize(text);
        align(text, &tokens)
    }

    /// Annotate an optional field, yielding nothing when it is absent
    pub fn annotate_opt(&self, text: Option<&str>) -> Vec<Segment> {
        text.map(|t| self.annotate(t)).unwrap_or_default()
    }
}

/// Map tokens back onto the input.
///
/// Text the tokenizer skipped (whitespace, for some dictionaries) is emitted
/// as plain segments so nothing is lost; tokens that cannot be located at or
/// after the cursor are dropped.
fn align(text: &str, tokens: &[Token]) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(tokens.len());
    let mut cursor = 0;

    for token in tokens {
        if token.surface_form.is_empty() {
            continue;
        }
        let Some(offset) = text[cursor..].find(token.surface_form.as_str()) else {
            tracing::debug!("Token {:?} not found in input", token.surface_form);
            continue;
        };
        if offset > 0 {
            segments.push(Segment::plain(&text[cursor..cursor + offset]));
        }
        segments.push(Segment::from_token(token));
        cursor += offset + token.surface_form.len();
    }

    if cursor < text.len() {
        segments.push(Segment::plain(&text[cursor..]));
    }

    segments
}
