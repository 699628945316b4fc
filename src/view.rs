//! Annotated, self-test friendly presentation of a conjugation record.

use std::fmt::Write;

use crate::furigana::{base_text, to_inline, FuriganaAnnotator, Segment};
use crate::lexicon::WordClass;
use crate::record::ConjugationRecord;

/// Character printed in place of each hidden character
pub const MASK: char = '＊';

/// Content that stays hidden until revealed. Revealing cannot be undone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blurred<T> {
    content: T,
    revealed: bool,
}

impl<T> Blurred<T> {
    pub fn new(content: T) -> Self {
        Self {
            content,
            revealed: false,
        }
    }

    pub fn reveal(&mut self) {
        self.revealed = true;
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Content regardless of state
    pub fn content(&self) -> &T {
        &self.content
    }

    /// Content if revealed
    pub fn visible(&self) -> Option<&T> {
        self.revealed.then_some(&self.content)
    }
}

type Cell = Blurred<Vec<Segment>>;

impl Cell {
    /// Inline furigana when revealed; otherwise one mask per base character
    fn render(&self) -> String {
        if self.revealed {
            to_inline(&self.content)
        } else {
            base_text(&self.content).chars().map(|_| MASK).collect()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConjugationRow {
    pub label: String,
    pub polite: Cell,
    pub plain: Cell,
    /// Present only on the verb table
    pub te: Option<Cell>,
}

#[derive(Debug, Clone)]
pub struct ExampleRow {
    pub tense: String,
    pub english: String,
    pub polite: Cell,
    pub plain: Cell,
}

/// Conjugation record with every Japanese field annotated
#[derive(Debug, Clone)]
pub struct ConjugationView {
    pub heading: Vec<Segment>,
    pub badge: Option<String>,
    pub meaning: Option<Cell>,
    pub rows: Vec<ConjugationRow>,
    pub examples: Vec<ExampleRow>,
}

impl ConjugationView {
    pub fn build(
        record: &ConjugationRecord,
        annotator: &FuriganaAnnotator,
        class: WordClass,
    ) -> Self {
        let cell = |text: &str| Blurred::new(annotator.annotate(text));

        let rows = record
            .conjugations
            .iter()
            .map(|row| ConjugationRow {
                label: row.conjugation.clone(),
                polite: cell(&row.polite),
                plain: cell(&row.plain),
                te: match class {
                    WordClass::Verb => {
                        Some(Blurred::new(annotator.annotate_opt(row.te.as_deref())))
                    }
                    WordClass::Adjective => None,
                },
            })
            .collect();

        let examples = record
            .examples
            .iter()
            .map(|ex| ExampleRow {
                tense: ex.tense.clone(),
                english: ex.english.clone(),
                polite: cell(&ex.japanese_polite),
                plain: cell(&ex.japanese_plain),
            })
            .collect();

        Self {
            heading: annotator.annotate(record.heading()),
            badge: record.badge().map(str::to_string),
            meaning: record.meaning.as_deref().map(cell),
            rows,
            examples,
        }
    }

    /// Reveal every hidden cell
    pub fn reveal_all(&mut self) {
        if let Some(meaning) = self.meaning.as_mut() {
            meaning.reveal();
        }
        for row in &mut self.rows {
            row.polite.reveal();
            row.plain.reveal();
            if let Some(te) = row.te.as_mut() {
                te.reveal();
            }
        }
        for row in &mut self.examples {
            row.polite.reveal();
            row.plain.reveal();
        }
    }

    /// Plain-text rendering for terminals, one field per tab
    pub fn render_text(&self) -> String {
        let mut out = to_inline(&self.heading);
        if let Some(ref badge) = self.badge {
            let _ = write!(out, " [{}]", badge);
        }
        out.push('\n');

        if let Some(ref meaning) = self.meaning {
            let _ = writeln!(out, "Meaning: {}", meaning.render());
        }

        out.push_str("\nConjugation Table\n");
        let with_te = self.rows.iter().any(|row| row.te.is_some());
        if with_te {
            out.push_str("Conjugation\tPolite Form\tPlain Form\tTe-form\n");
        } else {
            out.push_str("Conjugation\tPolite Form\tPlain Form\n");
        }
        for row in &self.rows {
            let _ = write!(
                out,
                "{}\t{}\t{}",
                row.label,
                row.polite.render(),
                row.plain.render()
            );
            if let Some(ref te) = row.te {
                let _ = write!(out, "\t{}", te.render());
            }
            out.push('\n');
        }

        if !self.examples.is_empty() {
            out.push_str("\nExample Sentences\n");
            out.push_str("Tense\tEnglish\tJapanese (Polite)\tJapanese (Plain)\n");
            for row in &self.examples {
                let _ = writeln!(
                    out,
                    "{}\t{}\t{}\t{}",
                    row.tense,
                    row.english,
                    row.polite.render(),
                    row.plain.render()
                );
            }
        }

        out
    }
}
