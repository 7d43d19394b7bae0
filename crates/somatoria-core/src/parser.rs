//! OCR text → answer map parser.
//!
//! Recognized text is read line by line against a fixed, ordered list of
//! line patterns. When no line yields an answer, every standalone 1–2 digit
//! number in the text is paired up as `question, answer, question, answer…`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::mask::{AnswerMask, MAX_MASK};
use crate::model::MAX_QUESTIONS;

/// A line shape the parser recognizes, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinePattern {
    /// `1) 10`, `01. 10`, `1- 10`, `1 10`
    Numbered,
    /// `1 - 10`, `1:10`
    Separated,
    /// `Q1: 10`, `q01) 10`
    Prefixed,
}

impl LinePattern {
    pub const ALL: [LinePattern; 3] = [
        LinePattern::Numbered,
        LinePattern::Separated,
        LinePattern::Prefixed,
    ];

    fn regex(self) -> &'static Regex {
        match self {
            LinePattern::Numbered => &NUMBERED,
            LinePattern::Separated => &SEPARATED,
            LinePattern::Prefixed => &PREFIXED,
        }
    }
}

static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{1,2})[).\-:\s]+([0-9]{1,2})$").expect("valid regex"));

static SEPARATED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{1,2})\s*[-:]\s*([0-9]{1,2})$").expect("valid regex"));

static PREFIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[Qq]?([0-9]{1,2})[).\-:\s]+([0-9]{1,2})$").expect("valid regex")
});

// ASCII word boundary: accented letters do not glue to adjacent digits.
static STANDALONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u:\b)[0-9]{1,2}(?-u:\b)").expect("valid regex"));

/// A detected `(question, answer)` pair, 1-based as printed on the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAnswerEntry {
    pub question: usize,
    pub answer: AnswerMask,
}

impl ParsedAnswerEntry {
    /// Validate a raw pair. Questions outside `1..=100` and answers above 31
    /// are rejected.
    pub fn new(question: u32, answer: u32) -> Option<Self> {
        let question = usize::try_from(question).ok()?;
        if !(1..=MAX_QUESTIONS).contains(&question) || answer > u32::from(MAX_MASK) {
            return None;
        }
        let answer = AnswerMask::new(u8::try_from(answer).ok()?)?;
        Some(Self { question, answer })
    }

    /// 0-based question index.
    pub fn index(&self) -> usize {
        self.question - 1
    }
}

/// Sparse map from 0-based question index to detected answer.
///
/// An absent index means nothing was detected for that question, which is
/// distinct from a detected `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAnswers {
    answers: BTreeMap<usize, AnswerMask>,
}

impl ParsedAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry, overwriting any earlier detection for the question.
    pub fn insert(&mut self, entry: ParsedAnswerEntry) -> Option<AnswerMask> {
        self.answers.insert(entry.index(), entry.answer)
    }

    /// Record an entry only if the question has no detection yet.
    pub fn insert_if_absent(&mut self, entry: ParsedAnswerEntry) -> bool {
        match self.answers.entry(entry.index()) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(entry.answer);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Detected answer at a 0-based index.
    pub fn get(&self, index: usize) -> Option<AnswerMask> {
        self.answers.get(&index).copied()
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Detections as 1-based entries, ordered by question.
    pub fn entries(&self) -> impl Iterator<Item = ParsedAnswerEntry> + '_ {
        self.answers.iter().map(|(&index, &answer)| ParsedAnswerEntry {
            question: index + 1,
            answer,
        })
    }

    /// Dense array form: one slot per index up to the highest detection,
    /// `None` where nothing was detected.
    pub fn to_sparse_vec(&self) -> Vec<Option<u8>> {
        let len = self.answers.keys().next_back().map_or(0, |&last| last + 1);
        let mut dense = vec![None; len];
        for (&index, answer) in &self.answers {
            dense[index] = Some(answer.value());
        }
        dense
    }
}

impl FromIterator<ParsedAnswerEntry> for ParsedAnswers {
    fn from_iter<I: IntoIterator<Item = ParsedAnswerEntry>>(iter: I) -> Self {
        let mut answers = Self::new();
        for entry in iter {
            answers.insert(entry);
        }
        answers
    }
}

/// Parse recognized text into detected answers. Never fails; unreadable text
/// yields an empty map.
pub fn parse_answers(text: &str) -> ParsedAnswers {
    let mut answers = ParsedAnswers::new();

    for line in text.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(entry) = parse_line(line) {
            answers.insert(entry);
        }
    }

    if answers.is_empty() {
        answers = parse_flattened(text);
        if !answers.is_empty() {
            tracing::debug!(
                detected = answers.len(),
                "no structured lines found, paired standalone numbers"
            );
        }
    }

    answers
}

/// Match a single trimmed line. The first pattern whose shape matches decides
/// the line, even when its numbers are out of range.
pub fn parse_line(line: &str) -> Option<ParsedAnswerEntry> {
    LinePattern::ALL
        .iter()
        .find_map(|pattern| pattern.regex().captures(line))
        .and_then(|caps| entry_from_digits(&caps[1], &caps[2]))
}

/// Pair every standalone 1–2 digit number in the text as question/answer.
/// Invalid pairs are dropped without re-aligning the pairing, and a trailing
/// unpaired number is ignored.
pub fn parse_flattened(text: &str) -> ParsedAnswers {
    let numbers: Vec<&str> = STANDALONE_NUMBER
        .find_iter(text)
        .map(|m| m.as_str())
        .collect();

    numbers
        .chunks_exact(2)
        .filter_map(|pair| entry_from_digits(pair[0], pair[1]))
        .collect()
}

fn entry_from_digits(question: &str, answer: &str) -> Option<ParsedAnswerEntry> {
    let question = question.parse::<u32>().ok()?;
    let answer = answer.parse::<u32>().ok()?;
    ParsedAnswerEntry::new(question, answer)
}
