//! Core data model types for somatoria.
//!
//! Exams, subjects and the built-in PSS 2 2025 preset.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::mask::AnswerMask;

/// Smallest number of questions an exam may have.
pub const MIN_QUESTIONS: usize = 1;

/// Largest number of questions an exam may have.
pub const MAX_QUESTIONS: usize = 100;

/// Points awarded for a fully correct question in the reference exam.
pub const DEFAULT_POINTS_PER_QUESTION: f64 = 15.0;

/// A named contiguous range of 1-based question numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Display name (e.g. "Matemática").
    pub name: String,
    /// First question number, inclusive.
    pub start: usize,
    /// Last question number, inclusive.
    pub end: usize,
}

impl Subject {
    pub fn new(name: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }

    /// Whether the 1-based question number falls in this subject.
    pub fn contains(&self, question: usize) -> bool {
        self.range().contains(&question)
    }

    pub fn range(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// A complete exam: answer key, weighting and subject partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamDefinition {
    /// Unique identifier for this exam.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Number of questions, in `1..=100`.
    pub question_count: usize,
    /// Points for a fully correct question.
    #[serde(default = "default_points")]
    pub points_per_question: f64,
    /// One mask per question. Files may hold fewer or more entries;
    /// sessions pad or truncate to `question_count`.
    pub key: Vec<AnswerMask>,
    /// Subjects in report order.
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

fn default_points() -> f64 {
    DEFAULT_POINTS_PER_QUESTION
}

impl ExamDefinition {
    /// Build the PSS 2 2025 exam for a foreign-language variant.
    pub fn pss2_2025(variant: LanguageVariant) -> Self {
        let preset = match variant {
            LanguageVariant::Ingles => &PSS2_2025_INGLES,
            LanguageVariant::Espanhol => &PSS2_2025_ESPANHOL,
        };

        Self {
            id: format!("pss2-2025-{variant}"),
            name: format!("PSS 2 2025 ({})", variant.display_name()),
            question_count: preset.len(),
            points_per_question: DEFAULT_POINTS_PER_QUESTION,
            key: preset.iter().map(|&v| AnswerMask::from_raw_lossy(v.into())).collect(),
            subjects: pss2_subjects(),
        }
    }

    /// Resize the key to `count` questions, padding with empty answers.
    pub fn with_question_count(mut self, count: usize) -> Self {
        self.key.resize(count, AnswerMask::EMPTY);
        self.question_count = count;
        self
    }

    /// Highest attainable point total.
    pub fn max_points(&self) -> f64 {
        self.question_count as f64 * self.points_per_question
    }
}

/// Foreign-language variant of the PSS exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageVariant {
    Ingles,
    Espanhol,
}

impl LanguageVariant {
    pub fn display_name(self) -> &'static str {
        match self {
            LanguageVariant::Ingles => "Inglês",
            LanguageVariant::Espanhol => "Espanhol",
        }
    }
}

impl fmt::Display for LanguageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageVariant::Ingles => write!(f, "ingles"),
            LanguageVariant::Espanhol => write!(f, "espanhol"),
        }
    }
}

impl FromStr for LanguageVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ingles" | "inglês" | "english" | "en" => Ok(LanguageVariant::Ingles),
            "espanhol" | "spanish" | "es" => Ok(LanguageVariant::Espanhol),
            other => Err(format!("unknown language variant: {other}")),
        }
    }
}

/// The twelve five-question subjects of the PSS 2 exam.
pub fn pss2_subjects() -> Vec<Subject> {
    const NAMES: [&str; 12] = [
        "Língua Portuguesa",
        "Língua Estrangeira",
        "Artes",
        "Ed. Física",
        "Matemática",
        "Física",
        "Química",
        "Biologia",
        "História",
        "Geografia",
        "Filosofia",
        "Sociologia",
    ];

    NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| Subject::new(*name, i * 5 + 1, i * 5 + 5))
        .collect()
}

#[rustfmt::skip]
const PSS2_2025_INGLES: [u8; 60] = [
    6, 10, 3, 13, 11, 15, 12, 14, 5, 15,
    9, 3, 7, 12, 14, 6, 11, 14, 10, 15,
    3, 9, 5, 13, 12, 13, 15, 5, 7, 6,
    14, 10, 12, 7, 3, 9, 15, 11, 5, 13,
    6, 14, 10, 7, 12, 11, 15, 3, 14, 5,
    13, 9, 15, 14, 6, 10, 3, 11, 7, 5,
];

// Differs from the English key in questions 6-10 only.
#[rustfmt::skip]
const PSS2_2025_ESPANHOL: [u8; 60] = [
    6, 10, 3, 13, 11, 9, 7, 3, 12, 11,
    9, 3, 7, 12, 14, 6, 11, 14, 10, 15,
    3, 9, 5, 13, 12, 13, 15, 5, 7, 6,
    14, 10, 12, 7, 3, 9, 15, 11, 5, 13,
    6, 14, 10, 7, 12, 11, 15, 3, 14, 5,
    13, 9, 15, 14, 6, 10, 3, 11, 7, 5,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_display_and_parse() {
        assert_eq!(LanguageVariant::Ingles.to_string(), "ingles");
        assert_eq!(
            "Espanhol".parse::<LanguageVariant>().unwrap(),
            LanguageVariant::Espanhol
        );
        assert_eq!("en".parse::<LanguageVariant>().unwrap(), LanguageVariant::Ingles);
        assert!("frances".parse::<LanguageVariant>().is_err());
    }

    #[test]
    fn pss2_subjects_partition_sixty_questions() {
        let subjects = pss2_subjects();
        assert_eq!(subjects.len(), 12);
        for q in 1..=60 {
            let owners = subjects.iter().filter(|s| s.contains(q)).count();
            assert_eq!(owners, 1, "question {q} owned by {owners} subjects");
        }
        assert_eq!(subjects[4].name, "Matemática");
        assert_eq!(subjects[4].range(), 21..=25);
    }

    #[test]
    fn presets_differ_only_in_foreign_language_block() {
        let en = ExamDefinition::pss2_2025(LanguageVariant::Ingles);
        let es = ExamDefinition::pss2_2025(LanguageVariant::Espanhol);
        assert_eq!(en.question_count, 60);
        assert_eq!(en.key.len(), 60);
        assert_eq!(en.max_points(), 900.0);
        for i in 0..60 {
            if (5..10).contains(&i) {
                continue;
            }
            assert_eq!(en.key[i], es.key[i], "question {} differs", i + 1);
        }
        assert_ne!(en.key[5..10], es.key[5..10]);
    }

    #[test]
    fn resize_pads_and_truncates() {
        let exam = ExamDefinition::pss2_2025(LanguageVariant::Ingles).with_question_count(70);
        assert_eq!(exam.key.len(), 70);
        assert_eq!(exam.key[69], AnswerMask::EMPTY);

        let exam = exam.with_question_count(10);
        assert_eq!(exam.key.len(), 10);
        assert_eq!(exam.question_count, 10);
        assert_eq!(exam.key[0].value(), 6);
    }
}
