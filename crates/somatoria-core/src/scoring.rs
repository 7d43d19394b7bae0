//! Partial-credit scoring for sum-coded questions.
//!
//! A question is worth one unit. Marking any option that is not in the key
//! zeroes the question; otherwise credit is the share of key options the
//! student marked. A key of `0` ("mark nothing") is all-or-nothing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mask::AnswerMask;
use crate::model::{Subject, DEFAULT_POINTS_PER_QUESTION};

/// Exact per-question credit as `earned / possible` option counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    pub earned: u32,
    pub possible: u32,
}

impl Credit {
    pub const FULL: Credit = Credit {
        earned: 1,
        possible: 1,
    };

    pub const NONE: Credit = Credit {
        earned: 0,
        possible: 1,
    };

    /// Credit as a fraction in `[0, 1]`.
    pub fn value(self) -> f64 {
        if self.possible == 0 {
            return 0.0;
        }
        f64::from(self.earned) / f64::from(self.possible)
    }

    pub fn classification(self) -> Classification {
        if self.earned == 0 {
            Classification::Incorrect
        } else if self.earned >= self.possible {
            Classification::Correct
        } else {
            Classification::Partial
        }
    }
}

/// How a question was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Correct,
    Partial,
    Incorrect,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Correct => write!(f, "correct"),
            Classification::Partial => write!(f, "partial"),
            Classification::Incorrect => write!(f, "incorrect"),
        }
    }
}

/// Score one question.
pub fn score_question(key: AnswerMask, answer: AnswerMask) -> Credit {
    let key_options = key.options();
    let marked = answer.options();

    if marked.iter().any(|option| !key_options.contains(option)) {
        return Credit {
            earned: 0,
            possible: key_options.len().max(1) as u32,
        };
    }

    if key_options.is_empty() {
        return if answer.is_empty() {
            Credit::FULL
        } else {
            Credit::NONE
        };
    }

    let hits = marked
        .iter()
        .filter(|option| key_options.contains(option))
        .count();

    Credit {
        earned: hits as u32,
        possible: key_options.len() as u32,
    }
}

/// Result for a single question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResult {
    /// 1-based question number.
    pub number: usize,
    pub key: AnswerMask,
    pub answer: AnswerMask,
    pub credit: Credit,
    /// Credit as a fraction in `[0, 1]`.
    pub score: f64,
    pub classification: Classification,
}

impl QuestionResult {
    /// Hover text in the form `Q7: 0.67 (67%)`.
    pub fn summary(&self) -> String {
        format!(
            "Q{}: {:.2} ({:.0}%)",
            self.number,
            self.score,
            self.score * 100.0
        )
    }
}

/// Aggregate result for one subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectResult {
    pub name: String,
    pub start: usize,
    pub end: usize,
    /// Sum of question scores in the subject.
    pub raw_score: f64,
    /// Number of graded questions that fell in the subject.
    pub question_count: usize,
    /// `raw_score` times the per-question weight.
    pub points: f64,
    /// `question_count` times the per-question weight.
    pub max_points: f64,
}

impl SubjectResult {
    /// `3.67 / 5`
    pub fn score_label(&self) -> String {
        format!("{:.2} / {}", self.raw_score, self.question_count)
    }

    /// `55.0 / 75`
    pub fn points_label(&self) -> String {
        format!("{:.1} / {}", self.points, self.max_points)
    }
}

/// Full grading output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeResult {
    pub questions: Vec<QuestionResult>,
    pub subjects: Vec<SubjectResult>,
    /// Sum of all question scores.
    pub raw_score: f64,
    pub total_points: f64,
    pub max_points: f64,
    pub points_per_question: f64,
    /// Questions that belong to no subject. They count towards the total only.
    #[serde(default)]
    pub unassigned_questions: Vec<usize>,
}

impl GradeResult {
    pub fn count(&self, classification: Classification) -> usize {
        self.questions
            .iter()
            .filter(|q| q.classification == classification)
            .count()
    }

    /// `540.0 / 900`
    pub fn total_label(&self) -> String {
        format!("{:.1} / {}", self.total_points, self.max_points)
    }
}

/// Grades answer sheets against a key.
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    points_per_question: f64,
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self::new(DEFAULT_POINTS_PER_QUESTION)
    }
}

impl ScoreEngine {
    pub fn new(points_per_question: f64) -> Self {
        Self {
            points_per_question,
        }
    }

    pub fn points_per_question(&self) -> f64 {
        self.points_per_question
    }

    /// Grade `answers` against `key`. The key length is the question count;
    /// missing answers count as empty.
    pub fn grade(
        &self,
        key: &[AnswerMask],
        answers: &[AnswerMask],
        subjects: &[Subject],
    ) -> GradeResult {
        let weight = self.points_per_question;
        let mut subject_totals: Vec<(f64, usize)> = vec![(0.0, 0); subjects.len()];
        let mut questions = Vec::with_capacity(key.len());
        let mut unassigned_questions = Vec::new();
        let mut raw_score = 0.0;

        for (index, &key_mask) in key.iter().enumerate() {
            let number = index + 1;
            let answer = answers.get(index).copied().unwrap_or_default();
            let credit = score_question(key_mask, answer);
            let score = credit.value();
            raw_score += score;

            match subjects.iter().position(|s| s.contains(number)) {
                Some(slot) => {
                    subject_totals[slot].0 += score;
                    subject_totals[slot].1 += 1;
                }
                None => unassigned_questions.push(number),
            }

            questions.push(QuestionResult {
                number,
                key: key_mask,
                answer,
                credit,
                score,
                classification: credit.classification(),
            });
        }

        if !unassigned_questions.is_empty() {
            tracing::debug!(
                count = unassigned_questions.len(),
                "questions outside every subject range"
            );
        }

        let subjects = subjects
            .iter()
            .zip(subject_totals)
            .map(|(subject, (raw, count))| SubjectResult {
                name: subject.name.clone(),
                start: subject.start,
                end: subject.end,
                raw_score: raw,
                question_count: count,
                points: raw * weight,
                max_points: count as f64 * weight,
            })
            .collect();

        GradeResult {
            questions,
            subjects,
            raw_score,
            total_points: raw_score * weight,
            max_points: key.len() as f64 * weight,
            points_per_question: weight,
            unassigned_questions,
        }
    }

    /// Grade raw stored integers. Values above 31 are scored as empty answers.
    pub fn grade_raw(&self, key: &[u32], answers: &[u32], subjects: &[Subject]) -> GradeResult {
        let key: Vec<AnswerMask> = key.iter().map(|&v| AnswerMask::from_raw_lossy(v)).collect();
        let answers: Vec<AnswerMask> = answers
            .iter()
            .map(|&v| AnswerMask::from_raw_lossy(v))
            .collect();
        self.grade(&key, &answers, subjects)
    }
}
