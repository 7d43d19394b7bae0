//! TOML exam definition parser.
//!
//! Loads exam definitions (answer key, weighting, subjects) from TOML files
//! and directories, and validates them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::mask::AnswerMask;
use crate::model::{
    ExamDefinition, Subject, DEFAULT_POINTS_PER_QUESTION, MAX_QUESTIONS, MIN_QUESTIONS,
};

/// Intermediate TOML structure for parsing and writing exam files.
#[derive(Debug, Serialize, Deserialize)]
struct TomlExamFile {
    exam: TomlExamHeader,
    #[serde(default)]
    subjects: Vec<TomlSubject>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TomlExamHeader {
    id: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    question_count: Option<usize>,
    #[serde(default = "default_points")]
    points_per_question: f64,
    #[serde(default)]
    key: Vec<u32>,
}

fn default_points() -> f64 {
    DEFAULT_POINTS_PER_QUESTION
}

#[derive(Debug, Serialize, Deserialize)]
struct TomlSubject {
    name: String,
    start: usize,
    end: usize,
}

/// Parse a single TOML file into an `ExamDefinition`.
pub fn parse_exam(path: &Path) -> Result<ExamDefinition> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exam file: {}", path.display()))?;

    parse_exam_str(&content, path)
}

/// Parse a TOML string into an `ExamDefinition` (useful for testing).
///
/// `question_count` defaults to the key length. The key is kept as written;
/// sessions pad or truncate it.
pub fn parse_exam_str(content: &str, source_path: &Path) -> Result<ExamDefinition> {
    let parsed: TomlExamFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let question_count = parsed
        .exam
        .question_count
        .unwrap_or(parsed.exam.key.len());
    anyhow::ensure!(
        (MIN_QUESTIONS..=MAX_QUESTIONS).contains(&question_count),
        "{}: question_count must be between {MIN_QUESTIONS} and {MAX_QUESTIONS}, got {question_count}",
        source_path.display()
    );

    let key = parsed
        .exam
        .key
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            u8::try_from(value)
                .ok()
                .and_then(AnswerMask::new)
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "{}: key entry for question {} is {value}, expected 0..=31",
                        source_path.display(),
                        i + 1
                    )
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let subjects = parsed
        .subjects
        .into_iter()
        .map(|s| Subject {
            name: s.name,
            start: s.start,
            end: s.end,
        })
        .collect();

    Ok(ExamDefinition {
        id: parsed.exam.id,
        name: parsed.exam.name,
        question_count,
        points_per_question: parsed.exam.points_per_question,
        key,
        subjects,
    })
}

/// Recursively load all `.toml` exam files from a directory.
pub fn load_exam_directory(dir: &Path) -> Result<Vec<ExamDefinition>> {
    let mut exams = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            exams.extend(load_exam_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_exam(&path) {
                Ok(exam) => exams.push(exam),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(exams)
}

/// Render an exam as TOML in the layout `parse_exam_str` reads.
pub fn render_exam_toml(exam: &ExamDefinition) -> Result<String> {
    let file = TomlExamFile {
        exam: TomlExamHeader {
            id: exam.id.clone(),
            name: exam.name.clone(),
            question_count: Some(exam.question_count),
            points_per_question: exam.points_per_question,
            key: exam.key.iter().map(|k| u32::from(k.value())).collect(),
        },
        subjects: exam
            .subjects
            .iter()
            .map(|s| TomlSubject {
                name: s.name.clone(),
                start: s.start,
                end: s.end,
            })
            .collect(),
    };

    toml::to_string(&file).with_context(|| format!("failed to serialize exam '{}'", exam.id))
}

/// A warning from exam validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The subject involved (if applicable).
    pub subject: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn exam(message: impl Into<String>) -> Self {
        Self {
            subject: None,
            message: message.into(),
        }
    }

    fn subject(name: &str, message: impl Into<String>) -> Self {
        Self {
            subject: Some(name.to_string()),
            message: message.into(),
        }
    }
}

/// Validate an exam for common configuration mistakes.
///
/// Grading is only meaningful when the subjects partition the question range
/// exactly, so gaps and overlaps are reported.
pub fn validate_exam(exam: &ExamDefinition) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let count = exam.question_count;

    if exam.key.len() != count {
        warnings.push(ValidationWarning::exam(format!(
            "key has {} entries but question_count is {count}; missing entries default to 0",
            exam.key.len()
        )));
    }

    if exam.points_per_question <= 0.0 {
        warnings.push(ValidationWarning::exam(format!(
            "points_per_question should be positive, got {}",
            exam.points_per_question
        )));
    }

    if exam.subjects.is_empty() {
        warnings.push(ValidationWarning::exam("no subjects defined"));
        return warnings;
    }

    let mut seen_names = std::collections::HashSet::new();
    for subject in &exam.subjects {
        if !seen_names.insert(subject.name.as_str()) {
            warnings.push(ValidationWarning::subject(
                &subject.name,
                format!("duplicate subject name: {}", subject.name),
            ));
        }
        if subject.start == 0 || subject.start > subject.end {
            warnings.push(ValidationWarning::subject(
                &subject.name,
                format!("invalid range {}-{}", subject.start, subject.end),
            ));
        } else if subject.end > count {
            warnings.push(ValidationWarning::subject(
                &subject.name,
                format!("range {}-{} extends past question {count}", subject.start, subject.end),
            ));
        }
    }

    let mut owners = vec![0usize; count];
    for subject in &exam.subjects {
        for question in subject.start.max(1)..=subject.end.min(count) {
            owners[question - 1] += 1;
        }
    }

    for (first, last) in runs(&owners, |n| n == 0) {
        warnings.push(ValidationWarning::exam(format!(
            "{} to no subject",
            questions_belong(first, last)
        )));
    }
    for (first, last) in runs(&owners, |n| n > 1) {
        warnings.push(ValidationWarning::exam(format!(
            "{} to more than one subject; the first listed subject is used",
            questions_belong(first, last)
        )));
    }

    warnings
}

/// Maximal runs of 1-based question numbers whose owner count matches.
fn runs(owners: &[usize], matches: impl Fn(usize) -> bool) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;

    for (i, &n) in owners.iter().enumerate() {
        match (matches(n), start) {
            (true, None) => start = Some(i + 1),
            (false, Some(s)) => {
                runs.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, owners.len()));
    }

    runs
}

fn questions_belong(first: usize, last: usize) -> String {
    if first == last {
        format!("question {first} belongs")
    } else {
        format!("questions {first}-{last} belong")
    }
}
