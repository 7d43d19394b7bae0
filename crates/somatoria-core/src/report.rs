//! Grade report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::ExamDefinition;
use crate::scoring::{Classification, GradeResult};

/// A graded answer sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the exam.
    pub exam: ExamSummary,
    /// Who the sheet belongs to, if known.
    #[serde(default)]
    pub student: Option<String>,
    /// How many answers were filled from OCR detections.
    #[serde(default)]
    pub detected_answers: usize,
    /// The grading result.
    pub result: GradeResult,
}

/// Summary of an exam (without the key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSummary {
    pub id: String,
    pub name: String,
    pub question_count: usize,
    pub points_per_question: f64,
}

impl From<&ExamDefinition> for ExamSummary {
    fn from(exam: &ExamDefinition) -> Self {
        Self {
            id: exam.id.clone(),
            name: exam.name.clone(),
            question_count: exam.question_count,
            points_per_question: exam.points_per_question,
        }
    }
}

impl GradeReport {
    pub fn new(exam: &ExamDefinition, result: GradeResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            exam: ExamSummary::from(exam),
            student: None,
            detected_answers: 0,
            result,
        }
    }

    pub fn with_student(mut self, student: Option<String>) -> Self {
        self.student = student;
        self
    }

    pub fn with_detected_answers(mut self, count: usize) -> Self {
        self.detected_answers = count;
        self
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: GradeReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the subject table and final score as markdown.
    pub fn to_markdown(&self) -> String {
        let result = &self.result;
        let mut md = String::new();

        md.push_str(&format!("## {}\n\n", self.exam.name));
        if let Some(student) = &self.student {
            md.push_str(&format!("**Student:** {student}\n\n"));
        }
        md.push_str(&format!(
            "**Score:** {} ({} correct, {} partial, {} incorrect)\n\n",
            result.total_label(),
            result.count(Classification::Correct),
            result.count(Classification::Partial),
            result.count(Classification::Incorrect),
        ));

        md.push_str(&format!(
            "| Subject | Score | Points ({}/q) |\n",
            result.points_per_question
        ));
        md.push_str("|---------|-------|--------|\n");
        for s in &result.subjects {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                s.name,
                s.score_label(),
                s.points_label()
            ));
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LanguageVariant;
    use crate::scoring::ScoreEngine;

    fn sample_report() -> GradeReport {
        let exam = ExamDefinition::pss2_2025(LanguageVariant::Ingles);
        let result = ScoreEngine::default().grade(&exam.key, &exam.key, &exam.subjects);
        GradeReport::new(&exam, result).with_student(Some("Ana".into()))
    }

    #[test]
    fn json_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/report.json");
        let report = sample_report().with_detected_answers(12);
        report.save_json(&path).unwrap();

        let loaded = GradeReport::load_json(&path).unwrap();
        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.student.as_deref(), Some("Ana"));
        assert_eq!(loaded.detected_answers, 12);
        assert_eq!(loaded.result.total_points, 900.0);
        assert_eq!(loaded.result.questions[0].key.value(), 6);
    }

    #[test]
    fn load_missing_file_fails() {
        let err = GradeReport::load_json(Path::new("/nonexistent/report.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read report"));
    }

    #[test]
    fn markdown_lists_every_subject() {
        let md = sample_report().to_markdown();
        assert!(md.contains("**Student:** Ana"));
        assert!(md.contains("900.0 / 900"));
        assert!(md.contains("| Matemática | 5.00 / 5 | 75.0 / 75 |"));
        assert_eq!(md.matches("/ 75 |").count(), 12);
    }
}
