//! Grading session: the exam being graded plus one student's answers.

use crate::error::SessionError;
use crate::mask::AnswerMask;
use crate::model::{ExamDefinition, MAX_QUESTIONS, MIN_QUESTIONS};
use crate::parser::ParsedAnswers;
use crate::scoring::{GradeResult, ScoreEngine};

/// Everything needed to grade one answer sheet.
///
/// Key and answers always have exactly `question_count` entries. Student
/// answers start out empty and are filled by hand or from OCR detections.
#[derive(Debug, Clone)]
pub struct GradingSession {
    exam: ExamDefinition,
    answers: Vec<AnswerMask>,
}

impl GradingSession {
    /// Start a session for an exam. The key is padded or truncated to the
    /// exam's question count.
    pub fn new(exam: ExamDefinition) -> Result<Self, SessionError> {
        check_question_count(exam.question_count)?;
        let count = exam.question_count;
        let exam = exam.with_question_count(count);
        Ok(Self {
            answers: vec![AnswerMask::EMPTY; count],
            exam,
        })
    }

    /// Change the number of questions, keeping existing key entries and
    /// clearing student answers.
    pub fn resize(&mut self, count: usize) -> Result<(), SessionError> {
        check_question_count(count)?;
        self.exam = self.exam.clone().with_question_count(count);
        self.answers = vec![AnswerMask::EMPTY; count];
        Ok(())
    }

    pub fn exam(&self) -> &ExamDefinition {
        &self.exam
    }

    pub fn question_count(&self) -> usize {
        self.exam.question_count
    }

    pub fn key(&self) -> &[AnswerMask] {
        &self.exam.key
    }

    pub fn answers(&self) -> &[AnswerMask] {
        &self.answers
    }

    /// Set the key for a 1-based question number.
    pub fn set_key(&mut self, question: usize, value: u32) -> Result<(), SessionError> {
        let index = self.index_of(question)?;
        self.exam.key[index] = to_mask(value)?;
        Ok(())
    }

    /// Set the student's answer for a 1-based question number.
    pub fn set_answer(&mut self, question: usize, value: u32) -> Result<(), SessionError> {
        let index = self.index_of(question)?;
        self.answers[index] = to_mask(value)?;
        Ok(())
    }

    /// Copy detected answers into the sheet. Detections for questions beyond
    /// the exam are ignored. Returns how many answers were filled.
    pub fn apply_detections(&mut self, detections: &ParsedAnswers) -> usize {
        let mut filled = 0;
        for entry in detections.entries() {
            if let Some(slot) = self.answers.get_mut(entry.index()) {
                *slot = entry.answer;
                filled += 1;
            }
        }
        filled
    }

    /// Reset every student answer to empty.
    pub fn clear_answers(&mut self) {
        self.answers.fill(AnswerMask::EMPTY);
    }

    /// Grade the current answers.
    pub fn grade(&self) -> GradeResult {
        ScoreEngine::new(self.exam.points_per_question).grade(
            &self.exam.key,
            &self.answers,
            &self.exam.subjects,
        )
    }

    fn index_of(&self, question: usize) -> Result<usize, SessionError> {
        let count = self.question_count();
        if question == 0 || question > count {
            return Err(SessionError::QuestionOutOfRange { question, count });
        }
        Ok(question - 1)
    }
}

fn check_question_count(count: usize) -> Result<(), SessionError> {
    if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&count) {
        return Err(SessionError::QuestionCountOutOfRange {
            got: count,
            min: MIN_QUESTIONS,
            max: MAX_QUESTIONS,
        });
    }
    Ok(())
}

fn to_mask(value: u32) -> Result<AnswerMask, SessionError> {
    u8::try_from(value)
        .ok()
        .and_then(AnswerMask::new)
        .ok_or(SessionError::AnswerOutOfRange(value))
}
