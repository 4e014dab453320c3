use anyhow::{Result, anyhow};
use image::DynamicImage;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

use crate::answer_key::{AnswerEntry, AnswerKey};
use crate::ocr::{self, OcrEngine};
use crate::scoring::{self, ExamResult, QuestionResult, SimilarityModel, TfidfCosine};
use crate::segment::split_answers;
use crate::settings::Settings;

/// Why a whole sheet could not be graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// OCR produced too little text to be an answer sheet.
    IllegibleText,
    /// Text was read but no question label could be located.
    NoQuestionLabels,
}

impl Rejection {
    pub fn message(self) -> &'static str {
        match self {
            Rejection::IllegibleText => {
                "Unable to read text from image. Please upload clearer image."
            }
            Rejection::NoQuestionLabels => "No valid question labels detected.",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExamOutcome {
    Graded(ExamResult),
    Rejected { reason: Rejection },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionReport {
    pub result: QuestionResult,
    /// Trimmed answer text found for the question; empty when none was found.
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuestionOutcome {
    Graded(QuestionReport),
    Rejected { reason: Rejection },
}

/// OCR -> validity gate -> segmentation -> scoring.
///
/// Holds only read-only state; every call builds its own intermediate data.
pub struct Evaluator<E, M = TfidfCosine> {
    engine: E,
    model: M,
    settings: Settings,
}

impl<E: OcrEngine> Evaluator<E, TfidfCosine> {
    pub fn new(engine: E, settings: Settings) -> Self {
        Self::with_model(engine, TfidfCosine, settings)
    }
}

impl<E: OcrEngine, M: SimilarityModel> Evaluator<E, M> {
    pub fn with_model(engine: E, model: M, settings: Settings) -> Self {
        Self {
            engine,
            model,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn answer_key(&self) -> &AnswerKey {
        &self.settings.answer_key
    }

    /// Grades every question on the sheet. OCR failures are returned as errors.
    pub fn evaluate_exam(&self, image: &DynamicImage) -> Result<ExamOutcome> {
        let raw_text = ocr::extract_text(&self.engine, image, self.settings.ocr_threshold)?;
        Ok(self.grade_exam_text(&raw_text))
    }

    /// Grades one question with the single-question marking scheme.
    pub fn evaluate_question(&self, image: &DynamicImage, label: &str) -> Result<QuestionOutcome> {
        self.check_label(label)?;
        let raw_text = ocr::extract_text(&self.engine, image, self.settings.ocr_threshold)?;
        self.grade_question_text(&raw_text, label)
    }

    pub fn grade_exam_text(&self, raw_text: &str) -> ExamOutcome {
        if !ocr::is_valid_text(raw_text, self.settings.min_text_chars) {
            warn!(chars = raw_text.len(), "OCR text failed the validity gate");
            return ExamOutcome::Rejected {
                reason: Rejection::IllegibleText,
            };
        }

        let key = self.answer_key();
        let segmented = split_answers(raw_text, &key.labels());
        let scheme = self.settings.exam_scheme();
        match scoring::evaluate_all(&segmented, key, &scheme, &self.model) {
            Some(result) => {
                info!(
                    total = result.total_marks,
                    max = result.max_marks,
                    grade = %result.grade,
                    "exam graded"
                );
                ExamOutcome::Graded(result)
            }
            None => {
                warn!("no question labels found in OCR text");
                ExamOutcome::Rejected {
                    reason: Rejection::NoQuestionLabels,
                }
            }
        }
    }

    pub fn grade_question_text(&self, raw_text: &str, label: &str) -> Result<QuestionOutcome> {
        let entry = self.check_label(label)?;
        if raw_text.trim().chars().count() < self.settings.single_min_text_chars {
            warn!(chars = raw_text.len(), "OCR text too short for single question");
            return Ok(QuestionOutcome::Rejected {
                reason: Rejection::IllegibleText,
            });
        }

        let key = self.answer_key();
        let segmented = split_answers(raw_text, &key.labels());
        if !segmented.has_any_answer() {
            warn!("no question labels found in OCR text");
            return Ok(QuestionOutcome::Rejected {
                reason: Rejection::NoQuestionLabels,
            });
        }

        let answer = segmented.answer(&entry.label).trim();
        let result = self.settings.question_scheme().grade_answer(
            &self.model,
            &entry.label,
            answer,
            &entry.text,
        );
        if !result.answer_detected {
            warn!(label = %entry.label, "selected question answer not detected");
        }
        info!(
            label = %entry.label,
            marks = result.marks,
            similarity = result.similarity,
            "question graded"
        );
        Ok(QuestionOutcome::Graded(QuestionReport {
            result,
            answer: answer.to_string(),
        }))
    }

    fn check_label(&self, label: &str) -> Result<&AnswerEntry> {
        let key = self.answer_key();
        key.resolve(label).ok_or_else(|| {
            anyhow!(
                "unknown question label: {} (available: {})",
                label,
                key.labels().join(", ")
            )
        })
    }
}
