mod grade;
mod ladder;
mod similarity;

use serde::Serialize;
use tracing::debug;

use crate::answer_key::AnswerKey;
use crate::segment::SegmentedAnswers;

pub use grade::GradeBand;
pub use ladder::{LadderKind, MARKS_PER_QUESTION, MarkingLadder, Tier};
pub use similarity::{SimilarityModel, TfidfCosine, similarity_score};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    pub label: String,
    pub similarity: f64,
    pub marks: u32,
    /// False when the answer was too short to be scored at all.
    pub answer_detected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamResult {
    pub questions: Vec<QuestionResult>,
    pub total_marks: u32,
    pub max_marks: u32,
    pub percentage: f64,
    pub grade: GradeBand,
}

impl ExamResult {
    pub fn new(questions: Vec<QuestionResult>) -> Self {
        let total_marks = questions.iter().map(|question| question.marks).sum();
        let max_marks = questions.len() as u32 * MARKS_PER_QUESTION;
        let percentage = if max_marks == 0 {
            0.0
        } else {
            f64::from(total_marks) / f64::from(max_marks) * 100.0
        };
        Self {
            questions,
            total_marks,
            max_marks,
            percentage,
            grade: GradeBand::from_percentage(percentage),
        }
    }
}

/// How one answer turns into marks.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkingScheme {
    pub ladder: MarkingLadder,
    /// Trimmed answers shorter than this count as not detected.
    pub min_answer_chars: usize,
}

impl MarkingScheme {
    pub const DEFAULT_MIN_ANSWER_CHARS: usize = 5;

    pub fn new(ladder: MarkingLadder) -> Self {
        Self {
            ladder,
            min_answer_chars: Self::DEFAULT_MIN_ANSWER_CHARS,
        }
    }

    pub fn grade_answer<M: SimilarityModel + ?Sized>(
        &self,
        model: &M,
        label: &str,
        answer: &str,
        reference: &str,
    ) -> QuestionResult {
        let answer = answer.trim();
        if answer.chars().count() < self.min_answer_chars {
            debug!(label, "answer not detected");
            return QuestionResult {
                label: label.to_string(),
                similarity: 0.0,
                marks: 0,
                answer_detected: false,
            };
        }

        let similarity = similarity_score(model, answer, reference);
        let marks = self.ladder.grade_question(similarity);
        debug!(label, similarity, marks, "graded answer");
        QuestionResult {
            label: label.to_string(),
            similarity,
            marks,
            answer_detected: true,
        }
    }
}

/// Grades every question in `key` against the segmented sheet.
///
/// Returns `None` when no label produced a usable answer. Labels missing
/// from `segmented` are graded as empty answers.
pub fn evaluate_all<M: SimilarityModel + ?Sized>(
    segmented: &SegmentedAnswers,
    key: &AnswerKey,
    scheme: &MarkingScheme,
    model: &M,
) -> Option<ExamResult> {
    if !segmented.has_any_answer() {
        return None;
    }
    let questions = key
        .iter()
        .map(|entry| {
            scheme.grade_answer(model, &entry.label, segmented.answer(&entry.label), &entry.text)
        })
        .collect();
    Some(ExamResult::new(questions))
}
