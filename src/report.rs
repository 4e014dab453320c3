use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write;

use crate::evaluator::{ExamOutcome, QuestionOutcome};
use crate::scoring::MARKS_PER_QUESTION;

const EXAM_REJECTED: &str = "Unable to detect proper answers. Please upload a clear image.";
const ANSWER_NOT_DETECTED: &str = "Selected question answer not detected properly.";
const NO_ANSWER: &str = "No answer detected.";

pub fn render_exam(outcome: &ExamOutcome) -> String {
    let mut out = String::new();
    match outcome {
        ExamOutcome::Rejected { reason } => {
            let _ = writeln!(out, "{EXAM_REJECTED}");
            let _ = writeln!(out, "Reason: {reason}");
        }
        ExamOutcome::Graded(result) => {
            let _ = writeln!(out, "Evaluation Result");
            for question in &result.questions {
                let _ = writeln!(
                    out,
                    "{} -> {}/{} | Similarity: {:.2}%",
                    question.label, question.marks, MARKS_PER_QUESTION, question.similarity
                );
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "Total Marks: {}/{}", result.total_marks, result.max_marks);
            let _ = writeln!(out, "Percentage: {:.2}%", result.percentage);
            let _ = writeln!(out, "Result: {}", result.grade);
        }
    }
    out
}

pub fn render_question(outcome: &QuestionOutcome) -> String {
    let mut out = String::new();
    match outcome {
        QuestionOutcome::Rejected { reason } => {
            let _ = writeln!(out, "{reason}");
        }
        QuestionOutcome::Graded(report) => {
            let result = &report.result;
            if !result.answer_detected {
                let _ = writeln!(out, "Warning: {ANSWER_NOT_DETECTED}");
            }
            let _ = writeln!(out, "Evaluation Result");
            let _ = writeln!(out, "{} -> {}/{}", result.label, result.marks, MARKS_PER_QUESTION);
            let _ = writeln!(out, "Similarity: {:.2}%", result.similarity);
            let _ = writeln!(out);
            let _ = writeln!(out, "Detected answer:");
            if report.answer.is_empty() {
                let _ = writeln!(out, "{NO_ANSWER}");
            } else {
                let _ = writeln!(out, "{}", report.answer);
            }
        }
    }
    out
}

pub fn render_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).with_context(|| "failed to serialize result")
}
