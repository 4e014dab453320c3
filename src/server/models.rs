use serde::{Deserialize, Serialize};

use crate::evaluator::{ExamOutcome, QuestionOutcome};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct EvaluateRequest {
    /// Plain base64 or a `data:image/...;base64,` URL.
    pub(crate) image_base64: String,
    pub(crate) question: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum EvaluateResponse {
    Exam(ExamOutcome),
    Question(QuestionOutcome),
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}
