use axum::http::StatusCode;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{error, info};

use super::models::{EvaluateRequest, EvaluateResponse};
use super::state::ServerState;
use crate::ocr;

#[derive(Debug)]
pub(crate) struct ServerError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl ServerError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::internal(format!("{:#}", err))
    }
}

/// Input problems map to 400; anything failing inside OCR maps to 500.
pub(crate) fn evaluate_request(
    state: &ServerState,
    payload: EvaluateRequest,
) -> Result<EvaluateResponse, ServerError> {
    let bytes = decode_payload(&payload.image_base64)?;
    let image = ocr::decode_image(&bytes)
        .map_err(|err| ServerError::bad_request(format!("{:#}", err)))?;
    let evaluator = &state.evaluator;

    match payload.question.as_deref().map(str::trim) {
        Some(label) if !label.is_empty() => {
            if evaluator.answer_key().resolve(label).is_none() {
                return Err(ServerError::bad_request(format!(
                    "unknown question label: {} (available: {})",
                    label,
                    evaluator.answer_key().labels().join(", ")
                )));
            }
            info!(label, "evaluating single question");
            let outcome = evaluator.evaluate_question(&image, label).map_err(|err| {
                error!(error = %err, "question evaluation failed");
                ServerError::from(err)
            })?;
            Ok(EvaluateResponse::Question(outcome))
        }
        _ => {
            info!("evaluating full exam");
            let outcome = evaluator.evaluate_exam(&image).map_err(|err| {
                error!(error = %err, "exam evaluation failed");
                ServerError::from(err)
            })?;
            Ok(EvaluateResponse::Exam(outcome))
        }
    }
}

fn decode_payload(raw: &str) -> Result<Vec<u8>, ServerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ServerError::bad_request("image_base64 is required"));
    }
    let encoded = match trimmed.split_once(',') {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => trimmed,
    };
    BASE64
        .decode(encoded)
        .map_err(|err| ServerError::bad_request(format!("invalid base64 image: {}", err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{Evaluator, ExamOutcome, QuestionOutcome};
    use crate::ocr::OcrEngine;
    use crate::server::state::SharedEngine;
    use crate::settings::Settings;
    use anyhow::{Result, anyhow};
    use image::{GrayImage, Luma};

    struct ScriptedEngine(Result<String, String>);

    impl OcrEngine for ScriptedEngine {
        fn recognize(&self, _image: &GrayImage) -> Result<String> {
            self.0.clone().map_err(|message| anyhow!(message))
        }
    }

    fn state(ocr: Result<String, String>) -> ServerState {
        let settings = Settings::from_toml_str("").expect("settings");
        let engine: SharedEngine = Box::new(ScriptedEngine(ocr));
        ServerState {
            evaluator: Evaluator::new(engine, settings),
        }
    }

    fn png_base64() -> String {
        let mut bytes = std::io::Cursor::new(Vec::new());
        GrayImage::from_pixel(2, 2, Luma([255]))
            .write_to(&mut bytes, image::ImageFormat::Png)
            .expect("encode");
        BASE64.encode(bytes.into_inner())
    }

    fn request(image_base64: String, question: Option<&str>) -> EvaluateRequest {
        EvaluateRequest {
            image_base64,
            question: question.map(str::to_string),
        }
    }

    #[test]
    fn missing_image_is_bad_request() {
        let err = evaluate_request(&state(Ok(String::new())), request(String::new(), None))
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn garbage_base64_is_bad_request() {
        let err = evaluate_request(&state(Ok(String::new())), request("@@@".into(), None))
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("invalid base64"));
    }

    #[test]
    fn unknown_question_is_bad_request() {
        let err = evaluate_request(&state(Ok(String::new())), request(png_base64(), Some("Q7")))
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn ocr_failure_is_internal_error() {
        let err = evaluate_request(
            &state(Err("tesseract failed: boom".into())),
            request(png_base64(), None),
        )
        .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message.contains("boom"));
    }

    #[test]
    fn data_url_exam_request_is_graded() {
        let payload = format!("data:image/png;base64,{}", png_base64());
        let response = evaluate_request(
            &state(Ok("no labels here, only a long line of text".into())),
            request(payload, None),
        )
        .expect("response");
        assert!(matches!(
            response,
            EvaluateResponse::Exam(ExamOutcome::Rejected { .. })
        ));
    }

    #[test]
    fn question_request_returns_question_outcome() {
        let response = evaluate_request(
            &state(Ok("Q1: plants use sunlight to make glucose\nQ2: energy".into())),
            request(png_base64(), Some("q1")),
        )
        .expect("response");
        let EvaluateResponse::Question(QuestionOutcome::Graded(report)) = response else {
            panic!("expected graded question");
        };
        assert_eq!(report.result.label, "Q1");
        assert!(report.result.answer_detected);
    }
}
