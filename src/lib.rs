use anyhow::Result;
use std::path::Path;

pub mod answer_key;
pub mod evaluator;
pub mod logging;
pub mod normalize;
pub mod ocr;
pub mod report;
pub mod scoring;
pub mod segment;
pub mod server;
pub mod settings;

pub use answer_key::{AnswerEntry, AnswerKey};
pub use evaluator::{Evaluator, ExamOutcome, QuestionOutcome, QuestionReport, Rejection};
pub use ocr::{OcrEngine, TesseractEngine};
pub use scoring::{
    ExamResult, GradeBand, LadderKind, MarkingLadder, MarkingScheme, QuestionResult,
    SimilarityModel, TfidfCosine,
};
pub use segment::{SegmentedAnswers, split_answers};
pub use settings::Settings;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings_path: Option<String>,
    /// Grade only this question with the single-question scheme.
    pub question: Option<String>,
    pub json: bool,
    pub show_answer_key: bool,
}

/// Builds the default evaluator (Tesseract OCR, TF-IDF similarity).
pub fn build_evaluator(settings: Settings) -> Evaluator<TesseractEngine> {
    let engine = TesseractEngine::new(
        settings.tesseract_program.clone(),
        settings.tesseract_psm,
    );
    Evaluator::new(engine, settings)
}

pub fn load_config_settings(config: &Config) -> Result<Settings> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    settings::load_settings(settings_path)
}

/// Grades one uploaded sheet and renders the outcome.
pub fn run(config: Config, image_bytes: Option<Vec<u8>>) -> Result<String> {
    let settings = load_config_settings(&config)?;
    if config.show_answer_key {
        return Ok(format_answer_key(&settings.answer_key));
    }
    let evaluator = build_evaluator(settings);
    run_with(&evaluator, &config, image_bytes)
}

pub fn run_with<E: OcrEngine, M: SimilarityModel>(
    evaluator: &Evaluator<E, M>,
    config: &Config,
    image_bytes: Option<Vec<u8>>,
) -> Result<String> {
    let bytes = image_bytes.unwrap_or_default();
    let image = ocr::decode_image(&bytes)?;

    match config.question.as_deref() {
        Some(label) => {
            let outcome = evaluator.evaluate_question(&image, label)?;
            if config.json {
                report::render_json(&outcome)
            } else {
                Ok(report::render_question(&outcome))
            }
        }
        None => {
            let outcome = evaluator.evaluate_exam(&image)?;
            if config.json {
                report::render_json(&outcome)
            } else {
                Ok(report::render_exam(&outcome))
            }
        }
    }
}

fn format_answer_key(key: &AnswerKey) -> String {
    let mut lines = Vec::with_capacity(key.len());
    for entry in key.iter() {
        lines.push(format!("{}\t{}", entry.label, entry.text));
    }
    lines.join("\n")
}
