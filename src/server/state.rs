use crate::evaluator::Evaluator;
use crate::ocr::OcrEngine;

pub(crate) type SharedEngine = Box<dyn OcrEngine + Send + Sync>;

pub(crate) struct ServerState {
    pub(crate) evaluator: Evaluator<SharedEngine>,
}
