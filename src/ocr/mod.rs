mod preprocess;
mod tesseract;

use anyhow::{Context, Result, anyhow};
use image::{DynamicImage, GrayImage};
use tracing::debug;

use crate::normalize::normalize;

pub use preprocess::{binarize, to_grayscale};
pub use tesseract::TesseractEngine;

pub const DEFAULT_THRESHOLD: u8 = 150;
pub const DEFAULT_MIN_TEXT_CHARS: usize = 20;

/// Turns a binarized page into raw text.
pub trait OcrEngine {
    fn recognize(&self, image: &GrayImage) -> Result<String>;
}

impl<E: OcrEngine + ?Sized> OcrEngine for &E {
    fn recognize(&self, image: &GrayImage) -> Result<String> {
        (**self).recognize(image)
    }
}

impl<E: OcrEngine + ?Sized> OcrEngine for Box<E> {
    fn recognize(&self, image: &GrayImage) -> Result<String> {
        (**self).recognize(image)
    }
}

/// Grayscale, binarize at `threshold`, then OCR. The engine's text is
/// returned verbatim and its errors are passed through untouched.
pub fn extract_text<E: OcrEngine + ?Sized>(
    engine: &E,
    image: &DynamicImage,
    threshold: u8,
) -> Result<String> {
    let gray = to_grayscale(image);
    let binary = binarize(&gray, threshold);
    debug!(
        width = binary.width(),
        height = binary.height(),
        threshold,
        "running OCR"
    );
    engine.recognize(&binary)
}

/// Rejects blank pages and photos without legible text: the normalized text
/// must be longer than `min_chars`.
pub fn is_valid_text(raw_text: &str, min_chars: usize) -> bool {
    normalize(raw_text).len() > min_chars
}

/// Decodes an uploaded image, refusing bytes that are not an image format.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(anyhow!("image data is empty"));
    }
    if let Some(kind) = infer::get(bytes) {
        if !kind.mime_type().starts_with("image/") {
            return Err(anyhow!(
                "expected an image upload (detected '{}')",
                kind.mime_type()
            ));
        }
    }
    image::load_from_memory(bytes).with_context(|| "failed to decode image for OCR")
}
