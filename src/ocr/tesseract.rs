use anyhow::{Context, Result, anyhow};
use image::GrayImage;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use super::OcrEngine;

/// Runs the `tesseract` command line tool once per image.
///
/// Each call writes its own temp PNG and spawns its own process, so one
/// engine can be shared between concurrent requests.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    program: PathBuf,
    psm: Option<u32>,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self {
            program: PathBuf::from("tesseract"),
            psm: None,
        }
    }
}

impl TesseractEngine {
    pub fn new(program: impl Into<PathBuf>, psm: Option<u32>) -> Self {
        Self {
            program: program.into(),
            psm,
        }
    }

    fn run(&self, path: &Path) -> Result<String> {
        let mut command = Command::new(&self.program);
        command.arg(path).arg("stdout");
        if let Some(psm) = self.psm {
            command.arg("--psm").arg(psm.to_string());
        }
        let output = command.output().with_context(|| {
            format!(
                "failed to run {} (is it installed?)",
                self.program.display()
            )
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("tesseract failed: {}", stderr.trim()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &GrayImage) -> Result<String> {
        let mut tmp = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .with_context(|| "failed to create temp file for OCR")?;
        image
            .write_to(&mut tmp, image::ImageFormat::Png)
            .with_context(|| "failed to write temp image for OCR")?;
        tmp.flush()
            .with_context(|| "failed to flush temp image for OCR")?;

        let text = self.run(tmp.path())?;
        debug!(chars = text.len(), "tesseract finished");
        Ok(text)
    }
}
