//! OCR engine seam.
//!
//! The pipeline treats the engine as an opaque, possibly slow, possibly
//! failing black box behind the [`Engine`] trait. The default implementation
//! wraps `ocr-rs` (Rust PaddleOCR bindings); engines are sensitive to input
//! quality, so all preprocessing happens in [`crate::preprocess`] before an
//! image reaches this module.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::image::Image;
use crate::recognize::{Progress, Status};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine could not be brought up (missing/invalid model files).
    /// Fatal for the current recognition call; a later call may retry.
    #[error("OCR engine initialization failed")]
    Init(#[source] anyhow::Error),

    /// A single recognition invocation failed. The orchestrator absorbs this
    /// per region and keeps going.
    #[error("OCR recognition failed")]
    Recognize(#[source] anyhow::Error),
}

/// Layout hint for the text expected inside a region.
///
/// Carried per region and forwarded to the engine with every invocation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionMode {
    /// A block of left-aligned lines (the skill list).
    #[default]
    Block,
    /// One line of text (the category header).
    SingleLine,
    /// A single word or number.
    SingleWord,
    /// Text scattered over the region in no particular order.
    Sparse,
}

/// External OCR engine contract.
///
/// `initialize` must be idempotent after its first success and reports
/// through the same progress channel as recognition. `recognize` returns the
/// raw recognized text with lines separated by `\n`.
pub trait Engine: Send {
    fn initialize(&mut self, report: &mut dyn FnMut(Progress)) -> Result<(), EngineError>;

    fn recognize(&mut self, image: Image<'_>, mode: RecognitionMode) -> Result<String, EngineError>;
}

/// `ocr-rs` (PaddleOCR) backed engine.
///
/// Construction only records the model paths; the expensive model load is
/// deferred to the first `initialize` call so a recognizer can be built
/// eagerly at startup without paying for models the user may never use.
pub struct PaddleEngine {
    detection: PathBuf,
    recognition: PathBuf,
    charset: PathBuf,
    engine: Option<ocr_rs::OcrEngine>,
}

impl PaddleEngine {
    pub fn new(
        detection: impl AsRef<Path>,
        recognition: impl AsRef<Path>,
        charset: impl AsRef<Path>,
    ) -> Self {
        Self {
            detection: detection.as_ref().to_path_buf(),
            recognition: recognition.as_ref().to_path_buf(),
            charset: charset.as_ref().to_path_buf(),
            engine: None,
        }
    }
}

impl Engine for PaddleEngine {
    fn initialize(&mut self, report: &mut dyn FnMut(Progress)) -> Result<(), EngineError> {
        if self.engine.is_some() {
            return Ok(());
        }

        report(Progress {
            status: Status::Loading,
            text: "OCR 엔진 로딩 중...".to_string(),
            progress: 0.0,
        });

        let thread_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        let engine = ocr_rs::OcrEngine::new(
            &self.detection,
            &self.recognition,
            &self.charset,
            Some(ocr_rs::OcrEngineConfig {
                backend: ocr_rs::Backend::CPU,
                thread_count,
                // High precision helps on small stylized glyphs at a CPU cost;
                // preprocessing still matters more than this knob.
                precision_mode: ocr_rs::PrecisionMode::High,
                enable_parallel: thread_count > 1,
                min_result_confidence: 0.5,
                ..Default::default()
            }),
        )
        .context("load OCR models")
        .map_err(EngineError::Init)?;

        self.engine = Some(engine);

        report(Progress {
            status: Status::Loading,
            text: "OCR 엔진 준비 완료".to_string(),
            progress: 1.0,
        });
        Ok(())
    }

    fn recognize(&mut self, image: Image<'_>, mode: RecognitionMode) -> Result<String, EngineError> {
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| EngineError::Recognize(anyhow::anyhow!("engine not initialized")))?;

        let image =
            ocr_rs::preprocess::rgb_to_image(&image.get_bytes(), image.width(), image.height());

        let results = engine
            .recognize(&image)
            .context("recognize")
            .map_err(EngineError::Recognize)?;

        // ocr-rs has no layout parameter; the hint only decides how detected
        // fragments are joined back together.
        let separator = match mode {
            RecognitionMode::Block | RecognitionMode::Sparse => "\n",
            RecognitionMode::SingleLine | RecognitionMode::SingleWord => " ",
        };

        Ok(results
            .into_iter()
            .map(|v| v.text)
            .collect::<Vec<_>>()
            .join(separator))
    }
}
