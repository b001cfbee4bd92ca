use std::sync::Arc;
use std::time::Duration;

use leptess::{LepTess, Variable};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::OcrConfig;
use crate::error::{QuillError, Result};

use super::cleanup::{fix_character_confusions, normalize_text};
use super::preprocessing::preprocess_image;

// Tesseract page-segmentation modes. Auto is the default; single-block is
// the fallback for dense handwritten or photographed pages.
const PSM_AUTO: &str = "3";
const PSM_SINGLE_BLOCK: &str = "6";

/// Outcome of a successful extraction.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Cleaned text, whitespace-normalized.
    pub text: String,
    /// Text exactly as the engine produced it.
    pub raw_text: String,
    /// Mean word confidence, 0 to 100.
    pub confidence: f32,
    pub words: u32,
    pub lines: u32,
    pub paragraphs: u32,
}

struct RecognitionPass {
    text: String,
    confidence: f32,
}

/// Tesseract-backed text extractor.
///
/// The engine handle is created lazily on first use (or eagerly via
/// [`TextExtractor::initialize`]) and shared behind an async mutex since
/// Tesseract is not reentrant. Recognition runs on the blocking pool with
/// a hard timeout per pass.
pub struct TextExtractor {
    engine: Arc<Mutex<Option<LepTess>>>,
    config: OcrConfig,
}

impl TextExtractor {
    pub fn new(config: OcrConfig) -> Self {
        Self {
            engine: Arc::new(Mutex::new(None)),
            config,
        }
    }

    /// Eagerly creates the engine so the first request does not pay the
    /// startup cost. Failure here is not fatal; extraction retries the
    /// initialization per request.
    pub async fn initialize(&self) -> Result<()> {
        let engine = Arc::clone(&self.engine);
        let languages = self.config.languages.clone();

        tokio::task::spawn_blocking(move || {
            let mut guard = engine.blocking_lock();
            if guard.is_none() {
                *guard = Some(create_engine(&languages)?);
            }
            Ok::<_, QuillError>(())
        })
        .await
        .map_err(|e| QuillError::Extraction(format!("OCR init task panicked: {e}")))??;

        info!(languages = %self.config.languages, "Tesseract OCR initialized");
        Ok(())
    }

    /// Drops the engine handle. Subsequent extractions would re-create it,
    /// so this is only called on shutdown.
    pub async fn shutdown(&self) {
        self.engine.lock().await.take();
        info!("OCR engine shut down");
    }

    /// Runs the full extraction pipeline on raw image bytes: preprocess,
    /// recognize, retry with an alternate segmentation mode when confidence
    /// is low, then clean the winning text.
    pub async fn extract(&self, image_bytes: &[u8]) -> Result<ExtractionResult> {
        let processed = preprocess_image(image_bytes, &self.config)?;

        let first = self.recognize(processed.clone(), PSM_AUTO).await?;

        let pass = if first.confidence < self.config.retry_confidence {
            debug!(
                confidence = first.confidence,
                threshold = self.config.retry_confidence,
                "low confidence, retrying with single-block segmentation"
            );
            match self.recognize(processed, PSM_SINGLE_BLOCK).await {
                Ok(second) => better_of(first, second),
                Err(e) => {
                    warn!(error = %e, "retry pass failed, keeping first result");
                    first
                }
            }
        } else {
            first
        };

        let cleaned = if self.config.fix_confusions {
            fix_character_confusions(&pass.text)
        } else {
            normalize_text(&pass.text)
        };

        // Empty output is returned as-is; whether that is an error is the
        // caller's call.
        Ok(ExtractionResult {
            words: count_words(&cleaned),
            lines: count_lines(&cleaned),
            paragraphs: count_paragraphs(&cleaned),
            text: cleaned,
            raw_text: pass.text,
            confidence: pass.confidence,
        })
    }

    async fn recognize(&self, bytes: Vec<u8>, psm: &str) -> Result<RecognitionPass> {
        let engine = Arc::clone(&self.engine);
        let languages = self.config.languages.clone();
        let psm = psm.to_string();

        let task = tokio::task::spawn_blocking(move || {
            let mut guard = engine.blocking_lock();
            if guard.is_none() {
                *guard = Some(create_engine(&languages)?);
            }
            let lt = guard
                .as_mut()
                .ok_or_else(|| QuillError::Internal("OCR engine missing after init".into()))?;

            lt.set_variable(Variable::TesseditPagesegMode, &psm)
                .map_err(|e| QuillError::Extraction(format!("Failed to set PSM: {e}")))?;
            lt.set_image_from_mem(&bytes)
                .map_err(|e| QuillError::Extraction(format!("Failed to set image: {e}")))?;

            let text = lt
                .get_utf8_text()
                .map_err(|e| QuillError::Extraction(format!("Failed to extract text: {e}")))?;
            let confidence = lt.mean_text_conf() as f32;

            Ok::<_, QuillError>(RecognitionPass { text, confidence })
        });

        let timeout = Duration::from_secs(self.config.timeout_secs);
        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => {
                joined.map_err(|e| QuillError::Extraction(format!("OCR task panicked: {e}")))?
            }
            Err(_) => Err(QuillError::ExtractionTimeout(self.config.timeout_secs)),
        }
    }
}

fn create_engine(languages: &str) -> Result<LepTess> {
    LepTess::new(None, languages)
        .map_err(|e| QuillError::Extraction(format!("Failed to initialize Tesseract: {e}")))
}

/// Keeps the higher-confidence pass. Ties go to the first pass.
fn better_of(first: RecognitionPass, second: RecognitionPass) -> RecognitionPass {
    if second.confidence > first.confidence {
        second
    } else {
        first
    }
}

fn count_words(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

fn count_lines(text: &str) -> u32 {
    text.lines().filter(|l| !l.trim().is_empty()).count() as u32
}

fn count_paragraphs(text: &str) -> u32 {
    text.split("\n\n").filter(|p| !p.trim().is_empty()).count() as u32
}
