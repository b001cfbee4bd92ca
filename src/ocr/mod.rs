//! Text extraction (OCR) for uploaded images.
//!
//! Wraps a Tesseract engine (via leptess) behind [`TextExtractor`]. The
//! engine handle is created lazily on first use, shared across concurrent
//! requests behind an async mutex (Tesseract is not reentrant), and torn
//! down explicitly on shutdown.
//!
//! Extraction applies image preprocessing (dimension checks, downscaling,
//! grayscale), enforces a hard per-pass timeout, and retries once with an
//! alternate page-segmentation mode when the first pass comes back with
//! low confidence.

mod cleanup;
mod preprocessing;
mod provider;

pub use cleanup::{fix_character_confusions, normalize_text};
pub use preprocessing::preprocess_image;
pub use provider::{ExtractionResult, TextExtractor};
