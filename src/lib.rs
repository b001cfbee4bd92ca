//! Quill: self-hostable study-notes service.
//!
//! Upload an image of handwritten or printed notes; Quill extracts the
//! text with Tesseract, turns it into organized Markdown study notes with
//! an OpenAI-compatible LLM, and persists the result in libsql.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod storage;
