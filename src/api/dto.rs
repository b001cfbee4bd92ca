//! Request and response shapes for the HTTP surface. All wire fields are
//! camelCase.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{
    GenerationMetadata, NoteSummary, Pagination, ProcessedNote, ProcessingOptions,
};

/// Descriptor of a stored upload, returned by `POST /upload/image` and
/// nested in the process payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalImage {
    pub filename: String,
    pub original_filename: String,
    pub url: String,
    pub size: u64,
    pub mime_type: String,
}

/// Extraction result as it appears on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrData {
    pub text: String,
    pub confidence: f32,
    pub words: u32,
    pub lines: u32,
    pub paragraphs: u32,
}

/// `note_id` is `null` when the note could not be persisted; the extracted
/// text and generated notes are still returned.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMetadata {
    pub note_id: Option<String>,
    pub ai_metadata: Option<GenerationMetadata>,
    pub options: ProcessingOptions,
    pub saved: bool,
}

/// Payload returned by `POST /notes/process`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessData {
    pub original_image: OriginalImage,
    pub ocr: OcrData,
    pub ai_notes: String,
    pub metadata: ProcessMetadata,
}

/// Payload returned by `POST /notes/ocr-only`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrOnlyData {
    pub original_filename: String,
    pub ocr: OcrData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteListData {
    pub notes: Vec<NoteSummary>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryData {
    pub notes: Vec<ProcessedNote>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedData {
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub llm_model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<u32>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub tag: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SearchQuery {
    #[validate(length(min = 1, message = "Search query cannot be empty"))]
    pub q: String,
    pub limit: Option<u32>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TagsRequest {
    #[validate(length(min = 1, message = "At least one tag is required"))]
    pub tags: Vec<String>,
}
