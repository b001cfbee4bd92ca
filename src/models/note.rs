use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FailureStage, NoteStatus, NoteStyle};

const TEXT_PREVIEW_LEN: usize = 100;
const NOTES_PREVIEW_LEN: usize = 150;

/// Structural counts reported by the extraction pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ExtractionCounts {
    pub words: u32,
    pub lines: u32,
    pub paragraphs: u32,
}

/// Metadata describing one generation call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    pub model: String,
    pub input_length: usize,
    pub output_length: usize,
    pub finish_reason: Option<String>,
    pub duration_ms: u64,
}

/// Options the caller selected for a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingOptions {
    pub note_style: NoteStyle,
    pub subject: Option<String>,
    pub include_key_points: bool,
    pub include_summary: bool,
    pub include_questions: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            note_style: NoteStyle::default(),
            subject: None,
            include_key_points: true,
            include_summary: true,
            include_questions: true,
        }
    }
}

/// Nested metadata persisted with every note.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NoteMetadata {
    pub file_size: u64,
    pub mime_type: String,
    pub extraction: ExtractionCounts,
    pub generation: Option<GenerationMetadata>,
    pub options: ProcessingOptions,
}

/// Failure detail recorded when a pipeline run does not complete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FailureDetail {
    pub message: String,
    pub stage: FailureStage,
    pub timestamp: DateTime<Utc>,
}

/// The persisted result of one upload → OCR → generation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedNote {
    pub id: String,
    pub original_filename: String,
    pub image_path: String,
    pub image_url: String,
    pub ocr_text: String,
    pub ocr_confidence: Option<f32>,
    pub ai_notes: String,
    pub metadata: NoteMetadata,
    pub owner_id: String,
    pub tags: Vec<String>,
    pub status: NoteStatus,
    pub failure: Option<FailureDetail>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Draft record handed to the store. Id and timestamps are assigned by
/// the store on create.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub original_filename: String,
    pub image_path: String,
    pub image_url: String,
    pub ocr_text: String,
    pub ocr_confidence: Option<f32>,
    pub ai_notes: String,
    pub metadata: NoteMetadata,
    pub owner_id: String,
    pub tags: Vec<String>,
}

impl NewNote {
    /// Validates the draft against the completed-record invariants and
    /// returns the names of missing or invalid fields.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut invalid = Vec::new();

        if self.original_filename.trim().is_empty() {
            invalid.push("originalFilename".to_string());
        }
        if self.image_path.trim().is_empty() {
            invalid.push("imagePath".to_string());
        }
        if self.image_url.trim().is_empty() {
            invalid.push("imageUrl".to_string());
        }
        if self.ocr_text.trim().is_empty() {
            invalid.push("ocrText".to_string());
        }
        if self.ai_notes.trim().is_empty() {
            invalid.push("aiNotes".to_string());
        }
        if self.owner_id.trim().is_empty() {
            invalid.push("ownerId".to_string());
        }
        if let Some(confidence) = self.ocr_confidence {
            if !(0.0..=100.0).contains(&confidence) {
                invalid.push("ocrConfidence".to_string());
            }
        }

        if invalid.is_empty() {
            Ok(())
        } else {
            Err(invalid)
        }
    }
}

/// Query options for the paginated history listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryRequest {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Restrict to notes carrying this tag.
    pub tag: Option<String>,
}

/// Preview projection used by list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteSummary {
    pub id: String,
    pub original_filename: String,
    pub text_preview: String,
    pub notes_preview: String,
    pub ocr_confidence: Option<f32>,
    pub file_size: u64,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&ProcessedNote> for NoteSummary {
    fn from(note: &ProcessedNote) -> Self {
        Self {
            id: note.id.clone(),
            original_filename: note.original_filename.clone(),
            text_preview: text_preview(&note.ocr_text),
            notes_preview: notes_preview(&note.ai_notes),
            ocr_confidence: note.ocr_confidence,
            file_size: note.metadata.file_size,
            tags: note.tags.clone(),
            created_at: note.created_at,
        }
    }
}

/// Truncates extracted text to a short preview, appending an ellipsis when
/// anything was cut.
pub fn text_preview(text: &str) -> String {
    truncate_chars(text, TEXT_PREVIEW_LEN)
}

/// Strips markdown markup from generated notes and truncates the result.
pub fn notes_preview(notes: &str) -> String {
    let plain: String = notes.chars().filter(|c| !"#*`_~".contains(*c)).collect();
    truncate_chars(&plain, NOTES_PREVIEW_LEN)
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}

/// Normalizes a tag list: trim, lowercase, drop empties, deduplicate while
/// preserving first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for tag in tags {
        let cleaned = tag.as_ref().trim().to_lowercase();
        if cleaned.is_empty() {
            continue;
        }
        if seen.insert(cleaned.clone()) {
            out.push(cleaned);
        }
    }
    out
}
