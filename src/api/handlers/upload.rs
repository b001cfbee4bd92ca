//! Upload and processing handlers: the full pipeline, extraction-only,
//! and raw image storage.

use axum::extract::{Multipart, State};

use crate::api::dto::{OcrData, OcrOnlyData, OriginalImage, ProcessData, ProcessMetadata};
use crate::api::response::ApiResponse;
use crate::api::AppState;
use crate::error::{QuillError, Result};
use crate::models::{NoteStyle, ProcessingOptions};
use crate::ocr::ExtractionResult;

pub const DEFAULT_OWNER: &str = "anonymous";

fn parse_form_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parsed multipart upload form. The `image` part is required by every
/// handler; the rest only matter for the full pipeline.
struct UploadForm {
    image: Option<(String, Vec<u8>)>,
    style: Option<String>,
    subject: Option<String>,
    include_key_points: bool,
    include_summary: bool,
    include_questions: bool,
    tags: Vec<String>,
    owner_id: String,
}

impl UploadForm {
    fn into_image(self) -> Result<(String, Vec<u8>)> {
        self.image
            .ok_or_else(|| QuillError::Validation("No image file provided".to_string()))
    }

    fn options(&self) -> ProcessingOptions {
        ProcessingOptions {
            note_style: NoteStyle::from_request(self.style.as_deref()),
            subject: self.subject.clone().filter(|s| !s.trim().is_empty()),
            include_key_points: self.include_key_points,
            include_summary: self.include_summary,
            include_questions: self.include_questions,
        }
    }
}

async fn read_form(multipart: &mut Multipart) -> Result<UploadForm> {
    let mut form = UploadForm {
        image: None,
        style: None,
        subject: None,
        include_key_points: true,
        include_summary: true,
        include_questions: true,
        tags: Vec::new(),
        owner_id: DEFAULT_OWNER.to_string(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| QuillError::Validation(format!("Invalid multipart payload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    QuillError::Validation(format!("Failed to read image field: {e}"))
                })?;
                form.image = Some((filename, bytes.to_vec()));
            }
            "noteStyle" => form.style = Some(read_text(field).await?),
            "subject" => form.subject = Some(read_text(field).await?),
            "includeKeyPoints" => {
                form.include_key_points =
                    parse_form_bool(&read_text(field).await?).unwrap_or(true);
            }
            "includeSummary" => {
                form.include_summary = parse_form_bool(&read_text(field).await?).unwrap_or(true);
            }
            "includeQuestions" => {
                form.include_questions =
                    parse_form_bool(&read_text(field).await?).unwrap_or(true);
            }
            "tags" => {
                form.tags = read_text(field)
                    .await?
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect();
            }
            "userId" => {
                let value = read_text(field).await?;
                if !value.trim().is_empty() {
                    form.owner_id = value.trim().to_string();
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

fn ocr_data(extraction: &ExtractionResult) -> OcrData {
    OcrData {
        text: extraction.text.clone(),
        confidence: extraction.confidence,
        words: extraction.words,
        lines: extraction.lines,
        paragraphs: extraction.paragraphs,
    }
}

/// `POST /notes/process`
///
/// Multipart form with an `image` part and optional text parts:
/// `noteStyle`, `subject`, `includeKeyPoints`, `includeSummary`,
/// `includeQuestions`, `tags` (comma-separated), `userId`.
pub async fn process_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<ApiResponse<ProcessData>> {
    let form = read_form(&mut multipart).await?;
    let options = form.options();
    let owner_id = form.owner_id.clone();
    let tags = form.tags.clone();
    let (filename, bytes) = form.into_image()?;

    let output = state
        .pipeline
        .process(&filename, &bytes, options, &owner_id, tags)
        .await?;

    let saved = output.note.is_some();
    let message = if saved {
        "Image processed successfully"
    } else {
        "Image processed successfully (note could not be saved)"
    };

    Ok(ApiResponse::success_with_message(
        message,
        ProcessData {
            original_image: OriginalImage {
                filename: output.image.filename,
                original_filename: filename,
                url: output.image.url,
                size: output.image.size,
                mime_type: output.image.mime_type,
            },
            ocr: ocr_data(&output.extraction),
            ai_notes: output.notes,
            metadata: ProcessMetadata {
                note_id: output.note.map(|n| n.id),
                ai_metadata: output.metadata.generation,
                options: output.metadata.options,
                saved,
            },
        },
    ))
}

/// `POST /notes/ocr-only` — same upload contract, extraction only.
/// Nothing is generated or persisted; the upload is not kept.
pub async fn ocr_only(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<ApiResponse<OcrOnlyData>> {
    let form = read_form(&mut multipart).await?;
    let (filename, bytes) = form.into_image()?;

    let extraction = state.pipeline.extract_only(&bytes).await?;

    Ok(ApiResponse::success_with_message(
        "Text extracted successfully",
        OcrOnlyData {
            original_filename: filename,
            ocr: ocr_data(&extraction),
        },
    ))
}

/// `POST /upload/image` — stores the upload without running the pipeline.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<ApiResponse<OriginalImage>> {
    let form = read_form(&mut multipart).await?;
    let (filename, bytes) = form.into_image()?;

    let stored = state.pipeline.store_image(&bytes).await?;

    Ok(ApiResponse::created(
        "Image uploaded successfully",
        OriginalImage {
            filename: stored.filename,
            original_filename: filename,
            url: stored.url,
            size: stored.size,
            mime_type: stored.mime_type,
        },
    ))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| QuillError::Validation(format!("Invalid form field: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_bool_accepts_common_spellings() {
        assert_eq!(parse_form_bool("true"), Some(true));
        assert_eq!(parse_form_bool("YES"), Some(true));
        assert_eq!(parse_form_bool("0"), Some(false));
        assert_eq!(parse_form_bool("off"), Some(false));
        assert_eq!(parse_form_bool("maybe"), None);
    }
}
