//! Upload processing pipeline: store the image, extract text, generate
//! study notes, then persist.
//!
//! The first three stages are fatal on error (the stored image is cleaned
//! up and the error propagates). Persistence is best effort: a database
//! failure is logged and the caller still gets the extracted text and
//! generated notes, with no note id.

use std::sync::Arc;

use tracing::{info, warn};

use crate::db::NoteStore;
use crate::error::{QuillError, Result};
use crate::llm::NoteGenerator;
use crate::models::{ExtractionCounts, NewNote, NoteMetadata, ProcessingOptions};
use crate::ocr::{ExtractionResult, TextExtractor};
use crate::storage::{ImageStore, StoredImage};

/// Result of one pipeline run. `note` is `None` when persistence failed
/// or the record did not validate.
pub struct PipelineOutput {
    pub note: Option<crate::models::ProcessedNote>,
    pub image: StoredImage,
    pub extraction: ExtractionResult,
    pub notes: String,
    pub metadata: NoteMetadata,
}

pub struct NotePipeline {
    extractor: Arc<TextExtractor>,
    generator: Option<Arc<NoteGenerator>>,
    store: Arc<dyn NoteStore>,
    images: ImageStore,
}

impl NotePipeline {
    pub fn new(
        extractor: Arc<TextExtractor>,
        generator: Option<Arc<NoteGenerator>>,
        store: Arc<dyn NoteStore>,
        images: ImageStore,
    ) -> Self {
        Self {
            extractor,
            generator,
            store,
            images,
        }
    }

    pub async fn process(
        &self,
        original_filename: &str,
        bytes: &[u8],
        options: ProcessingOptions,
        owner_id: &str,
        tags: Vec<String>,
    ) -> Result<PipelineOutput> {
        let image = self.images.save(bytes).await?;

        let extraction = match self.extractor.extract(bytes).await {
            Ok(extraction) => extraction,
            Err(error) => {
                self.images.remove(&image.path).await;
                return Err(error);
            }
        };
        if let Err(error) = require_text(&extraction) {
            self.images.remove(&image.path).await;
            return Err(error);
        }
        info!(
            filename = %original_filename,
            confidence = extraction.confidence,
            words = extraction.words,
            "text extracted"
        );

        let Some(generator) = &self.generator else {
            self.images.remove(&image.path).await;
            return Err(QuillError::Generation(
                "No LLM configured. Set LLM_MODEL to enable note generation.".to_string(),
            ));
        };

        let generated = match generator.generate(&extraction.text, &options).await {
            Ok(generated) => generated,
            Err(error) => {
                self.images.remove(&image.path).await;
                return Err(error);
            }
        };

        let metadata = NoteMetadata {
            file_size: image.size,
            mime_type: image.mime_type.clone(),
            extraction: ExtractionCounts {
                words: extraction.words,
                lines: extraction.lines,
                paragraphs: extraction.paragraphs,
            },
            generation: Some(generated.metadata),
            options,
        };

        let draft = NewNote {
            original_filename: original_filename.to_string(),
            image_path: image.path.clone(),
            image_url: image.url.clone(),
            ocr_text: extraction.text.clone(),
            ocr_confidence: Some(extraction.confidence),
            ai_notes: generated.notes.clone(),
            metadata: metadata.clone(),
            owner_id: owner_id.to_string(),
            tags,
        };

        let note = self.persist(&draft).await;

        Ok(PipelineOutput {
            note,
            image,
            extraction,
            notes: generated.notes,
            metadata,
        })
    }

    /// Extraction without generation or persistence. The upload is
    /// validated against the same constraints as a full run but nothing is
    /// written to disk.
    pub async fn extract_only(&self, bytes: &[u8]) -> Result<ExtractionResult> {
        self.images.validate(bytes)?;
        let extraction = self.extractor.extract(bytes).await?;
        require_text(&extraction)?;
        Ok(extraction)
    }

    /// Stores an upload without running the pipeline.
    pub async fn store_image(&self, bytes: &[u8]) -> Result<StoredImage> {
        self.images.save(bytes).await
    }

    /// Deletes a note and its backing image file.
    pub async fn delete_note(&self, id: &str) -> Result<bool> {
        match self.store.delete_note(id).await? {
            Some(note) => {
                self.images.remove(&note.image_path).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Releases pipeline resources. Called once during shutdown.
    pub async fn shutdown(&self) {
        self.extractor.shutdown().await;
    }

    async fn persist(&self, draft: &NewNote) -> Option<crate::models::ProcessedNote> {
        if let Err(fields) = draft.validate() {
            warn!(
                fields = ?fields,
                "note failed validation, returning result without saving"
            );
            return None;
        }

        match self.store.create_note(draft).await {
            Ok(note) => Some(note),
            Err(error) => {
                warn!(
                    error = %error,
                    filename = %draft.original_filename,
                    "failed to persist note, returning result without saving"
                );
                None
            }
        }
    }
}

/// The extraction adapter returns empty output as-is; turning it into a
/// caller-visible failure is the orchestrator's decision.
fn require_text(extraction: &ExtractionResult) -> Result<()> {
    if extraction.text.trim().is_empty() {
        return Err(QuillError::NoTextFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, OcrConfig, UploadConfig};
    use crate::db::{Database, LibSqlBackend};
    use crate::models::{HistoryRequest, NoteSummary, Pagination, ProcessedNote};
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct FailingStore;

    #[async_trait]
    impl NoteStore for FailingStore {
        async fn create_note(&self, _draft: &NewNote) -> Result<ProcessedNote> {
            Err(QuillError::Internal("store is down".to_string()))
        }
        async fn get_note(&self, _id: &str) -> Result<Option<ProcessedNote>> {
            Ok(None)
        }
        async fn list_recent(&self, _owner_id: &str, _limit: u32) -> Result<Vec<NoteSummary>> {
            Ok(Vec::new())
        }
        async fn list_history(
            &self,
            _owner_id: &str,
            _req: &HistoryRequest,
        ) -> Result<(Vec<ProcessedNote>, Pagination)> {
            Ok((Vec::new(), Pagination::new(1, 20, 0)))
        }
        async fn search_notes(
            &self,
            _owner_id: &str,
            _query: &str,
            _limit: u32,
        ) -> Result<Vec<NoteSummary>> {
            Ok(Vec::new())
        }
        async fn delete_note(&self, _id: &str) -> Result<Option<ProcessedNote>> {
            Ok(None)
        }
        async fn add_tags(&self, _id: &str, _tags: &[String]) -> Result<Option<ProcessedNote>> {
            Ok(None)
        }
        async fn remove_tags(&self, _id: &str, _tags: &[String]) -> Result<Option<ProcessedNote>> {
            Ok(None)
        }
        async fn count_notes(&self, _owner_id: &str) -> Result<u32> {
            Ok(0)
        }
    }

    fn ocr_config() -> OcrConfig {
        OcrConfig {
            languages: "eng".to_string(),
            timeout_secs: 60,
            retry_confidence: 70.0,
            fix_confusions: false,
            max_image_dimension: 4096,
            min_image_dimension: 50,
        }
    }

    async fn pipeline_with(store: Arc<dyn NoteStore>, upload_dir: &std::path::Path) -> NotePipeline {
        let upload_config = UploadConfig {
            dir: upload_dir.to_string_lossy().into_owned(),
            max_file_size: 10 * 1024 * 1024,
            allowed_types: vec!["image/png".to_string(), "image/jpeg".to_string()],
        };
        NotePipeline::new(
            Arc::new(TextExtractor::new(ocr_config())),
            None,
            store,
            ImageStore::new(&upload_config).await.unwrap(),
        )
    }

    fn draft() -> NewNote {
        NewNote {
            original_filename: "lecture.png".to_string(),
            image_path: "uploads/x.png".to_string(),
            image_url: "/uploads/x.png".to_string(),
            ocr_text: "Extracted lecture text".to_string(),
            ocr_confidence: Some(90.0),
            ai_notes: "# Lecture\n\n- point".to_string(),
            metadata: NoteMetadata {
                file_size: 1024,
                mime_type: "image/png".to_string(),
                extraction: ExtractionCounts {
                    words: 3,
                    lines: 1,
                    paragraphs: 1,
                },
                generation: None,
                options: ProcessingOptions::default(),
            },
            owner_id: "anonymous".to_string(),
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn persist_survives_store_failure() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline_with(Arc::new(FailingStore), dir.path()).await;

        let result = pipeline.persist(&draft()).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn persist_skips_invalid_drafts_without_touching_store() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline_with(Arc::new(FailingStore), dir.path()).await;

        let mut bad = draft();
        bad.ocr_text = String::new();
        assert!(pipeline.persist(&bad).await.is_none());
    }

    #[tokio::test]
    async fn persist_stores_valid_drafts() {
        let dir = tempdir().unwrap();
        let db = Database::new(&DatabaseConfig {
            url: ":memory:".to_string(),
            auth_token: None,
        })
        .await
        .unwrap();
        let store = Arc::new(LibSqlBackend::new(db));
        let pipeline = pipeline_with(store.clone(), dir.path()).await;

        let note = pipeline.persist(&draft()).await.expect("note saved");
        assert!(!note.id.is_empty());

        let fetched = store.get_note(&note.id).await.unwrap();
        assert!(fetched.is_some());
    }

    #[tokio::test]
    async fn delete_note_reports_missing_ids() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline_with(Arc::new(FailingStore), dir.path()).await;
        assert!(!pipeline.delete_note("missing").await.unwrap());
    }

    #[tokio::test]
    async fn delete_note_removes_record_and_backing_image() {
        let dir = tempdir().unwrap();
        let db = Database::new(&DatabaseConfig {
            url: ":memory:".to_string(),
            auth_token: None,
        })
        .await
        .unwrap();
        let store = Arc::new(LibSqlBackend::new(db));
        let pipeline = pipeline_with(store.clone(), dir.path()).await;

        let image_path = dir.path().join("stored.png");
        tokio::fs::write(&image_path, b"image bytes").await.unwrap();

        let mut d = draft();
        d.image_path = image_path.to_string_lossy().into_owned();
        let note = store.create_note(&d).await.unwrap();

        assert!(pipeline.delete_note(&note.id).await.unwrap());
        assert!(store.get_note(&note.id).await.unwrap().is_none());
        assert!(!tokio::fs::try_exists(&image_path).await.unwrap());
    }

    fn extraction(text: &str) -> ExtractionResult {
        ExtractionResult {
            text: text.to_string(),
            raw_text: text.to_string(),
            confidence: 80.0,
            words: 0,
            lines: 0,
            paragraphs: 0,
        }
    }

    #[test]
    fn blank_extraction_output_is_no_text_found() {
        assert!(matches!(
            require_text(&extraction("   \n ")),
            Err(QuillError::NoTextFound)
        ));
        assert!(matches!(
            require_text(&extraction("")),
            Err(QuillError::NoTextFound)
        ));
        assert!(require_text(&extraction("legible text")).is_ok());
    }
}
