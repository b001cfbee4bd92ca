use async_trait::async_trait;
use chrono::Utc;
use nanoid::nanoid;

use crate::db::connection::Database;
use crate::db::repository::NoteRepository;
use crate::db::traits::NoteStore;
use crate::error::{QuillError, Result};
use crate::models::{
    normalize_tags, HistoryRequest, NewNote, NoteStatus, NoteSummary, Pagination, ProcessedNote,
};

pub struct LibSqlBackend {
    db: Database,
}

impl LibSqlBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NoteStore for LibSqlBackend {
    async fn create_note(&self, draft: &NewNote) -> Result<ProcessedNote> {
        if let Err(fields) = draft.validate() {
            return Err(QuillError::Validation(format!(
                "Missing or invalid fields: {}",
                fields.join(", ")
            )));
        }

        let conn = self.db.connect()?;
        let now = Utc::now();
        let note = ProcessedNote {
            id: nanoid!(),
            original_filename: draft.original_filename.clone(),
            image_path: draft.image_path.clone(),
            image_url: draft.image_url.clone(),
            ocr_text: draft.ocr_text.clone(),
            ocr_confidence: draft.ocr_confidence,
            ai_notes: draft.ai_notes.clone(),
            metadata: draft.metadata.clone(),
            owner_id: draft.owner_id.clone(),
            tags: normalize_tags(&draft.tags),
            status: NoteStatus::Completed,
            failure: None,
            created_at: now,
            updated_at: now,
        };

        NoteRepository::insert(&conn, &note).await?;
        Ok(note)
    }

    async fn get_note(&self, id: &str) -> Result<Option<ProcessedNote>> {
        let conn = self.db.connect()?;
        NoteRepository::get_by_id(&conn, id).await
    }

    async fn list_recent(&self, owner_id: &str, limit: u32) -> Result<Vec<NoteSummary>> {
        let conn = self.db.connect()?;
        NoteRepository::list_recent(&conn, owner_id, limit).await
    }

    async fn list_history(
        &self,
        owner_id: &str,
        req: &HistoryRequest,
    ) -> Result<(Vec<ProcessedNote>, Pagination)> {
        let conn = self.db.connect()?;
        NoteRepository::list_history(&conn, owner_id, req).await
    }

    async fn search_notes(
        &self,
        owner_id: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<NoteSummary>> {
        let conn = self.db.connect()?;
        NoteRepository::search(&conn, owner_id, query, limit).await
    }

    async fn delete_note(&self, id: &str) -> Result<Option<ProcessedNote>> {
        let conn = self.db.connect()?;
        let Some(note) = NoteRepository::get_by_id(&conn, id).await? else {
            return Ok(None);
        };
        NoteRepository::delete(&conn, id).await?;
        Ok(Some(note))
    }

    async fn add_tags(&self, id: &str, tags: &[String]) -> Result<Option<ProcessedNote>> {
        let conn = self.db.connect()?;
        let Some(note) = NoteRepository::get_by_id(&conn, id).await? else {
            return Ok(None);
        };

        let mut merged = note.tags.clone();
        merged.extend(tags.iter().cloned());
        let merged = normalize_tags(&merged);

        let now = Utc::now();
        NoteRepository::update_tags(&conn, id, &merged, now).await?;
        Ok(Some(ProcessedNote {
            tags: merged,
            updated_at: now,
            ..note
        }))
    }

    async fn remove_tags(&self, id: &str, tags: &[String]) -> Result<Option<ProcessedNote>> {
        let conn = self.db.connect()?;
        let Some(note) = NoteRepository::get_by_id(&conn, id).await? else {
            return Ok(None);
        };

        let to_remove = normalize_tags(tags);
        let remaining: Vec<String> = note
            .tags
            .iter()
            .filter(|tag| !to_remove.contains(tag))
            .cloned()
            .collect();

        let now = Utc::now();
        NoteRepository::update_tags(&conn, id, &remaining, now).await?;
        Ok(Some(ProcessedNote {
            tags: remaining,
            updated_at: now,
            ..note
        }))
    }

    async fn count_notes(&self, owner_id: &str) -> Result<u32> {
        let conn = self.db.connect()?;
        NoteRepository::count(&conn, owner_id).await
    }
}
