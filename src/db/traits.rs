use async_trait::async_trait;

use crate::error::Result;
use crate::models::{HistoryRequest, NewNote, NoteSummary, Pagination, ProcessedNote};

/// Persistence operations for processed notes.
///
/// Implementations live behind `Arc<dyn NoteStore>` in the application
/// state so handlers and tests can swap the backend.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Persists a draft, assigning id and timestamps. Returns the stored
    /// record.
    async fn create_note(&self, draft: &NewNote) -> Result<ProcessedNote>;

    async fn get_note(&self, id: &str) -> Result<Option<ProcessedNote>>;

    /// Most recent notes for one owner, newest first.
    async fn list_recent(&self, owner_id: &str, limit: u32) -> Result<Vec<NoteSummary>>;

    /// Paginated full-record history for one owner, newest first.
    async fn list_history(
        &self,
        owner_id: &str,
        req: &HistoryRequest,
    ) -> Result<(Vec<ProcessedNote>, Pagination)>;

    /// Case-insensitive substring search over extracted text, generated
    /// notes, filename, and tags.
    async fn search_notes(
        &self,
        owner_id: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<NoteSummary>>;

    /// Deletes a note, returning the record that was removed so the caller
    /// can clean up the backing image file.
    async fn delete_note(&self, id: &str) -> Result<Option<ProcessedNote>>;

    /// Merges tags into a note. Returns the updated record, or `None` when
    /// the note does not exist.
    async fn add_tags(&self, id: &str, tags: &[String]) -> Result<Option<ProcessedNote>>;

    /// Removes tags from a note. Unknown tags are ignored.
    async fn remove_tags(&self, id: &str, tags: &[String]) -> Result<Option<ProcessedNote>>;

    async fn count_notes(&self, owner_id: &str) -> Result<u32>;
}
