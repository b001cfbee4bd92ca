use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use crate::error::Result;
use crate::models::{HistoryRequest, NoteSummary, Pagination, ProcessedNote};

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

pub struct NoteRepository;

impl NoteRepository {
    pub async fn insert(conn: &Connection, note: &ProcessedNote) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO notes (
                id, original_filename, image_path, image_url, ocr_text,
                ocr_confidence, ai_notes, metadata, owner_id, tags, status,
                failure, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14
            )
            "#,
            params![
                note.id.clone(),
                note.original_filename.clone(),
                note.image_path.clone(),
                note.image_url.clone(),
                note.ocr_text.clone(),
                note.ocr_confidence.map(|c| c as f64),
                note.ai_notes.clone(),
                serde_json::to_string(&note.metadata)?,
                note.owner_id.clone(),
                serde_json::to_string(&note.tags)?,
                note.status.to_string(),
                note.failure
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                note.created_at.to_rfc3339(),
                note.updated_at.to_rfc3339(),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get_by_id(conn: &Connection, id: &str) -> Result<Option<ProcessedNote>> {
        let mut rows = conn
            .query("SELECT * FROM notes WHERE id = ?1", params![id])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_note(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn list_recent(
        conn: &Connection,
        owner_id: &str,
        limit: u32,
    ) -> Result<Vec<NoteSummary>> {
        let mut rows = conn
            .query(
                r#"
                SELECT * FROM notes
                WHERE owner_id = ?1 AND status = 'completed'
                ORDER BY created_at DESC
                LIMIT ?2
                "#,
                params![owner_id, limit as i64],
            )
            .await?;

        let mut summaries = Vec::new();
        while let Some(row) = rows.next().await? {
            let note = Self::row_to_note(&row)?;
            summaries.push(NoteSummary::from(&note));
        }
        Ok(summaries)
    }

    pub async fn list_history(
        conn: &Connection,
        owner_id: &str,
        req: &HistoryRequest,
    ) -> Result<(Vec<ProcessedNote>, Pagination)> {
        let limit = req.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE).max(1);
        let page = req.page.unwrap_or(1).max(1);
        // Widen before multiplying: page is client-controlled and
        // (u32::MAX - 1) * limit overflows u32.
        let offset = (page as u64 - 1) * limit as u64;

        // Tags are stored as a JSON array of lowercase strings, so a quoted
        // LIKE pattern matches whole tags only.
        let (where_clause, tag_param) = match &req.tag {
            Some(tag) if !tag.trim().is_empty() => (
                "WHERE owner_id = ?1 AND tags LIKE ?2",
                Some(format!("%\"{}\"%", tag.trim().to_lowercase())),
            ),
            _ => ("WHERE owner_id = ?1", None),
        };

        let count_sql = format!("SELECT COUNT(*) FROM notes {where_clause}");
        let mut count_rows = match &tag_param {
            Some(pattern) => {
                conn.query(&count_sql, params![owner_id, pattern.clone()])
                    .await?
            }
            None => conn.query(&count_sql, params![owner_id]).await?,
        };
        let total: i64 = if let Some(row) = count_rows.next().await? {
            row.get(0)?
        } else {
            0
        };

        let mut rows = match &tag_param {
            Some(pattern) => {
                let sql = format!(
                    "SELECT * FROM notes {where_clause} ORDER BY created_at DESC LIMIT ?3 OFFSET ?4"
                );
                conn.query(
                    &sql,
                    params![owner_id, pattern.clone(), limit as i64, offset as i64],
                )
                .await?
            }
            None => {
                let sql = format!(
                    "SELECT * FROM notes {where_clause} ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
                );
                conn.query(&sql, params![owner_id, limit as i64, offset as i64])
                    .await?
            }
        };

        let mut notes = Vec::new();
        while let Some(row) = rows.next().await? {
            notes.push(Self::row_to_note(&row)?);
        }

        Ok((notes, Pagination::new(page, limit, total as u32)))
    }

    pub async fn search(
        conn: &Connection,
        owner_id: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<NoteSummary>> {
        // Literal substring semantics: LIKE wildcards in the query are
        // escaped so `%` and `_` match themselves.
        let escaped = query
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{escaped}%");
        let mut rows = conn
            .query(
                r#"
                SELECT * FROM notes
                WHERE owner_id = ?1
                  AND (ocr_text LIKE ?2 ESCAPE '\'
                       OR ai_notes LIKE ?2 ESCAPE '\'
                       OR original_filename LIKE ?2 ESCAPE '\'
                       OR tags LIKE ?2 ESCAPE '\')
                ORDER BY created_at DESC
                LIMIT ?3
                "#,
                params![owner_id, pattern, limit as i64],
            )
            .await?;

        let mut summaries = Vec::new();
        while let Some(row) = rows.next().await? {
            let note = Self::row_to_note(&row)?;
            summaries.push(NoteSummary::from(&note));
        }
        Ok(summaries)
    }

    pub async fn delete(conn: &Connection, id: &str) -> Result<bool> {
        let rows_affected = conn
            .execute("DELETE FROM notes WHERE id = ?1", params![id])
            .await?;
        Ok(rows_affected > 0)
    }

    pub async fn update_tags(
        conn: &Connection,
        id: &str,
        tags: &[String],
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        conn.execute(
            "UPDATE notes SET tags = ?2, updated_at = ?3 WHERE id = ?1",
            params![
                id,
                serde_json::to_string(tags)?,
                updated_at.to_rfc3339()
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn count(conn: &Connection, owner_id: &str) -> Result<u32> {
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM notes WHERE owner_id = ?1",
                params![owner_id],
            )
            .await?;

        let total: i64 = if let Some(row) = rows.next().await? {
            row.get(0)?
        } else {
            0
        };
        Ok(total as u32)
    }

    fn row_to_note(row: &libsql::Row) -> Result<ProcessedNote> {
        Ok(ProcessedNote {
            id: row.get(0)?,
            original_filename: row.get(1)?,
            image_path: row.get(2)?,
            image_url: row.get(3)?,
            ocr_text: row.get(4)?,
            ocr_confidence: row.get::<Option<f64>>(5)?.map(|c| c as f32),
            ai_notes: row.get(6)?,
            metadata: serde_json::from_str(&row.get::<String>(7)?)?,
            owner_id: row.get(8)?,
            tags: serde_json::from_str(&row.get::<String>(9)?).unwrap_or_default(),
            status: row.get::<String>(10)?.parse().unwrap_or_default(),
            failure: row
                .get::<Option<String>>(11)?
                .map(|raw| serde_json::from_str(&raw))
                .transpose()?,
            created_at: DateTime::parse_from_rfc3339(&row.get::<String>(12)?)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            updated_at: DateTime::parse_from_rfc3339(&row.get::<String>(13)?)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;
    use crate::models::{
        ExtractionCounts, NoteMetadata, NoteStatus, ProcessingOptions,
    };
    use chrono::Duration;

    async fn setup() -> Connection {
        let conn = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .unwrap()
            .connect()
            .unwrap();
        schema::init_schema(&conn).await.unwrap();
        conn
    }

    fn make_note(id: &str, owner: &str, created_at: DateTime<Utc>) -> ProcessedNote {
        ProcessedNote {
            id: id.to_string(),
            original_filename: format!("{id}.jpg"),
            image_path: format!("uploads/{id}.jpg"),
            image_url: format!("/uploads/{id}.jpg"),
            ocr_text: "Photosynthesis converts light energy".to_string(),
            ocr_confidence: Some(88.0),
            ai_notes: "# Photosynthesis\n\nLight energy becomes chemical energy.".to_string(),
            metadata: NoteMetadata {
                file_size: 1024,
                mime_type: "image/jpeg".to_string(),
                extraction: ExtractionCounts {
                    words: 4,
                    lines: 1,
                    paragraphs: 1,
                },
                generation: None,
                options: ProcessingOptions::default(),
            },
            owner_id: owner.to_string(),
            tags: vec!["biology".to_string()],
            status: NoteStatus::Completed,
            failure: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let conn = setup().await;
        let note = make_note("n1", "anonymous", Utc::now());

        NoteRepository::insert(&conn, &note).await.unwrap();
        let fetched = NoteRepository::get_by_id(&conn, "n1").await.unwrap().unwrap();

        assert_eq!(fetched.id, note.id);
        assert_eq!(fetched.ocr_text, note.ocr_text);
        assert_eq!(fetched.ocr_confidence, Some(88.0));
        assert_eq!(fetched.tags, vec!["biology"]);
        assert_eq!(fetched.status, NoteStatus::Completed);
        assert_eq!(fetched.metadata.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn get_missing_note_returns_none() {
        let conn = setup().await;
        assert!(NoteRepository::get_by_id(&conn, "nope")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn list_recent_orders_newest_first_and_scopes_by_owner() {
        let conn = setup().await;
        let base = Utc::now();

        NoteRepository::insert(&conn, &make_note("old", "alice", base - Duration::hours(2)))
            .await
            .unwrap();
        NoteRepository::insert(&conn, &make_note("new", "alice", base))
            .await
            .unwrap();
        NoteRepository::insert(&conn, &make_note("other", "bob", base))
            .await
            .unwrap();

        let summaries = NoteRepository::list_recent(&conn, "alice", 10).await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, "new");
        assert_eq!(summaries[1].id, "old");
    }

    #[tokio::test]
    async fn list_recent_skips_non_completed_records() {
        let conn = setup().await;
        let base = Utc::now();

        let mut failed = make_note("failed", "anonymous", base);
        failed.status = NoteStatus::Failed;
        NoteRepository::insert(&conn, &failed).await.unwrap();
        NoteRepository::insert(&conn, &make_note("done", "anonymous", base))
            .await
            .unwrap();

        let summaries = NoteRepository::list_recent(&conn, "anonymous", 10).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, "done");
    }

    #[tokio::test]
    async fn history_paginates() {
        let conn = setup().await;
        let base = Utc::now();
        for i in 0..5 {
            NoteRepository::insert(
                &conn,
                &make_note(&format!("n{i}"), "anonymous", base - Duration::minutes(i)),
            )
            .await
            .unwrap();
        }

        let req = HistoryRequest {
            page: Some(2),
            limit: Some(2),
            tag: None,
        };
        let (notes, pagination) = NoteRepository::list_history(&conn, "anonymous", &req)
            .await
            .unwrap();

        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].id, "n2");
        assert_eq!(pagination.total, 5);
        assert_eq!(pagination.pages, 3);
    }

    #[tokio::test]
    async fn history_tolerates_huge_page_numbers() {
        let conn = setup().await;
        NoteRepository::insert(&conn, &make_note("n1", "anonymous", Utc::now()))
            .await
            .unwrap();

        let req = HistoryRequest {
            page: Some(u32::MAX),
            limit: Some(100),
            tag: None,
        };
        let (notes, pagination) = NoteRepository::list_history(&conn, "anonymous", &req)
            .await
            .unwrap();

        assert!(notes.is_empty());
        assert_eq!(pagination.page, u32::MAX);
        assert_eq!(pagination.total, 1);
    }

    #[tokio::test]
    async fn history_filters_by_tag() {
        let conn = setup().await;
        let mut tagged = make_note("tagged", "anonymous", Utc::now());
        tagged.tags = vec!["chemistry".to_string()];
        NoteRepository::insert(&conn, &tagged).await.unwrap();
        NoteRepository::insert(&conn, &make_note("plain", "anonymous", Utc::now()))
            .await
            .unwrap();

        let req = HistoryRequest {
            tag: Some("Chemistry".to_string()),
            ..Default::default()
        };
        let (notes, pagination) = NoteRepository::list_history(&conn, "anonymous", &req)
            .await
            .unwrap();

        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, "tagged");
        assert_eq!(pagination.total, 1);
    }

    #[tokio::test]
    async fn search_matches_text_notes_and_filename() {
        let conn = setup().await;
        let mut note = make_note("n1", "anonymous", Utc::now());
        note.original_filename = "thermodynamics.png".to_string();
        NoteRepository::insert(&conn, &note).await.unwrap();

        let by_text = NoteRepository::search(&conn, "anonymous", "photosynthesis", 10)
            .await
            .unwrap();
        assert_eq!(by_text.len(), 1);

        let by_filename = NoteRepository::search(&conn, "anonymous", "thermo", 10)
            .await
            .unwrap();
        assert_eq!(by_filename.len(), 1);

        let by_tag = NoteRepository::search(&conn, "anonymous", "biology", 10)
            .await
            .unwrap();
        assert_eq!(by_tag.len(), 1);

        let no_match = NoteRepository::search(&conn, "anonymous", "astrophysics", 10)
            .await
            .unwrap();
        assert!(no_match.is_empty());
    }

    #[tokio::test]
    async fn search_treats_like_wildcards_as_literal_text() {
        let conn = setup().await;
        let mut pct = make_note("pct", "anonymous", Utc::now());
        pct.ocr_text = "Progress: 100% complete".to_string();
        NoteRepository::insert(&conn, &pct).await.unwrap();
        NoteRepository::insert(&conn, &make_note("plain", "anonymous", Utc::now()))
            .await
            .unwrap();

        // A bare wildcard matches only text containing that character.
        let results = NoteRepository::search(&conn, "anonymous", "%", 10)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "pct");

        let results = NoteRepository::search(&conn, "anonymous", "100%", 10)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);

        let results = NoteRepository::search(&conn, "anonymous", "_", 10)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn search_injection_payload_matches_nothing_and_keeps_data() {
        let conn = setup().await;
        NoteRepository::insert(&conn, &make_note("n1", "anonymous", Utc::now()))
            .await
            .unwrap();

        let results =
            NoteRepository::search(&conn, "anonymous", "'; DROP TABLE notes; --", 10)
                .await
                .unwrap();
        assert!(results.is_empty());

        assert_eq!(NoteRepository::count(&conn, "anonymous").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_reports_whether_row_existed() {
        let conn = setup().await;
        NoteRepository::insert(&conn, &make_note("n1", "anonymous", Utc::now()))
            .await
            .unwrap();

        assert!(NoteRepository::delete(&conn, "n1").await.unwrap());
        assert!(!NoteRepository::delete(&conn, "n1").await.unwrap());
    }

    #[tokio::test]
    async fn update_tags_persists_new_tag_list() {
        let conn = setup().await;
        NoteRepository::insert(&conn, &make_note("n1", "anonymous", Utc::now()))
            .await
            .unwrap();

        let tags = vec!["biology".to_string(), "exam".to_string()];
        NoteRepository::update_tags(&conn, "n1", &tags, Utc::now())
            .await
            .unwrap();

        let note = NoteRepository::get_by_id(&conn, "n1").await.unwrap().unwrap();
        assert_eq!(note.tags, tags);
    }
}
