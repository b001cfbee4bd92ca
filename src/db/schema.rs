use libsql::Connection;

use crate::error::Result;

pub async fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS notes (
            id TEXT PRIMARY KEY,
            original_filename TEXT NOT NULL,
            image_path TEXT NOT NULL,
            image_url TEXT NOT NULL,
            ocr_text TEXT NOT NULL,
            ocr_confidence REAL,
            ai_notes TEXT NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{}',
            owner_id TEXT NOT NULL DEFAULT 'anonymous',
            tags TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'completed',
            failure TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_notes_owner_id ON notes(owner_id);
        CREATE INDEX IF NOT EXISTS idx_notes_created_at ON notes(created_at);
        CREATE INDEX IF NOT EXISTS idx_notes_status ON notes(status);
        "#,
    )
    .await?;

    Ok(())
}
