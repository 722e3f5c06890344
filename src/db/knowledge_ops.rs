#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use chrono::Utc;
use uuid::Uuid;

use super::mappers::{count_to_u64, parse_note};
use super::partner_ops::search_term;
use super::types::{KnowledgeNoteRow, NOTE_COLUMNS};
use crate::db::CrmDb;
use crate::error::{CrmError, Result};
use crate::types::{KnowledgeNote, NoteInput, NoteQuery, Page};

const NOTE_FILTER: &str = "WHERE ($1::text IS NULL OR title ILIKE $1 OR content ILIKE $1)
       AND ($2::text IS NULL OR $2 = ANY(tags))";

impl CrmDb {
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn fetch_note_page(&self, query: &NoteQuery) -> Result<Page<KnowledgeNote>> {
        let text = search_term(query.text.as_deref());
        let tag = query.tag.as_deref();

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM knowledge_notes {NOTE_FILTER}"
        ))
        .bind(text.as_deref())
        .bind(tag)
        .fetch_one(self.pool())
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to count notes: {e}")))?;

        let notes = sqlx::query_as::<_, KnowledgeNoteRow>(&format!(
            "SELECT {NOTE_COLUMNS} FROM knowledge_notes {NOTE_FILTER}
             ORDER BY is_pinned DESC, updated_at DESC, id
             LIMIT $3 OFFSET $4"
        ))
        .bind(text.as_deref())
        .bind(tag)
        .bind(i64::from(query.page.limit()))
        .bind(i64::try_from(query.page.offset()).unwrap_or(i64::MAX))
        .fetch_all(self.pool())
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to list notes: {e}")))?
        .into_iter()
        .map(parse_note)
        .collect();

        Ok(Page::new(notes, count_to_u64(total), query.page))
    }

    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn fetch_note(&self, id: Uuid) -> Result<Option<KnowledgeNote>> {
        sqlx::query_as::<_, KnowledgeNoteRow>(&format!(
            "SELECT {NOTE_COLUMNS} FROM knowledge_notes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map(|row| row.map(parse_note))
        .map_err(|e| CrmError::DatabaseError(format!("Failed to load note {id}: {e}")))
    }

    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn insert_note(&self, note: NoteInput) -> Result<KnowledgeNote> {
        sqlx::query_as::<_, KnowledgeNoteRow>(&format!(
            "INSERT INTO knowledge_notes (id, title, content, tags, is_pinned, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&note.title)
        .bind(&note.content)
        .bind(&note.tags)
        .bind(note.is_pinned)
        .bind(Utc::now())
        .fetch_one(self.pool())
        .await
        .map(parse_note)
        .map_err(|e| CrmError::DatabaseError(format!("Failed to create note: {e}")))
    }

    /// # Errors
    /// `CrmError::NotFound` for an unknown id.
    pub async fn replace_note_row(&self, id: Uuid, note: NoteInput) -> Result<KnowledgeNote> {
        sqlx::query_as::<_, KnowledgeNoteRow>(&format!(
            "UPDATE knowledge_notes
             SET title = $2, content = $3, tags = $4, is_pinned = $5, updated_at = $6
             WHERE id = $1
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(&note.tags)
        .bind(note.is_pinned)
        .bind(Utc::now())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to update note {id}: {e}")))?
        .map(parse_note)
        .ok_or_else(|| CrmError::not_found("Note", id))
    }

    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn delete_note_row(&self, id: Uuid) -> Result<bool> {
        sqlx::query("DELETE FROM knowledge_notes WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map(|result| result.rows_affected() > 0)
            .map_err(|e| CrmError::DatabaseError(format!("Failed to delete note {id}: {e}")))
    }
}
