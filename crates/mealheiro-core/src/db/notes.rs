//! Note operations

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::{format_datetime, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{split_tags, NewNote, Note};

const NOTE_COLUMNS: &str = "Id, UserId, Title, Content, Tags, CreatedAt, UpdatedAt";

fn row_to_note(row: &Row) -> rusqlite::Result<Note> {
    let created_at: String = row.get(5)?;
    let updated_at: Option<String> = row.get(6)?;
    Ok(Note {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        tags: row.get(4)?,
        created_at: parse_datetime(&created_at),
        updated_at: updated_at.map(|s| parse_datetime(&s)),
    })
}

/// Store tags as "a, b, c", or NULL when there are none
fn normalize_tags(tags: Option<&str>) -> Option<String> {
    let tags = split_tags(tags?);
    if tags.is_empty() {
        None
    } else {
        Some(tags.join(", "))
    }
}

/// Escape LIKE wildcards so user text matches literally
fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

impl Database {
    pub fn add_note(&self, user_id: i64, note: &NewNote) -> Result<i64> {
        note.validate()?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO Notes (Title, Content, Tags, CreatedAt, UserId) VALUES (?, ?, ?, ?, ?)",
            params![
                note.title.trim(),
                note.content,
                normalize_tags(note.tags.as_deref()),
                format_datetime(Utc::now()),
                user_id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_note(&self, id: i64) -> Result<Option<Note>> {
        let conn = self.conn()?;
        let note = conn
            .query_row(
                &format!("SELECT {} FROM Notes WHERE Id = ?", NOTE_COLUMNS),
                params![id],
                row_to_note,
            )
            .optional()?;
        Ok(note)
    }

    /// Notes of a user, most recently touched first
    pub fn list_notes(&self, user_id: i64) -> Result<Vec<Note>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM Notes WHERE UserId = ? ORDER BY COALESCE(UpdatedAt, CreatedAt) DESC, Id DESC",
            NOTE_COLUMNS
        ))?;
        let notes = stmt
            .query_map(params![user_id], row_to_note)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    pub fn update_note(&self, id: i64, note: &NewNote) -> Result<()> {
        note.validate()?;
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE Notes SET Title = ?, Content = ?, Tags = ?, UpdatedAt = ? WHERE Id = ?",
            params![
                note.title.trim(),
                note.content,
                normalize_tags(note.tags.as_deref()),
                format_datetime(Utc::now()),
                id,
            ],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("note {}", id)));
        }
        Ok(())
    }

    pub fn delete_note(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM Notes WHERE Id = ?", params![id])?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("note {}", id)));
        }
        Ok(())
    }

    /// Notes whose title, content or tags contain `text` (ASCII case-insensitive)
    pub fn search_notes(&self, user_id: i64, text: &str) -> Result<Vec<Note>> {
        let pattern = like_pattern(text.trim());
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM Notes
            WHERE UserId = ?1
              AND (Title LIKE ?2 ESCAPE '\' OR Content LIKE ?2 ESCAPE '\' OR Tags LIKE ?2 ESCAPE '\')
            ORDER BY COALESCE(UpdatedAt, CreatedAt) DESC, Id DESC
            "#,
            NOTE_COLUMNS
        ))?;
        let notes = stmt
            .query_map(params![user_id, pattern], row_to_note)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    /// Notes carrying `tag` exactly (case-insensitive)
    pub fn notes_with_tag(&self, user_id: i64, tag: &str) -> Result<Vec<Note>> {
        let wanted = tag.trim().to_lowercase();
        let notes = self
            .list_notes(user_id)?
            .into_iter()
            .filter(|note| {
                note.tag_list()
                    .iter()
                    .any(|t| t.to_lowercase() == wanted)
            })
            .collect();
        Ok(notes)
    }
}
