//! Note repository implementation.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use annota_core::{
    CreateNoteRequest, Error, ListNotesRequest, Note, NotePatch, NoteRepository, Result,
};

/// Default page size for note listing.
const LIST_LIMIT: i64 = 50;

/// PostgreSQL implementation of NoteRepository.
///
/// All statements are scoped by `user_id`; a note owned by another user is
/// indistinguishable from a missing one. `updated_at` is assigned by the
/// database (`now()`) on every write, keeping it monotonic and
/// server-authoritative.
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub(crate) fn parse_note_row(row: PgRow) -> Note {
        Note {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            tags: row.get("tags"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            user_id: row.get("user_id"),
        }
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn create(&self, user_id: Uuid, req: CreateNoteRequest) -> Result<Note> {
        let row = sqlx::query(
            r#"
            INSERT INTO notes (id, user_id, title, description, tags, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, now(), now())
            RETURNING id, title, description, tags, created_at, updated_at, user_id
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.tags)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::parse_note_row(row))
    }

    async fn fetch(&self, user_id: Uuid, id: Uuid) -> Result<Note> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, tags, created_at, updated_at, user_id
            FROM notes
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(Self::parse_note_row)
            .ok_or(Error::NoteNotFound(id))
    }

    async fn list(&self, user_id: Uuid, req: ListNotesRequest) -> Result<Vec<Note>> {
        let limit = req.limit.unwrap_or(LIST_LIMIT);
        let offset = req.offset.unwrap_or(0);

        let rows = sqlx::query(
            r#"
            SELECT id, title, description, tags, created_at, updated_at, user_id
            FROM notes
            WHERE user_id = $1
            ORDER BY updated_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_note_row).collect())
    }

    async fn update(&self, user_id: Uuid, id: Uuid, patch: NotePatch) -> Result<Note> {
        // COALESCE keeps any field the patch does not carry; updated_at
        // always advances to now() so it stays monotonic.
        let row = sqlx::query(
            r#"
            UPDATE notes
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                tags = COALESCE($5, tags),
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING id, title, description, tags, created_at, updated_at, user_id
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.tags.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(Self::parse_note_row)
            .ok_or(Error::NoteNotFound(id))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }
        Ok(())
    }
}
