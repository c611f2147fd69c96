//! Search backend implementation.
//!
//! Two data paths behind the [`SearchBackend`] seam:
//!
//! - `fts` invokes the `search_notes_fts` stored function (the ranking
//!   function itself is owned by the database) with a tri-state query, an
//!   analyzer configuration, a minimum rank, and user-scoped pagination.
//!   Each row carries `total_count` (window count over the full match set).
//! - `scan` is the degraded path: a case-insensitive substring OR-match over
//!   title and description, user-scoped, ordered by `updated_at` descending.
//!   Wildcards in the needle are escaped so user input cannot widen the
//!   pattern.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use annota_core::{Error, FtsPage, FtsQuery, Note, Result, ScanQuery, SearchBackend, SearchHit};

use crate::escape_like;
use crate::notes::PgNoteRepository;

/// PostgreSQL implementation of SearchBackend.
pub struct PgSearchBackend {
    pool: Pool<Postgres>,
}

impl PgSearchBackend {
    /// Create a new PgSearchBackend with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_hit_row(row: sqlx::postgres::PgRow) -> SearchHit {
        SearchHit {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            tags: row.get("tags"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            user_id: row.get("user_id"),
            rank: row.get::<Option<f32>, _>("rank").unwrap_or(0.0),
            headline: row
                .get::<Option<String>, _>("headline")
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl SearchBackend for PgSearchBackend {
    async fn fts(&self, query: &FtsQuery) -> Result<FtsPage> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, tags, created_at, updated_at, user_id,
                   rank, headline, total_count
            FROM search_notes_fts($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&query.query)
        .bind(&query.language)
        .bind(query.min_rank)
        .bind(query.limit)
        .bind(query.offset)
        .bind(query.user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let total = rows
            .first()
            .and_then(|row| row.get::<Option<i64>, _>("total_count"));
        let hits = rows.into_iter().map(Self::parse_hit_row).collect();

        Ok(FtsPage { hits, total })
    }

    async fn scan(&self, query: &ScanQuery) -> Result<Vec<Note>> {
        let pattern = format!("%{}%", escape_like(&query.needle));

        let mut sql = String::from(
            r#"
            SELECT id, title, description, tags, created_at, updated_at, user_id
            FROM notes
            WHERE user_id = $1
              AND (title ILIKE $2 ESCAPE '\' OR description ILIKE $2 ESCAPE '\')
            "#,
        );
        if query.tag.is_some() {
            sql.push_str(" AND $5 = ANY(tags)");
        }
        sql.push_str(" ORDER BY updated_at DESC LIMIT $3 OFFSET $4");

        let mut q = sqlx::query(&sql)
            .bind(query.user_id)
            .bind(&pattern)
            .bind(query.limit)
            .bind(query.offset);
        if let Some(tag) = &query.tag {
            q = q.bind(tag);
        }

        let rows = q.fetch_all(&self.pool).await.map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(PgNoteRepository::parse_note_row)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_pattern_escapes_wildcards() {
        let pattern = format!("%{}%", escape_like("50%_done"));
        assert_eq!(pattern, "%50\\%\\_done%");
    }
}
