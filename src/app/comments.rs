use anyhow::Result;
use sqlx::Row;

use crate::domain::comment::{Comment, CommentAuthor};
use crate::infra::db::Db;

#[derive(Clone)]
pub struct CommentService {
    db: Db,
}

impl CommentService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Insert the comment; a missing post surfaces as a foreign-key
    /// violation (23503) for the handler to map.
    pub async fn create_comment(
        &self,
        author_id: i64,
        post_id: i64,
        content: String,
    ) -> Result<Comment> {
        let row = sqlx::query(
            "WITH inserted_comment AS ( \
                INSERT INTO comments (content, post_id, author_id) \
                VALUES ($1, $2, $3) \
                RETURNING id, content, post_id, author_id, created_at \
             ) \
             SELECT c.*, u.name AS author_name \
             FROM inserted_comment c \
             JOIN users u ON c.author_id = u.id",
        )
        .bind(content)
        .bind(post_id)
        .bind(author_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(Comment {
            id: row.get("id"),
            content: row.get("content"),
            post_id: row.get("post_id"),
            author_id: row.get("author_id"),
            created_at: row.get("created_at"),
            author: CommentAuthor {
                id: row.get("author_id"),
                name: row.get("author_name"),
            },
        })
    }
}
