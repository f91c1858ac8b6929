use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::comment::{Comment, CommentAuthor};
use crate::domain::post::{Post, PostDetail};
use crate::domain::user::Author;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct PostService {
    db: Db,
}

impl PostService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create_post(&self, author_id: i64, title: String, content: String) -> Result<Post> {
        // Posts go live immediately; there is no draft state.
        let row = sqlx::query(
            "WITH inserted_post AS ( \
                INSERT INTO posts (title, content, author_id, published) \
                VALUES ($1, $2, $3, TRUE) \
                RETURNING id, title, content, published, author_id, created_at \
             ) \
             SELECT p.*, u.name AS author_name, u.email AS author_email \
             FROM inserted_post p \
             JOIN users u ON p.author_id = u.id",
        )
        .bind(title)
        .bind(content)
        .bind(author_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(post_from_row(&row))
    }

    /// Page of posts matching the search plus the total matching count. The
    /// two reads are fired in parallel with no shared snapshot; under
    /// concurrent writes they may disagree slightly.
    pub async fn list(&self, page: i64, limit: i64, search: &str) -> Result<(Vec<Post>, i64)> {
        let pattern = format!("%{}%", escape_like_pattern(search));
        let skip = (page - 1) * limit;

        let (rows, total) = tokio::try_join!(
            self.fetch_page(&pattern, limit, skip),
            self.count_matching(&pattern),
        )?;

        let posts = rows.iter().map(post_from_row).collect();
        Ok((posts, total))
    }

    async fn fetch_page(&self, pattern: &str, limit: i64, skip: i64) -> Result<Vec<PgRow>> {
        let rows = sqlx::query(
            "SELECT p.id, p.title, p.content, p.published, p.author_id, p.created_at, \
                    u.name AS author_name, u.email AS author_email, \
                    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count \
             FROM posts p \
             JOIN users u ON p.author_id = u.id \
             WHERE p.title ILIKE $1 ESCAPE '\\' OR p.content ILIKE $1 ESCAPE '\\' \
             ORDER BY p.created_at DESC, p.id DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(pattern)
        .bind(limit)
        .bind(skip)
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows)
    }

    async fn count_matching(&self, pattern: &str) -> Result<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts \
             WHERE title ILIKE $1 ESCAPE '\\' OR content ILIKE $1 ESCAPE '\\'",
        )
        .bind(pattern)
        .fetch_one(self.db.pool())
        .await?;
        Ok(total)
    }

    pub async fn get_detail(&self, post_id: i64) -> Result<Option<PostDetail>> {
        let row = sqlx::query(
            "SELECT p.id, p.title, p.content, p.published, p.author_id, p.created_at, \
                    u.name AS author_name, u.email AS author_email \
             FROM posts p \
             JOIN users u ON p.author_id = u.id \
             WHERE p.id = $1",
        )
        .bind(post_id)
        .fetch_optional(self.db.pool())
        .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let comment_rows = sqlx::query(
            "SELECT c.id, c.content, c.post_id, c.author_id, c.created_at, \
                    u.name AS author_name \
             FROM comments c \
             JOIN users u ON c.author_id = u.id \
             WHERE c.post_id = $1 \
             ORDER BY c.created_at ASC, c.id ASC",
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;

        let comments = comment_rows
            .iter()
            .map(|row| Comment {
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
            .collect();

        Ok(Some(PostDetail {
            id: row.get("id"),
            title: row.get("title"),
            content: row.get("content"),
            published: row.get("published"),
            author_id: row.get("author_id"),
            created_at: row.get("created_at"),
            author: Author {
                id: row.get("author_id"),
                name: row.get("author_name"),
                email: row.get("author_email"),
            },
            comments,
        }))
    }
}

/// `ceil(total / limit)` with `total = 0` mapping to zero pages.
pub fn page_count(total: i64, limit: i64) -> i64 {
    if total <= 0 || limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

fn post_from_row(row: &PgRow) -> Post {
    Post {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        published: row.get("published"),
        author_id: row.get("author_id"),
        created_at: row.get("created_at"),
        author: Author {
            id: row.get("author_id"),
            name: row.get("author_name"),
            email: row.get("author_email"),
        },
        comments_count: row.try_get("comments_count").unwrap_or(0),
    }
}

fn escape_like_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '%' | '_' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}
