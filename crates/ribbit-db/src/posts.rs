use std::collections::HashMap;

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params, params_from_iter};
use tracing::warn;

use ribbit_types::models::{Pagination, Post, PostContent, PostKind};

use crate::error::lookup_failed;
use crate::models::{ListQuery, NewPost};
use crate::{Database, DbError};

const POST_SELECT: &str = "
    SELECT id, parent_id, added_by, email, title, description, is_private,
           attachments, created_at, updated_at, deleted_at
    FROM posts";

/// Which slice of the posts table a list query reads.
enum Listing {
    Public,
    Private,
    Comments { parent_id: i64 },
}

impl Database {
    // -- Create --

    /// Inserts a top-level post. A second post with an identity already in
    /// the table is rejected by the primary key.
    pub fn create_post(&self, new: &NewPost) -> Result<Post, DbError> {
        self.with_conn(|conn| insert_post(conn, new, PostKind::Post, "Post already exists."))
            .inspect_err(|e| warn!(post_id = ?new.id, "CreatePost error: {}", e))
    }

    /// Inserts a comment under `parent_id`. The parent must exist.
    pub fn create_comment(&self, parent_id: i64, new: &NewPost) -> Result<Post, DbError> {
        self.with_conn(|conn| {
            insert_post(
                conn,
                new,
                PostKind::Comment { parent_id },
                "Comment already exists.",
            )
        })
        .inspect_err(|e| warn!(post_id = ?new.id, parent_id, "CreateComment error: {}", e))
    }

    // -- Lists --

    pub fn list_posts(&self, query: Option<ListQuery>, p: &Pagination) -> Result<Vec<Post>, DbError> {
        self.with_conn(|conn| query_posts(conn, Listing::Public, query, p))
            .inspect_err(|e| warn!("PostRepo list error: {}", e))
    }

    pub fn list_private_posts(
        &self,
        query: Option<ListQuery>,
        p: &Pagination,
    ) -> Result<Vec<Post>, DbError> {
        self.with_conn(|conn| query_posts(conn, Listing::Private, query, p))
            .inspect_err(|e| warn!("PostRepo private list error: {}", e))
    }

    pub fn list_post_comments(
        &self,
        parent_id: i64,
        query: Option<ListQuery>,
        p: &Pagination,
    ) -> Result<Vec<Post>, DbError> {
        self.with_conn(|conn| query_posts(conn, Listing::Comments { parent_id }, query, p))
            .inspect_err(|e| warn!(parent_id, "CommentRepo list error: {}", e))
    }

    /// Batch count of live comments per parent. Parents without comments are
    /// absent from the map.
    pub fn count_comments_by_parents(&self, parent_ids: &[i64]) -> Result<HashMap<i64, i64>, DbError> {
        if parent_ids.is_empty() {
            return Ok(HashMap::new());
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=parent_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT parent_id, COUNT(*) FROM posts
                 WHERE parent_id IN ({}) AND type = 'comment' AND deleted_at IS NULL
                 GROUP BY parent_id",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let counts = stmt
                .query_map(params_from_iter(parent_ids), |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
                })?
                .collect::<Result<HashMap<i64, i64>, _>>()?;
            Ok(counts)
        })
        .inspect_err(|e| warn!("CommentRepo count error: {}", e))
    }

    // -- Lookups --

    /// Any live row with this id, post or comment.
    pub fn get_post_by_id(&self, id: i64) -> Result<Post, DbError> {
        self.with_conn(|conn| query_post(conn, "id = ?1", id))
    }

    pub fn get_comment_by_id(&self, id: i64) -> Result<Post, DbError> {
        self.with_conn(|conn| query_post(conn, "id = ?1 AND type = 'comment'", id))
    }

    // -- Updates --

    /// Rewrites title, description, visibility and attachments of a
    /// top-level post.
    pub fn update_post(&self, mut post: Post) -> Result<Post, DbError> {
        post.updated_at = Utc::now();
        let attachments = serde_json::to_string(&post.content.attachments)?;
        self.with_conn(|conn| {
            let c = &post.content;
            let n = conn.execute(
                "UPDATE posts SET title = ?1, description = ?2, is_private = ?3,
                                  attachments = ?4, updated_at = ?5
                 WHERE id = ?6 AND type = 'post'",
                params![c.title, c.description, c.is_private, attachments, post.updated_at, post.id],
            )?;
            if n == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
        .inspect_err(|e| warn!(post_id = post.id, "PostRepo update error: {}", e))?;
        Ok(post)
    }

    /// Rewrites the description only.
    pub fn update_comment(&self, mut post: Post) -> Result<Post, DbError> {
        post.updated_at = Utc::now();
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE posts SET description = ?1, updated_at = ?2 WHERE id = ?3 AND type = 'comment'",
                params![post.content.description, post.updated_at, post.id],
            )?;
            if n == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
        .inspect_err(|e| warn!(post_id = post.id, "CommentRepo update error: {}", e))?;
        Ok(post)
    }

    // -- Deletes --

    pub fn soft_delete_post(&self, post: &mut Post) -> Result<(), DbError> {
        post.mark_deleted();
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE posts SET deleted_at = ?1 WHERE id = ?2 AND type = 'post'",
                params![post.deleted_at, post.id],
            )?;
            Ok(())
        })
        .inspect_err(|e| warn!(post_id = post.id, "PostRepo delete error: {}", e))
    }

    pub fn soft_delete_comment(&self, post: &mut Post) -> Result<(), DbError> {
        post.mark_deleted();
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE posts SET deleted_at = ?1 WHERE id = ?2 AND type = 'comment'",
                params![post.deleted_at, post.id],
            )?;
            Ok(())
        })
        .inspect_err(|e| warn!(post_id = post.id, "CommentRepo delete error: {}", e))
    }
}

fn insert_post(
    conn: &Connection,
    new: &NewPost,
    kind: PostKind,
    duplicate: &'static str,
) -> Result<Post, DbError> {
    let now = Utc::now();
    let attachments = serde_json::to_string(&new.content.attachments)?;
    conn.execute(
        "INSERT INTO posts (id, type, parent_id, added_by, email, title, description,
                            is_private, attachments, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        params![
            new.id,
            kind.as_str(),
            kind.parent_id(),
            new.added_by,
            new.email,
            new.content.title,
            new.content.description,
            new.content.is_private,
            attachments,
            now,
        ],
    )
    .map_err(|e| DbError::from_write(e, duplicate))?;

    let id = new.id.unwrap_or_else(|| conn.last_insert_rowid());
    query_post(conn, "id = ?1", id)
}

fn query_post(conn: &Connection, clause: &str, id: i64) -> Result<Post, DbError> {
    let sql = format!("{POST_SELECT} WHERE {clause} AND deleted_at IS NULL");
    conn.query_row(&sql, [id], post_from_row)
        .map_err(|e| lookup_failed(e, clause))
}

fn query_posts(
    conn: &Connection,
    listing: Listing,
    query: Option<ListQuery>,
    p: &Pagination,
) -> Result<Vec<Post>, DbError> {
    let mut args: Vec<i64> = Vec::with_capacity(4);
    let mut sql = match listing {
        Listing::Public => format!("{POST_SELECT} WHERE type = 'post' AND is_private = 0"),
        Listing::Private => format!("{POST_SELECT} WHERE type = 'post' AND is_private = 1"),
        Listing::Comments { parent_id } => {
            args.push(parent_id);
            format!("{POST_SELECT} WHERE type = 'comment' AND parent_id = ? AND is_private = 0")
        }
    };
    sql.push_str(" AND deleted_at IS NULL");
    if let Some(q) = query {
        sql.push_str(" AND added_by = ?");
        args.push(q.owner_id);
    }
    sql.push_str(" ORDER BY id DESC LIMIT ? OFFSET ?");
    args.push(i64::from(p.limit));
    args.push(i64::from(p.offset));

    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map(params_from_iter(args), post_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    let raw: String = row.get("attachments")?;
    let attachments = serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

    Ok(Post {
        id: row.get("id")?,
        kind: PostKind::from_parent(row.get("parent_id")?),
        added_by: row.get("added_by")?,
        email: row.get("email")?,
        content: PostContent {
            title: row.get("title")?,
            description: row.get("description")?,
            is_private: row.get("is_private")?,
            attachments,
        },
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}
