//! Comment thread collaborator and SQLite implementation.
//!
//! # Responsibility
//! - Edit comment text on behalf of its author.
//! - Read comment threads for display.
//!
//! # Invariants
//! - Only the author of a comment may edit it.
//! - Threads are returned oldest-first.

use crate::db::DbError;
use crate::model::comment::Comment;
use crate::model::{CommentId, UserId};
use crate::repo::columns::nullable_integer;
use crate::repo::schema::{ensure_connection_ready, SchemaError, COMMENTS_TABLE};
use rusqlite::{params, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Recursive walk from a thread head (`?1`) back to the first comment.
///
/// Yields `thread(id, depth)` with depth 0 at the head.
pub(crate) const COMMENT_THREAD_CTE: &str = "WITH RECURSIVE thread(id, depth) AS (
    SELECT ?1, 0
    UNION ALL
    SELECT comments.parent_id, thread.depth + 1
    FROM comments
    JOIN thread ON comments.id = thread.id
    WHERE comments.parent_id IS NOT NULL
)";

pub type CommentResult<T> = Result<T, CommentError>;

#[derive(Debug)]
pub enum CommentError {
    Db(DbError),
    /// No comment with this id was written by this user.
    NotFound {
        comment_id: CommentId,
        user_id: UserId,
    },
}

impl Display for CommentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound {
                comment_id,
                user_id,
            } => write!(f, "comment {comment_id} not found for user {user_id}"),
        }
    }
}

impl Error for CommentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
        }
    }
}

impl From<DbError> for CommentError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CommentError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Comment editing capability the section store delegates to.
pub trait CommentEditor {
    fn edit_comment(&self, comment_id: CommentId, user_id: UserId, text: &str)
        -> CommentResult<()>;
}

/// SQLite-backed comment repository.
pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> Result<Self, SchemaError> {
        ensure_connection_ready(conn, &[COMMENTS_TABLE])?;
        Ok(Self { conn })
    }

    /// Loads the thread ending at `head`, first comment first.
    ///
    /// Returns an empty list when `head` does not exist.
    pub fn load_comment_thread(&self, head: CommentId) -> CommentResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMMENT_THREAD_CTE}
             SELECT comments.id, comments.parent_id, comments.user_id, comments.comment_text
             FROM thread
             JOIN comments ON comments.id = thread.id
             ORDER BY thread.depth DESC;"
        ))?;

        let comments = stmt
            .query_map([head], |row| {
                Ok(Comment {
                    id: row.get(0)?,
                    parent_id: nullable_integer(row, 1)?,
                    user_id: row.get(2)?,
                    text: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(comments)
    }
}

impl CommentEditor for SqliteCommentRepository<'_> {
    fn edit_comment(
        &self,
        comment_id: CommentId,
        user_id: UserId,
        text: &str,
    ) -> CommentResult<()> {
        let changed = self.conn.execute(
            "UPDATE comments
             SET comment_text = ?3
             WHERE id = ?1
               AND user_id = ?2;",
            params![comment_id, user_id, text],
        )?;

        if changed == 0 {
            return Err(CommentError::NotFound {
                comment_id,
                user_id,
            });
        }

        Ok(())
    }
}
