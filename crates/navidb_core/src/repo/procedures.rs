//! Section procedure contract and SQLite implementation.
//!
//! # Responsibility
//! - Name the backend calls the section store depends on, one method per
//!   stored procedure.
//! - Implement those procedures over the migrated SQLite schema.
//!
//! # Invariants
//! - Values are bound positionally, never spliced into SQL text.
//! - Nullable results stay `Option`; NULL is never read back as `0`.
//! - Multi-statement procedures are atomic through a savepoint and leave the
//!   surrounding transaction (if any) under caller control.

use crate::db::{DbError, DbResult};
use crate::model::{CommentId, ModuleId, SectionId, UserId};
use crate::repo::columns::{address_from_db, address_to_db, nullable_integer};
use crate::repo::comment_repo::COMMENT_THREAD_CTE;
use crate::repo::savepoint::within_savepoint;
use crate::repo::schema::{ensure_connection_ready, SchemaError, COMMENTS_TABLE, SECTIONS_TABLE};
use rusqlite::{params, Connection, OptionalExtension};

/// Every comment on the thread of some remaining section.
///
/// Yields `referenced(id)`; run after the deleted section's row is gone.
const REFERENCED_COMMENTS_CTE: &str = "WITH RECURSIVE referenced(id) AS (
    SELECT comment_id FROM sections WHERE comment_id IS NOT NULL
    UNION
    SELECT comments.parent_id
    FROM comments
    JOIN referenced ON comments.id = referenced.id
    WHERE comments.parent_id IS NOT NULL
)";

/// Arguments of `create_section`, in wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateSectionArgs<'a> {
    pub module_id: ModuleId,
    pub name: &'a str,
    /// Bound as SQL NULL when absent.
    pub comment_id: Option<CommentId>,
    pub start_address: u64,
    pub end_address: u64,
    /// Canonical permission symbol.
    pub permission: &'a str,
    pub data: &'a [u8],
}

/// One row of `get_sections`, before domain decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRow {
    pub id: SectionId,
    pub name: String,
    pub comment_id: Option<CommentId>,
    pub start_address: u64,
    pub end_address: u64,
    pub permission: String,
    pub data: Vec<u8>,
}

/// Backend procedures for section persistence.
///
/// Scalar results are `None` when the procedure returned SQL NULL.
pub trait SectionProcedures {
    /// `create_section(...) -> section id`
    fn create_section(&self, args: &CreateSectionArgs<'_>) -> DbResult<Option<SectionId>>;

    /// `delete_section(module_id, section_id)`; also removes the part of the
    /// comment thread no other section references.
    fn delete_section(&self, module_id: ModuleId, section_id: SectionId) -> DbResult<()>;

    /// `get_sections(module_id) -> rows`
    fn get_sections(&self, module_id: ModuleId) -> DbResult<Vec<SectionRow>>;

    /// `set_section_name(module_id, section_id, name)`
    fn set_section_name(
        &self,
        module_id: ModuleId,
        section_id: SectionId,
        name: &str,
    ) -> DbResult<()>;

    /// `append_section_comment(module_id, section_id, user_id, text) -> comment id`
    fn append_section_comment(
        &self,
        module_id: ModuleId,
        section_id: SectionId,
        user_id: UserId,
        comment_text: &str,
    ) -> DbResult<Option<CommentId>>;

    /// `delete_section_comment(module_id, section_id, comment_id, user_id) -> ack`
    fn delete_section_comment(
        &self,
        module_id: ModuleId,
        section_id: SectionId,
        comment_id: CommentId,
        user_id: UserId,
    ) -> DbResult<Option<CommentId>>;
}

/// SQLite-backed section procedures.
pub struct SqliteSectionProcedures<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSectionProcedures<'conn> {
    /// Constructs procedures over a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> Result<Self, SchemaError> {
        ensure_connection_ready(conn, &[COMMENTS_TABLE, SECTIONS_TABLE])?;
        Ok(Self { conn })
    }
}

impl SectionProcedures for SqliteSectionProcedures<'_> {
    fn create_section(&self, args: &CreateSectionArgs<'_>) -> DbResult<Option<SectionId>> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO sections (
                module_id,
                name,
                comment_id,
                start_address,
                end_address,
                permission,
                data
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id;",
        )?;

        let mut rows = stmt.query(params![
            args.module_id,
            args.name,
            args.comment_id,
            address_to_db(args.start_address),
            address_to_db(args.end_address),
            args.permission,
            args.data,
        ])?;

        let section_id = match rows.next()? {
            Some(row) => nullable_integer(row, 0)?,
            None => None,
        };
        Ok(section_id)
    }

    fn delete_section(&self, module_id: ModuleId, section_id: SectionId) -> DbResult<()> {
        within_savepoint(self.conn, "delete_section", |conn| {
            let head = section_comment_head(conn, module_id, section_id)?;
            conn.execute(
                "DELETE FROM sections WHERE module_id = ?1 AND id = ?2;",
                params![module_id, section_id],
            )?;

            // Threads may be shared; keep comments another section still reaches.
            if let Some(Some(head)) = head {
                conn.execute(
                    &format!(
                        "DELETE FROM comments
                         WHERE id IN ({COMMENT_THREAD_CTE} SELECT id FROM thread)
                           AND id NOT IN ({REFERENCED_COMMENTS_CTE} SELECT id FROM referenced);"
                    ),
                    [head],
                )?;
            }

            Ok::<_, DbError>(())
        })
    }

    fn get_sections(&self, module_id: ModuleId) -> DbResult<Vec<SectionRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                id,
                name,
                comment_id,
                start_address,
                end_address,
                permission,
                data
             FROM sections
             WHERE module_id = ?1;",
        )?;

        let rows = stmt
            .query_map([module_id], |row| {
                Ok(SectionRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    comment_id: nullable_integer(row, 2)?,
                    start_address: address_from_db(row.get(3)?),
                    end_address: address_from_db(row.get(4)?),
                    permission: row.get(5)?,
                    data: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    fn set_section_name(
        &self,
        module_id: ModuleId,
        section_id: SectionId,
        name: &str,
    ) -> DbResult<()> {
        self.conn.execute(
            "UPDATE sections SET name = ?3 WHERE module_id = ?1 AND id = ?2;",
            params![module_id, section_id, name],
        )?;
        Ok(())
    }

    fn append_section_comment(
        &self,
        module_id: ModuleId,
        section_id: SectionId,
        user_id: UserId,
        comment_text: &str,
    ) -> DbResult<Option<CommentId>> {
        within_savepoint(self.conn, "append_section_comment", |conn| {
            let Some(parent_id) = section_comment_head(conn, module_id, section_id)? else {
                return Ok(None);
            };

            let comment_id = conn.query_row(
                "INSERT INTO comments (parent_id, user_id, comment_text)
                 VALUES (?1, ?2, ?3)
                 RETURNING id;",
                params![parent_id, user_id, comment_text],
                |row| nullable_integer(row, 0),
            )?;

            conn.execute(
                "UPDATE sections SET comment_id = ?3 WHERE module_id = ?1 AND id = ?2;",
                params![module_id, section_id, comment_id],
            )?;

            Ok::<_, DbError>(comment_id)
        })
    }

    fn delete_section_comment(
        &self,
        module_id: ModuleId,
        section_id: SectionId,
        comment_id: CommentId,
        user_id: UserId,
    ) -> DbResult<Option<CommentId>> {
        within_savepoint(self.conn, "delete_section_comment", |conn| {
            let Some(Some(head)) = section_comment_head(conn, module_id, section_id)? else {
                return Ok(None);
            };

            // Outer None: not in this thread or not authored by the user.
            let parent_id: Option<Option<CommentId>> = conn
                .query_row(
                    &format!(
                        "{COMMENT_THREAD_CTE}
                         SELECT comments.parent_id
                         FROM thread
                         JOIN comments ON comments.id = thread.id
                         WHERE comments.id = ?2
                           AND comments.user_id = ?3;"
                    ),
                    params![head, comment_id, user_id],
                    |row| nullable_integer(row, 0),
                )
                .optional()?;
            let Some(parent_id) = parent_id else {
                return Ok(None);
            };

            conn.execute(
                "UPDATE comments SET parent_id = ?2 WHERE parent_id = ?1;",
                params![comment_id, parent_id],
            )?;
            if head == comment_id {
                conn.execute(
                    "UPDATE sections SET comment_id = ?3 WHERE module_id = ?1 AND id = ?2;",
                    params![module_id, section_id, parent_id],
                )?;
            }
            conn.execute("DELETE FROM comments WHERE id = ?1;", [comment_id])?;

            Ok::<_, DbError>(Some(comment_id))
        })
    }
}

/// Current thread head of a section.
///
/// Outer `None`: no such section. Inner `None`: section has no comments.
fn section_comment_head(
    conn: &Connection,
    module_id: ModuleId,
    section_id: SectionId,
) -> rusqlite::Result<Option<Option<CommentId>>> {
    conn.query_row(
        "SELECT comment_id FROM sections WHERE module_id = ?1 AND id = ?2;",
        params![module_id, section_id],
        |row| nullable_integer(row, 0),
    )
    .optional()
}
