//! Section store: typed section operations over the procedure contract.
//!
//! # Responsibility
//! - Check argument contracts before touching the backend.
//! - Marshal domain values into procedure arguments and decode result rows.
//! - Map backend failures to save/load/delete errors, keeping the cause.
//!
//! # Invariants
//! - `module_id > 0` and `section_id >= 0` for every operation.
//! - One procedure call per operation; nothing is retried or cached.
//! - Transaction grouping across operations belongs to the caller.

use crate::db::DbError;
use crate::model::address::Address;
use crate::model::section::{parse_section_permission, Section, SectionPermission};
use crate::model::{CommentId, ModuleId, SectionId, UserId};
use crate::repo::comment_repo::{CommentEditor, CommentError, SqliteCommentRepository};
use crate::repo::procedures::{
    CreateSectionArgs, SectionProcedures, SectionRow, SqliteSectionProcedures,
};
use crate::repo::schema::SchemaError;
use log::{debug, error, warn};
use rusqlite::Connection;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type StoreResult<T> = Result<T, SectionStoreError>;

/// Sections of one module, each mapped to its comment thread head.
pub type LoadedSections = HashMap<Section, Option<CommentId>>;

/// Failure of a section store operation.
///
/// `InvalidArgument` is a caller bug and is raised before any backend call;
/// the other variants are operational failures of the backend.
#[derive(Debug)]
pub enum SectionStoreError {
    InvalidArgument {
        argument: &'static str,
        requirement: &'static str,
    },
    Save(FailureCause),
    Load(FailureCause),
    Delete(FailureCause),
}

/// Underlying reason of an operational failure.
#[derive(Debug)]
pub enum FailureCause {
    Backend(DbError),
    Comment(CommentError),
    /// The backend returned NULL where an identity was required.
    NullIdentity(&'static str),
    /// A result row could not be decoded into domain values.
    InvalidData(String),
}

impl SectionStoreError {
    /// Whether the caller broke an argument contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    pub fn cause(&self) -> Option<&FailureCause> {
        match self {
            Self::InvalidArgument { .. } => None,
            Self::Save(cause) | Self::Load(cause) | Self::Delete(cause) => Some(cause),
        }
    }
}

impl Display for FailureCause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backend(err) => write!(f, "{err}"),
            Self::Comment(err) => write!(f, "{err}"),
            Self::NullIdentity(what) => write!(f, "database returned a null {what}"),
            Self::InvalidData(message) => write!(f, "invalid section row: {message}"),
        }
    }
}

impl Display for SectionStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument {
                argument,
                requirement,
            } => write!(f, "invalid argument `{argument}`: {requirement}"),
            Self::Save(cause) => write!(f, "could not save section data: {cause}"),
            Self::Load(cause) => write!(f, "could not load section data: {cause}"),
            Self::Delete(cause) => write!(f, "could not delete section data: {cause}"),
        }
    }
}

impl Error for SectionStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self.cause()? {
            FailureCause::Backend(err) => Some(err),
            FailureCause::Comment(err) => Some(err),
            FailureCause::NullIdentity(_) | FailureCause::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for FailureCause {
    fn from(value: DbError) -> Self {
        Self::Backend(value)
    }
}

impl From<CommentError> for FailureCause {
    fn from(value: CommentError) -> Self {
        Self::Comment(value)
    }
}

/// Input of `create_section`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSection<'a> {
    pub module_id: ModuleId,
    pub name: &'a str,
    /// Existing comment thread head, if any.
    pub comment_id: Option<CommentId>,
    pub start_address: Address,
    pub end_address: Address,
    pub permission: SectionPermission,
    pub data: &'a [u8],
}

/// Section operations over a procedure backend and a comment collaborator.
pub struct SectionStore<P, C> {
    procedures: P,
    comments: C,
}

/// Store wired to one SQLite connection.
pub type SqliteSectionStore<'conn> =
    SectionStore<SqliteSectionProcedures<'conn>, SqliteCommentRepository<'conn>>;

impl<'conn> SectionStore<SqliteSectionProcedures<'conn>, SqliteCommentRepository<'conn>> {
    /// Builds a store whose procedures and comment editing share `conn`.
    pub fn try_from_connection(conn: &'conn Connection) -> Result<Self, SchemaError> {
        Ok(Self::new(
            SqliteSectionProcedures::try_new(conn)?,
            SqliteCommentRepository::try_new(conn)?,
        ))
    }
}

impl<P: SectionProcedures, C: CommentEditor> SectionStore<P, C> {
    pub fn new(procedures: P, comments: C) -> Self {
        Self {
            procedures,
            comments,
        }
    }

    pub fn procedures(&self) -> &P {
        &self.procedures
    }

    pub fn comments(&self) -> &C {
        &self.comments
    }

    /// Creates a section and returns the id assigned by the backend.
    ///
    /// # Errors
    /// - `InvalidArgument` when `module_id <= 0`.
    /// - `Save` on backend failure or when no id comes back.
    pub fn create_section(&self, section: &NewSection<'_>) -> StoreResult<SectionId> {
        let started_at = Instant::now();
        let result = self.create_section_inner(section);
        report("section_create", section.module_id, started_at, result)
    }

    /// Deletes a section together with the comments only it references.
    ///
    /// # Errors
    /// - `InvalidArgument` when the section's module or id is out of range.
    /// - `Delete` on backend failure.
    pub fn delete_section(&self, section: &Section) -> StoreResult<()> {
        let started_at = Instant::now();
        let result = self.delete_section_inner(section);
        report("section_delete", section.module_id, started_at, result)
    }

    /// Loads every section of `module_id` with its comment thread head.
    ///
    /// Row order from the backend is not preserved.
    ///
    /// # Errors
    /// - `InvalidArgument` when `module_id <= 0`.
    /// - `Load` on backend failure or when any row fails to decode.
    pub fn load_sections(&self, module_id: ModuleId) -> StoreResult<LoadedSections> {
        let started_at = Instant::now();
        let result = self.load_sections_inner(module_id);
        report("section_load", module_id, started_at, result)
    }

    /// Renames a section.
    ///
    /// # Errors
    /// - `InvalidArgument` when `module_id <= 0` or `section_id < 0`.
    /// - `Save` on backend failure.
    pub fn set_section_name(
        &self,
        module_id: ModuleId,
        section_id: SectionId,
        name: &str,
    ) -> StoreResult<()> {
        let started_at = Instant::now();
        let result = self.set_section_name_inner(module_id, section_id, name);
        report("section_rename", module_id, started_at, result)
    }

    /// Appends a comment to the section's thread and returns its id.
    ///
    /// # Errors
    /// - `InvalidArgument` when `module_id <= 0` or `section_id < 0`.
    /// - `Save` on backend failure or when no comment id comes back.
    pub fn append_section_comment(
        &self,
        module_id: ModuleId,
        section_id: SectionId,
        comment_text: &str,
        user_id: UserId,
    ) -> StoreResult<CommentId> {
        let started_at = Instant::now();
        let result =
            self.append_section_comment_inner(module_id, section_id, comment_text, user_id);
        report("section_comment_append", module_id, started_at, result)
    }

    /// Removes one comment from the section's thread.
    ///
    /// # Errors
    /// - `InvalidArgument` when `module_id <= 0` or `section_id < 0`.
    /// - `Delete` on backend failure or when the backend acknowledges with NULL.
    pub fn delete_section_comment(
        &self,
        module_id: ModuleId,
        section_id: SectionId,
        comment_id: CommentId,
        user_id: UserId,
    ) -> StoreResult<()> {
        let started_at = Instant::now();
        let result =
            self.delete_section_comment_inner(module_id, section_id, comment_id, user_id);
        report("section_comment_delete", module_id, started_at, result)
    }

    /// Replaces the text of a section comment through the comment collaborator.
    ///
    /// # Errors
    /// - `InvalidArgument` when `module_id <= 0`.
    /// - `Save` with the collaborator's error.
    pub fn edit_section_comment(
        &self,
        module_id: ModuleId,
        comment_id: CommentId,
        user_id: UserId,
        comment_text: &str,
    ) -> StoreResult<()> {
        let started_at = Instant::now();
        let result = self.edit_section_comment_inner(module_id, comment_id, user_id, comment_text);
        report("section_comment_edit", module_id, started_at, result)
    }

    fn create_section_inner(&self, section: &NewSection<'_>) -> StoreResult<SectionId> {
        check_module_id(section.module_id)?;

        let args = CreateSectionArgs {
            module_id: section.module_id,
            name: section.name,
            comment_id: section.comment_id,
            start_address: section.start_address.to_u64(),
            end_address: section.end_address.to_u64(),
            permission: section.permission.as_str(),
            data: section.data,
        };
        self.procedures
            .create_section(&args)
            .map_err(|err| SectionStoreError::Save(err.into()))?
            .ok_or(SectionStoreError::Save(FailureCause::NullIdentity(
                "section id",
            )))
    }

    fn delete_section_inner(&self, section: &Section) -> StoreResult<()> {
        check_module_id(section.module_id)?;
        check_section_id(section.id)?;

        self.procedures
            .delete_section(section.module_id, section.id)
            .map_err(|err| SectionStoreError::Delete(err.into()))
    }

    fn load_sections_inner(&self, module_id: ModuleId) -> StoreResult<LoadedSections> {
        check_module_id(module_id)?;

        let rows = self
            .procedures
            .get_sections(module_id)
            .map_err(|err| SectionStoreError::Load(err.into()))?;

        let mut sections = HashMap::with_capacity(rows.len());
        for row in rows {
            let (section, comment_id) =
                decode_section_row(module_id, row).map_err(SectionStoreError::Load)?;
            sections.insert(section, comment_id);
        }
        Ok(sections)
    }

    fn set_section_name_inner(
        &self,
        module_id: ModuleId,
        section_id: SectionId,
        name: &str,
    ) -> StoreResult<()> {
        check_module_id(module_id)?;
        check_section_id(section_id)?;

        self.procedures
            .set_section_name(module_id, section_id, name)
            .map_err(|err| SectionStoreError::Save(err.into()))
    }

    fn append_section_comment_inner(
        &self,
        module_id: ModuleId,
        section_id: SectionId,
        comment_text: &str,
        user_id: UserId,
    ) -> StoreResult<CommentId> {
        check_module_id(module_id)?;
        check_section_id(section_id)?;

        self.procedures
            .append_section_comment(module_id, section_id, user_id, comment_text)
            .map_err(|err| SectionStoreError::Save(err.into()))?
            .ok_or(SectionStoreError::Save(FailureCause::NullIdentity(
                "comment id",
            )))
    }

    fn delete_section_comment_inner(
        &self,
        module_id: ModuleId,
        section_id: SectionId,
        comment_id: CommentId,
        user_id: UserId,
    ) -> StoreResult<()> {
        check_module_id(module_id)?;
        check_section_id(section_id)?;

        self.procedures
            .delete_section_comment(module_id, section_id, comment_id, user_id)
            .map_err(|err| SectionStoreError::Delete(err.into()))?
            .map(|_| ())
            .ok_or(SectionStoreError::Delete(FailureCause::NullIdentity(
                "comment deletion acknowledgement",
            )))
    }

    fn edit_section_comment_inner(
        &self,
        module_id: ModuleId,
        comment_id: CommentId,
        user_id: UserId,
        comment_text: &str,
    ) -> StoreResult<()> {
        check_module_id(module_id)?;

        self.comments
            .edit_comment(comment_id, user_id, comment_text)
            .map_err(|err| SectionStoreError::Save(err.into()))
    }
}

fn decode_section_row(
    module_id: ModuleId,
    row: SectionRow,
) -> Result<(Section, Option<CommentId>), FailureCause> {
    let permission = parse_section_permission(&row.permission).map_err(|err| {
        FailureCause::InvalidData(format!("{err} in sections.permission of section {}", row.id))
    })?;

    let section = Section {
        id: row.id,
        module_id,
        name: row.name,
        start_address: Address::new(row.start_address),
        end_address: Address::new(row.end_address),
        permission,
        data: row.data,
    };
    Ok((section, row.comment_id))
}

fn check_module_id(module_id: ModuleId) -> StoreResult<()> {
    if module_id <= 0 {
        return Err(SectionStoreError::InvalidArgument {
            argument: "module_id",
            requirement: "must be greater than zero",
        });
    }
    Ok(())
}

fn check_section_id(section_id: SectionId) -> StoreResult<()> {
    if section_id < 0 {
        return Err(SectionStoreError::InvalidArgument {
            argument: "section_id",
            requirement: "must be greater than or equal to zero",
        });
    }
    Ok(())
}

fn report<T>(
    event: &'static str,
    module_id: ModuleId,
    started_at: Instant,
    result: StoreResult<T>,
) -> StoreResult<T> {
    let duration_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(_) => debug!(
            "event={event} module=section_store status=ok module_id={module_id} duration_ms={duration_ms}"
        ),
        Err(err) if err.is_contract_violation() => warn!(
            "event={event} module=section_store status=error module_id={module_id} duration_ms={duration_ms} error_code=invalid_argument error={err}"
        ),
        Err(err) => error!(
            "event={event} module=section_store status=error module_id={module_id} duration_ms={duration_ms} error_code=backend_failure error={err}"
        ),
    }
    result
}
