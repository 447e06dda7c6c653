//! Domain values transported by the section store.
//!
//! # Responsibility
//! - Define the section, address and permission value types.
//! - Define the comment read model shared with the comment collaborator.
//!
//! # Invariants
//! - Identities are assigned by the database, never by these types.
//! - A section's comment thread head is not part of `Section`; it is
//!   carried alongside because it changes independently.

pub mod address;
pub mod comment;
pub mod section;

/// Database identity of a module (a disassembled binary image).
pub type ModuleId = i64;
/// Database identity of a section.
pub type SectionId = i64;
/// Database identity of a comment.
pub type CommentId = i64;
/// Database identity of the user authoring comments.
pub type UserId = i64;
