//! Persistence adapters over the section database.
//!
//! # Responsibility
//! - Define the backend procedure contract the section store drives.
//! - Provide SQLite implementations of the procedures and the comment
//!   collaborator.
//! - Translate backend failures into the section store error taxonomy.
//!
//! # Invariants
//! - Argument contracts are checked before any backend call.
//! - Every value reaches SQLite through parameter binding.
//! - Statements and savepoints are released on every exit path.

mod columns;
pub mod comment_repo;
pub mod procedures;
pub mod schema;
pub mod section_store;
mod savepoint;
