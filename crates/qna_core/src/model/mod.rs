//! Q&A domain model.
//!
//! # Responsibility
//! - Define canonical user and question records used by core business logic.
//! - Keep authorization rules next to the data they guard.
//!
//! # Invariants
//! - Storage identity and timestamps are `None` until a successful save.
//! - Questions are removed by soft-delete tombstones, not hard delete.

pub mod question;
pub mod user;
