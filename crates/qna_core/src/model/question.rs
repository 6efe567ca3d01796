//! Question domain model.
//!
//! # Responsibility
//! - Define the question record and its writer reference.
//! - Provide lifecycle helpers for soft-delete semantics.
//!
//! # Invariants
//! - `title` is non-blank and at most [`TITLE_MAX_CHARS`] characters.
//! - `deleted` is the source of truth for tombstone state.
//! - `writer_id` references a persisted user when set.

use crate::model::user::{User, UserKey};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned identifier for a persisted question row.
pub type QuestionKey = i64;

/// Maximum title length, counted in characters.
pub const TITLE_MAX_CHARS: usize = 100;

/// Validation errors for question construction and edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionValidationError {
    BlankTitle,
    TitleTooLong { max: usize },
    /// The writer has no storage id yet, so it cannot be referenced.
    WriterNotPersisted,
}

impl Display for QuestionValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "question title must not be blank"),
            Self::TitleTooLong { max } => {
                write!(f, "question title must be at most {max} characters")
            }
            Self::WriterNotPersisted => write!(f, "question writer must be saved first"),
        }
    }
}

impl Error for QuestionValidationError {}

/// Canonical question record.
///
/// Deserialization applies the same title checks as [`Question::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionWire")]
pub struct Question {
    id: Option<QuestionKey>,
    title: String,
    contents: String,
    writer_id: Option<UserKey>,
    deleted: bool,
    created_at: Option<i64>,
    updated_at: Option<i64>,
}

#[derive(Deserialize)]
struct QuestionWire {
    #[serde(default)]
    id: Option<QuestionKey>,
    title: String,
    #[serde(default)]
    contents: String,
    #[serde(default)]
    writer_id: Option<UserKey>,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    created_at: Option<i64>,
    #[serde(default)]
    updated_at: Option<i64>,
}

impl TryFrom<QuestionWire> for Question {
    type Error = QuestionValidationError;

    fn try_from(wire: QuestionWire) -> Result<Self, Self::Error> {
        validate_title(&wire.title)?;
        Ok(Self {
            id: wire.id,
            title: wire.title,
            contents: wire.contents,
            writer_id: wire.writer_id,
            deleted: wire.deleted,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        })
    }
}

impl Question {
    /// Creates an unattributed, active question.
    pub fn new(
        title: impl Into<String>,
        contents: impl Into<String>,
    ) -> Result<Self, QuestionValidationError> {
        let question = Self {
            id: None,
            title: title.into(),
            contents: contents.into(),
            writer_id: None,
            deleted: false,
            created_at: None,
            updated_at: None,
        };
        question.validate()?;
        Ok(question)
    }

    /// Creates a question attributed to a persisted writer.
    pub fn write_question(
        title: impl Into<String>,
        contents: impl Into<String>,
        writer: &User,
    ) -> Result<Self, QuestionValidationError> {
        if writer.id().is_none() {
            return Err(QuestionValidationError::WriterNotPersisted);
        }
        Ok(Self::new(title, contents)?.write_by(writer))
    }

    /// Sets the writer reference from `writer`'s storage id.
    pub fn write_by(mut self, writer: &User) -> Self {
        self.writer_id = writer.id();
        self
    }

    pub fn validate(&self) -> Result<(), QuestionValidationError> {
        validate_title(&self.title)
    }

    pub fn id(&self) -> Option<QuestionKey> {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn writer_id(&self) -> Option<UserKey> {
        self.writer_id
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn created_at(&self) -> Option<i64> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<i64> {
        self.updated_at
    }

    /// Replaces the title, keeping the old one when the new value is invalid.
    pub fn update_title(&mut self, title: impl Into<String>) -> Result<(), QuestionValidationError> {
        let title = title.into();
        validate_title(&title)?;
        self.title = title;
        Ok(())
    }

    /// Returns whether `user` is the persisted writer of this question.
    pub fn is_written_by(&self, user: &User) -> bool {
        matches!((self.writer_id, user.id()), (Some(writer), Some(id)) if writer == id)
    }

    /// Marks this question as softly deleted (tombstoned).
    pub fn soft_delete(&mut self) {
        self.deleted = true;
    }

    /// Clears the soft delete flag.
    pub fn restore(&mut self) {
        self.deleted = false;
    }

    pub fn is_active(&self) -> bool {
        !self.deleted
    }

    pub(crate) fn from_row(
        id: QuestionKey,
        title: String,
        contents: String,
        writer_id: Option<UserKey>,
        deleted: bool,
        created_at: i64,
        updated_at: i64,
    ) -> Self {
        Self {
            id: Some(id),
            title,
            contents,
            writer_id,
            deleted,
            created_at: Some(created_at),
            updated_at: Some(updated_at),
        }
    }

    pub(crate) fn persisted(mut self, id: QuestionKey, created_at: i64, updated_at: i64) -> Self {
        self.id = Some(id);
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
        self
    }
}

fn validate_title(title: &str) -> Result<(), QuestionValidationError> {
    if title.trim().is_empty() {
        return Err(QuestionValidationError::BlankTitle);
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(QuestionValidationError::TitleTooLong {
            max: TITLE_MAX_CHARS,
        });
    }
    Ok(())
}
