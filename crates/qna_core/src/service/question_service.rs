//! Question use-case service.
//!
//! # Responsibility
//! - Provide write/get/list/edit/delete entry points over questions.
//!
//! # Invariants
//! - Reads through this service only see active (not soft-deleted) questions.
//! - Only the writer may delete a question; deletion is a tombstone.

use crate::model::question::{Question, QuestionKey, QuestionValidationError};
use crate::model::user::User;
use crate::repo::question_repo::QuestionRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for question use-cases.
#[derive(Debug)]
pub enum QuestionServiceError {
    Validation(QuestionValidationError),
    /// Target question does not exist or is soft-deleted.
    QuestionNotFound(QuestionKey),
    /// Actor is not the writer of the question.
    NotWriter {
        question_id: QuestionKey,
        user_id: String,
    },
    Repo(RepoError),
}

impl Display for QuestionServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::QuestionNotFound(id) => write!(f, "question not found: {id}"),
            Self::NotWriter {
                question_id,
                user_id,
            } => write!(
                f,
                "user `{user_id}` is not the writer of question {question_id}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for QuestionServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for QuestionServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { id, .. } => Self::QuestionNotFound(id),
            RepoError::QuestionValidation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<QuestionValidationError> for QuestionServiceError {
    fn from(value: QuestionValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Question service facade over repository implementations.
pub struct QuestionService<R: QuestionRepository> {
    repo: R,
}

impl<R: QuestionRepository> QuestionService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Writes a new question attributed to a persisted `writer`.
    pub fn write_question(
        &self,
        writer: &User,
        title: &str,
        contents: &str,
    ) -> Result<Question, QuestionServiceError> {
        let question = Question::write_question(title, contents, writer)?;
        let saved = self.repo.save_and_flush(&question)?;
        info!(
            "event=question_write module=question status=ok question_id={} user_id={}",
            saved.id().unwrap_or_default(),
            writer.user_id()
        );
        Ok(saved)
    }

    /// Gets one active question.
    pub fn get_question(&self, id: QuestionKey) -> Result<Question, QuestionServiceError> {
        self.repo
            .find_by_id_and_deleted_false(id)?
            .ok_or(QuestionServiceError::QuestionNotFound(id))
    }

    /// Lists all active questions ordered by id.
    pub fn list_questions(&self) -> Result<Vec<Question>, QuestionServiceError> {
        Ok(self.repo.find_by_deleted_false()?)
    }

    /// Replaces the title of an active question.
    pub fn update_title(
        &self,
        id: QuestionKey,
        title: &str,
    ) -> Result<Question, QuestionServiceError> {
        let mut question = self.get_question(id)?;
        question.update_title(title)?;
        Ok(self.repo.save_and_flush(&question)?)
    }

    /// Soft-deletes an active question on behalf of its writer.
    pub fn delete_question(
        &self,
        actor: &User,
        id: QuestionKey,
    ) -> Result<Question, QuestionServiceError> {
        let mut question = self.get_question(id)?;
        if !question.is_written_by(actor) {
            warn!(
                "event=question_delete module=question status=denied question_id={id} user_id={}",
                actor.user_id()
            );
            return Err(QuestionServiceError::NotWriter {
                question_id: id,
                user_id: actor.user_id().to_string(),
            });
        }

        question.soft_delete();
        let saved = self.repo.save_and_flush(&question)?;
        info!(
            "event=question_delete module=question status=ok question_id={id} user_id={}",
            actor.user_id()
        );
        Ok(saved)
    }
}
