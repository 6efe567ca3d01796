//! User use-case service.
//!
//! # Responsibility
//! - Register users and look them up by business user-id.
//! - Apply credentialed profile updates and persist approved changes.
//!
//! # Invariants
//! - Nothing is written when `User::update` refuses a change.
//! - Log events carry user ids only, never credentials.

use crate::model::user::{PasswordChangeError, UnauthorizedError, UnauthorizedReason, User};
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for user use-cases.
#[derive(Debug)]
pub enum UserServiceError {
    /// Credential or ownership check failed.
    Unauthorized(UnauthorizedError),
    /// No user holds the given business user-id.
    UserNotFound(String),
    /// Business user-id is already registered.
    DuplicateUserId(String),
    PasswordChange(PasswordChangeError),
    Repo(RepoError),
}

impl Display for UserServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized(err) => write!(f, "{err}"),
            Self::UserNotFound(user_id) => write!(f, "user not found: `{user_id}`"),
            Self::DuplicateUserId(user_id) => write!(f, "user id already exists: `{user_id}`"),
            Self::PasswordChange(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UserServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unauthorized(err) => Some(err),
            Self::PasswordChange(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::UserNotFound(_) | Self::DuplicateUserId(_) => None,
        }
    }
}

impl From<RepoError> for UserServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicateUserId(user_id) => Self::DuplicateUserId(user_id),
            other => Self::Repo(other),
        }
    }
}

impl From<UnauthorizedError> for UserServiceError {
    fn from(value: UnauthorizedError) -> Self {
        Self::Unauthorized(value)
    }
}

impl From<PasswordChangeError> for UserServiceError {
    fn from(value: PasswordChangeError) -> Self {
        match value {
            PasswordChangeError::Unauthorized(err) => Self::Unauthorized(err),
            other => Self::PasswordChange(other),
        }
    }
}

/// User service facade over repository implementations.
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persists a new user and returns the stored record.
    pub fn register(&self, user: &User) -> Result<User, UserServiceError> {
        let saved = self.repo.save_and_flush(user)?;
        info!(
            "event=user_register module=user status=ok user_id={}",
            saved.user_id()
        );
        Ok(saved)
    }

    /// Finds a user by business user-id.
    pub fn find(&self, user_id: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self.repo.find_by_user_id(user_id)?)
    }

    /// Applies a credentialed profile update on the stored record.
    ///
    /// # Contract
    /// - Loads the stored record named by `desired.user_id()`.
    /// - `actor` is re-read from storage by its user-id; its in-memory
    ///   password is never trusted. An actor with no stored row is refused.
    /// - Refusals from `User::update` return `Unauthorized` and skip persistence.
    /// - Returns the record as persisted after flush.
    pub fn update_profile(&self, actor: &User, desired: &User) -> Result<User, UserServiceError> {
        let mut stored = self.load(desired.user_id())?;

        let outcome = match self.repo.find_by_user_id(actor.user_id())? {
            Some(login) => stored.update(&login, desired).map(|_| ()),
            None => Err(UnauthorizedError::new(
                stored.user_id(),
                UnauthorizedReason::ActorMismatch,
            )),
        };
        if let Err(err) = outcome {
            warn!(
                "event=user_update module=user status=denied user_id={} reason={:?}",
                err.user_id(),
                err.reason()
            );
            return Err(err.into());
        }

        let saved = self.repo.save_and_flush(&stored)?;
        info!(
            "event=user_update module=user status=ok user_id={}",
            saved.user_id()
        );
        Ok(saved)
    }

    /// Rotates a user's password after re-confirming the current one.
    pub fn change_password(
        &self,
        user_id: &str,
        current: &str,
        new_password: &str,
    ) -> Result<User, UserServiceError> {
        let mut stored = self.load(user_id)?;

        if let Err(err) = stored.change_password(current, new_password) {
            warn!(
                "event=user_password_change module=user status=denied user_id={user_id} error={err}"
            );
            return Err(err.into());
        }

        let saved = self.repo.save_and_flush(&stored)?;
        info!("event=user_password_change module=user status=ok user_id={user_id}");
        Ok(saved)
    }

    fn load(&self, user_id: &str) -> Result<User, UserServiceError> {
        self.repo
            .find_by_user_id(user_id)?
            .ok_or_else(|| UserServiceError::UserNotFound(user_id.to_string()))
    }
}
