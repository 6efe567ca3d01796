//! User domain model.
//!
//! # Responsibility
//! - Define the canonical user record shared by repositories and services.
//! - Own the credentialed profile update rule and the name/email comparison.
//!
//! # Invariants
//! - `user_id` is non-blank and never changes after construction.
//! - `password` is never empty.
//! - Profile fields change only through [`User::update`]; the credential
//!   changes only through [`User::change_password`].
//! - Authorization fails closed: any mismatch leaves the record untouched.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned identifier for a persisted user row.
pub type UserKey = i64;

/// Validation errors for user construction and credential rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserValidationError {
    /// Business user-id is empty or whitespace only.
    BlankUserId,
    /// Password is empty.
    EmptyPassword,
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankUserId => write!(f, "user id must not be blank"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl Error for UserValidationError {}

/// Why an update was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedReason {
    /// The acting user is not the owner of the record being updated.
    ActorMismatch,
    /// The desired state names a different business user-id.
    TargetMismatch,
    /// The presented credential does not match the stored one.
    CredentialMismatch,
}

/// Raised when a credentialed mutation is refused.
///
/// Never carries the presented or stored credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnauthorizedError {
    user_id: String,
    reason: UnauthorizedReason,
}

impl UnauthorizedError {
    pub(crate) fn new(user_id: &str, reason: UnauthorizedReason) -> Self {
        Self {
            user_id: user_id.to_string(),
            reason,
        }
    }

    /// Business user-id of the record the mutation targeted.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn reason(&self) -> UnauthorizedReason {
        self.reason
    }
}

impl Display for UnauthorizedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let detail = match self.reason {
            UnauthorizedReason::ActorMismatch => "actor does not own this record",
            UnauthorizedReason::TargetMismatch => "desired state names another user",
            UnauthorizedReason::CredentialMismatch => "credential did not match",
        };
        write!(f, "update refused for user `{}`: {detail}", self.user_id)
    }
}

impl Error for UnauthorizedError {}

/// Errors from [`User::change_password`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordChangeError {
    Unauthorized(UnauthorizedError),
    Validation(UserValidationError),
}

impl Display for PasswordChangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PasswordChangeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unauthorized(err) => Some(err),
            Self::Validation(err) => Some(err),
        }
    }
}

impl From<UnauthorizedError> for PasswordChangeError {
    fn from(value: UnauthorizedError) -> Self {
        Self::Unauthorized(value)
    }
}

impl From<UserValidationError> for PasswordChangeError {
    fn from(value: UserValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Canonical user record.
///
/// `id`, `created_at` and `updated_at` are populated by storage on save.
/// The password is accepted on deserialize but never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UserWire")]
pub struct User {
    id: Option<UserKey>,
    user_id: String,
    #[serde(skip_serializing)]
    password: String,
    name: String,
    email: String,
    /// Unix epoch milliseconds.
    created_at: Option<i64>,
    /// Unix epoch milliseconds.
    updated_at: Option<i64>,
}

#[derive(Deserialize)]
struct UserWire {
    #[serde(default)]
    id: Option<UserKey>,
    user_id: String,
    password: String,
    name: String,
    email: String,
    #[serde(default)]
    created_at: Option<i64>,
    #[serde(default)]
    updated_at: Option<i64>,
}

impl TryFrom<UserWire> for User {
    type Error = UserValidationError;

    fn try_from(wire: UserWire) -> Result<Self, Self::Error> {
        let mut user = Self::build(wire.id, wire.user_id, wire.password, wire.name, wire.email)?;
        user.created_at = wire.created_at;
        user.updated_at = wire.updated_at;
        Ok(user)
    }
}

impl User {
    /// Creates a transient user that storage has not seen yet.
    pub fn new(
        user_id: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, UserValidationError> {
        Self::build(None, user_id, password, name, email)
    }

    /// Creates a user with a caller-provided storage id.
    ///
    /// Used by fixtures and import paths where the row identity already exists.
    pub fn with_id(
        id: UserKey,
        user_id: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, UserValidationError> {
        Self::build(Some(id), user_id, password, name, email)
    }

    fn build(
        id: Option<UserKey>,
        user_id: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, UserValidationError> {
        let user = Self {
            id,
            user_id: user_id.into(),
            password: password.into(),
            name: name.into(),
            email: email.into(),
            created_at: None,
            updated_at: None,
        };
        user.validate()?;
        Ok(user)
    }

    /// Re-checks construction invariants. Repositories call this before writes.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.user_id.trim().is_empty() {
            return Err(UserValidationError::BlankUserId);
        }
        if self.password.is_empty() {
            return Err(UserValidationError::EmptyPassword);
        }
        Ok(())
    }

    pub fn id(&self) -> Option<UserKey> {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn created_at(&self) -> Option<i64> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<i64> {
        self.updated_at
    }

    /// Exact, case-sensitive credential check. An empty credential never matches.
    pub fn match_password(&self, credential: &str) -> bool {
        !credential.is_empty() && self.password == credential
    }

    /// Returns whether this record belongs to the given business user-id.
    pub fn match_user_id(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Applies `desired`'s name and email when `actor` is authorized.
    ///
    /// # Contract
    /// - `actor` must own this record (same business user-id).
    /// - `desired` must name the same business user-id.
    /// - `desired`'s password is the presented credential and must equal
    ///   both this record's password and `actor`'s password exactly.
    /// - On refusal no field is modified.
    /// - The password itself is not rotated here; see [`User::change_password`].
    pub fn update(&mut self, actor: &User, desired: &User) -> Result<&Self, UnauthorizedError> {
        if !actor.match_user_id(&self.user_id) {
            return Err(UnauthorizedError::new(
                &self.user_id,
                UnauthorizedReason::ActorMismatch,
            ));
        }
        if !desired.match_user_id(&self.user_id) {
            return Err(UnauthorizedError::new(
                &self.user_id,
                UnauthorizedReason::TargetMismatch,
            ));
        }
        // `actor` may be caller-built; the receiver holds the stored credential.
        if !self.match_password(&desired.password) || !actor.match_password(&desired.password) {
            return Err(UnauthorizedError::new(
                &self.user_id,
                UnauthorizedReason::CredentialMismatch,
            ));
        }

        self.name = desired.name.clone();
        self.email = desired.email.clone();
        Ok(self)
    }

    /// Rotates the credential after re-confirming the current one.
    pub fn change_password(
        &mut self,
        current: &str,
        new_password: impl Into<String>,
    ) -> Result<(), PasswordChangeError> {
        if !self.match_password(current) {
            return Err(UnauthorizedError::new(
                &self.user_id,
                UnauthorizedReason::CredentialMismatch,
            )
            .into());
        }
        let new_password = new_password.into();
        if new_password.is_empty() {
            return Err(UserValidationError::EmptyPassword.into());
        }
        self.password = new_password;
        Ok(())
    }

    /// Compares display name and email only, ignoring every identity field.
    pub fn equals_name_and_email(&self, other: &User) -> bool {
        self.name == other.name && self.email == other.email
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    /// Attaches storage-assigned identity and timestamps after a write.
    pub(crate) fn persisted(mut self, id: UserKey, created_at: i64, updated_at: i64) -> Self {
        self.id = Some(id);
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
        self
    }
}
