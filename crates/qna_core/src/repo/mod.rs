//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must re-validate records before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateUserId`)
//!   in addition to DB transport errors.
//! - Storage assigns ids and timestamps; callers never write them.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::model::question::QuestionValidationError;
use crate::model::user::{UserKey, UserValidationError};
use rusqlite::{ffi, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod question_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    UserValidation(UserValidationError),
    QuestionValidation(QuestionValidationError),
    Db(DbError),
    NotFound {
        entity: &'static str,
        id: i64,
    },
    /// Another user already holds this business user-id.
    DuplicateUserId(String),
    /// An update tried to move a row to a different business user-id.
    UserIdChanged {
        id: UserKey,
        stored: String,
        requested: String,
    },
    /// A question references a user row that does not exist.
    UnknownWriter(UserKey),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserValidation(err) => write!(f, "{err}"),
            Self::QuestionValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::DuplicateUserId(user_id) => write!(f, "user id already exists: `{user_id}`"),
            Self::UserIdChanged {
                id,
                stored,
                requested,
            } => write!(
                f,
                "user {id} is stored as `{stored}`; refusing to change user id to `{requested}`"
            ),
            Self::UnknownWriter(id) => write!(f, "question writer does not exist: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it through db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UserValidation(err) => Some(err),
            Self::QuestionValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UserValidationError> for RepoError {
    fn from(value: UserValidationError) -> Self {
        Self::UserValidation(value)
    }
}

impl From<QuestionValidationError> for RepoError {
    fn from(value: QuestionValidationError) -> Self {
        Self::QuestionValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Verifies that `conn` was migrated and exposes `table` with `columns`.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(RepoError::MissingRequiredTable(table));
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let present = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(&column) = columns
        .iter()
        .find(|column| !present.iter().any(|name| name.as_str() == **column))
    {
        return Err(RepoError::MissingRequiredColumn { table, column });
    }

    Ok(())
}

/// Returns whether `err` is a constraint failure with the given extended code.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error, extended_code: i32) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.extended_code == extended_code
    )
}

pub(crate) const UNIQUE_VIOLATION: i32 = ffi::SQLITE_CONSTRAINT_UNIQUE;
pub(crate) const FOREIGN_KEY_VIOLATION: i32 = ffi::SQLITE_CONSTRAINT_FOREIGNKEY;

pub(crate) fn parse_flag(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn flag_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
