//! User repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide find/save APIs over the canonical `users` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `User::validate()` before SQL mutations.
//! - `user_id` is unique and is never rewritten by an update.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::NOW_EPOCH_MS_SQL;
use crate::model::user::{User, UserKey};
use crate::repo::{
    ensure_connection_ready, is_constraint_violation, RepoError, RepoResult, UNIQUE_VIOLATION,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    password,
    name,
    email,
    created_at,
    updated_at
FROM users";

const USER_COLUMNS: &[&str] = &[
    "id",
    "user_id",
    "password",
    "name",
    "email",
    "created_at",
    "updated_at",
];

/// Repository interface for user persistence.
pub trait UserRepository {
    /// Finds a user by storage id.
    fn find_by_id(&self, id: UserKey) -> RepoResult<Option<User>>;
    /// Finds a user by business user-id.
    fn find_by_user_id(&self, user_id: &str) -> RepoResult<Option<User>>;
    /// Inserts or updates `user` and returns it with id and timestamps set.
    ///
    /// A record with an id that storage has never seen is inserted under
    /// that id. The update-or-insert runs as one transaction.
    fn save(&self, user: &User) -> RepoResult<User>;
    /// Saves inside a committed transaction and returns the persisted row.
    fn save_and_flush(&self, user: &User) -> RepoResult<User>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "users", USER_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn find_by_id(&self, id: UserKey) -> RepoResult<Option<User>> {
        find_one(self.conn, "id = ?1", params![id])
    }

    fn find_by_user_id(&self, user_id: &str) -> RepoResult<Option<User>> {
        find_one(self.conn, "user_id = ?1", params![user_id])
    }

    fn save(&self, user: &User) -> RepoResult<User> {
        let tx = self.conn.unchecked_transaction()?;
        let saved = write_user(&tx, user)?;
        tx.commit()?;
        Ok(saved)
    }

    fn save_and_flush(&self, user: &User) -> RepoResult<User> {
        let saved = self.save(user)?;

        let id = saved.id().ok_or_else(|| {
            RepoError::InvalidData("saved user has no storage id".to_string())
        })?;
        self.find_by_id(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("saved user {id} missing on read-back"))
        })
    }
}

fn find_one(
    conn: &Connection,
    predicate: &str,
    params: &[&dyn rusqlite::ToSql],
) -> RepoResult<Option<User>> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} WHERE {predicate};"))?;
    let mut rows = stmt.query(params)?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_user_row(row)?));
    }
    Ok(None)
}

fn write_user(conn: &Connection, user: &User) -> RepoResult<User> {
    user.validate()?;

    match user.id() {
        None => insert_user(conn, user, None),
        Some(id) => match update_user(conn, id, user)? {
            Some(saved) => Ok(saved),
            None => match stored_user_id(conn, id)? {
                Some(stored) => Err(RepoError::UserIdChanged {
                    id,
                    stored,
                    requested: user.user_id().to_string(),
                }),
                None => insert_user(conn, user, Some(id)),
            },
        },
    }
}

fn insert_user(conn: &Connection, user: &User, id: Option<UserKey>) -> RepoResult<User> {
    let result: rusqlite::Result<(UserKey, i64, i64)> = conn.query_row(
        "INSERT INTO users (id, user_id, password, name, email)
         VALUES (?1, ?2, ?3, ?4, ?5)
         RETURNING id, created_at, updated_at;",
        params![
            id,
            user.user_id(),
            user.password(),
            user.name(),
            user.email(),
        ],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    );

    match result {
        Ok((id, created_at, updated_at)) => Ok(user.clone().persisted(id, created_at, updated_at)),
        Err(err) if is_constraint_violation(&err, UNIQUE_VIOLATION) => {
            Err(RepoError::DuplicateUserId(user.user_id().to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

/// Returns `None` when no row matches both `id` and the business user-id.
fn update_user(conn: &Connection, id: UserKey, user: &User) -> RepoResult<Option<User>> {
    let timestamps: Option<(i64, i64)> = conn
        .query_row(
            &format!(
                "UPDATE users
                 SET
                    password = ?3,
                    name = ?4,
                    email = ?5,
                    updated_at = MAX(updated_at, {NOW_EPOCH_MS_SQL})
                 WHERE id = ?1
                   AND user_id = ?2
                 RETURNING created_at, updated_at;"
            ),
            params![id, user.user_id(), user.password(), user.name(), user.email()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    Ok(timestamps.map(|(created_at, updated_at)| user.clone().persisted(id, created_at, updated_at)))
}

fn stored_user_id(conn: &Connection, id: UserKey) -> RepoResult<Option<String>> {
    let stored = conn
        .query_row("SELECT user_id FROM users WHERE id = ?1;", [id], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(stored)
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id: UserKey = row.get("id")?;
    let user = User::with_id(
        id,
        row.get::<_, String>("user_id")?,
        row.get::<_, String>("password")?,
        row.get::<_, String>("name")?,
        row.get::<_, String>("email")?,
    )
    .map_err(|err| RepoError::InvalidData(format!("users row {id}: {err}")))?;

    Ok(user.persisted(id, row.get("created_at")?, row.get("updated_at")?))
}
