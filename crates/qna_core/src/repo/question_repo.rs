//! Question repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide save and soft-delete aware lookups over `questions`.
//!
//! # Invariants
//! - `find_by_*_deleted_false` queries never return tombstoned rows.
//! - `get_one` returns a row regardless of its tombstone state.
//! - `writer_id` must reference an existing user row.

use crate::db::NOW_EPOCH_MS_SQL;
use crate::model::question::{Question, QuestionKey};
use crate::repo::{
    ensure_connection_ready, flag_to_int, is_constraint_violation, parse_flag, RepoError,
    RepoResult, FOREIGN_KEY_VIOLATION,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const QUESTION_SELECT_SQL: &str = "SELECT
    id,
    title,
    contents,
    writer_id,
    deleted,
    created_at,
    updated_at
FROM questions";

const QUESTION_COLUMNS: &[&str] = &[
    "id",
    "title",
    "contents",
    "writer_id",
    "deleted",
    "created_at",
    "updated_at",
];

/// Repository interface for question persistence.
pub trait QuestionRepository {
    fn save(&self, question: &Question) -> RepoResult<Question>;
    fn save_and_flush(&self, question: &Question) -> RepoResult<Question>;
    /// Finds an active question by id.
    fn find_by_id_and_deleted_false(&self, id: QuestionKey) -> RepoResult<Option<Question>>;
    /// Lists all active questions ordered by id.
    fn find_by_deleted_false(&self) -> RepoResult<Vec<Question>>;
    /// Loads a question by id, including tombstoned rows.
    ///
    /// Returns `RepoError::NotFound` when the id is unknown.
    fn get_one(&self, id: QuestionKey) -> RepoResult<Question>;
}

/// SQLite-backed question repository.
pub struct SqliteQuestionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteQuestionRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "questions", QUESTION_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl QuestionRepository for SqliteQuestionRepository<'_> {
    fn save(&self, question: &Question) -> RepoResult<Question> {
        let tx = self.conn.unchecked_transaction()?;
        let saved = write_question(&tx, question)?;
        tx.commit()?;
        Ok(saved)
    }

    fn save_and_flush(&self, question: &Question) -> RepoResult<Question> {
        let saved = self.save(question)?;

        let id = saved.id().ok_or_else(|| {
            RepoError::InvalidData("saved question has no storage id".to_string())
        })?;
        self.get_one(id)
    }

    fn find_by_id_and_deleted_false(&self, id: QuestionKey) -> RepoResult<Option<Question>> {
        let mut stmt = self.conn.prepare(&format!(
            "{QUESTION_SELECT_SQL}
             WHERE id = ?1
               AND deleted = 0;"
        ))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_question_row(row)?));
        }
        Ok(None)
    }

    fn find_by_deleted_false(&self) -> RepoResult<Vec<Question>> {
        let mut stmt = self.conn.prepare(&format!(
            "{QUESTION_SELECT_SQL}
             WHERE deleted = 0
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut questions = Vec::new();
        while let Some(row) = rows.next()? {
            questions.push(parse_question_row(row)?);
        }
        Ok(questions)
    }

    fn get_one(&self, id: QuestionKey) -> RepoResult<Question> {
        let mut stmt = self
            .conn
            .prepare(&format!("{QUESTION_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => parse_question_row(row),
            None => Err(RepoError::NotFound {
                entity: "question",
                id,
            }),
        }
    }
}

fn write_question(conn: &Connection, question: &Question) -> RepoResult<Question> {
    question.validate()?;

    let result = match question.id() {
        None => insert_question(conn, question, None),
        Some(id) => match update_question(conn, id, question) {
            Ok(Some(saved)) => Ok(saved),
            Ok(None) => insert_question(conn, question, Some(id)),
            Err(err) => Err(err),
        },
    };

    result.map_err(|err| {
        if is_constraint_violation(&err, FOREIGN_KEY_VIOLATION) {
            RepoError::UnknownWriter(question.writer_id().unwrap_or_default())
        } else {
            err.into()
        }
    })
}

fn insert_question(
    conn: &Connection,
    question: &Question,
    id: Option<QuestionKey>,
) -> rusqlite::Result<Question> {
    let (id, created_at, updated_at): (QuestionKey, i64, i64) = conn.query_row(
        "INSERT INTO questions (id, title, contents, writer_id, deleted)
         VALUES (?1, ?2, ?3, ?4, ?5)
         RETURNING id, created_at, updated_at;",
        params![
            id,
            question.title(),
            question.contents(),
            question.writer_id(),
            flag_to_int(question.is_deleted()),
        ],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;
    Ok(question.clone().persisted(id, created_at, updated_at))
}

fn update_question(
    conn: &Connection,
    id: QuestionKey,
    question: &Question,
) -> rusqlite::Result<Option<Question>> {
    let timestamps: Option<(i64, i64)> = conn
        .query_row(
            &format!(
                "UPDATE questions
                 SET
                    title = ?2,
                    contents = ?3,
                    writer_id = ?4,
                    deleted = ?5,
                    updated_at = MAX(updated_at, {NOW_EPOCH_MS_SQL})
                 WHERE id = ?1
                 RETURNING created_at, updated_at;"
            ),
            params![
                id,
                question.title(),
                question.contents(),
                question.writer_id(),
                flag_to_int(question.is_deleted()),
            ],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    Ok(timestamps
        .map(|(created_at, updated_at)| question.clone().persisted(id, created_at, updated_at)))
}

fn parse_question_row(row: &Row<'_>) -> RepoResult<Question> {
    let id: QuestionKey = row.get("id")?;
    let question = Question::from_row(
        id,
        row.get("title")?,
        row.get("contents")?,
        row.get("writer_id")?,
        parse_flag(row.get("deleted")?, "questions.deleted")?,
        row.get("created_at")?,
        row.get("updated_at")?,
    );
    question
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("questions row {id}: {err}")))?;
    Ok(question)
}
