use qna_core::db::open_db_in_memory;
use qna_core::{
    Question, QuestionRepository, RepoError, SqliteQuestionRepository, SqliteUserRepository, User,
    UserRepository,
};
use rusqlite::Connection;

fn javajigi() -> User {
    User::with_id(1, "javajigi", "password", "name", "javajigi@slipp.net").unwrap()
}

fn sanjigi() -> User {
    User::with_id(2, "sanjigi", "password", "name", "sanjigi@slipp.net").unwrap()
}

fn insert_question(conn: &Connection) -> Question {
    let users = SqliteUserRepository::try_new(conn).unwrap();
    let questions = SqliteQuestionRepository::try_new(conn).unwrap();

    let writer = users.save_and_flush(&javajigi()).unwrap();
    let actual =
        Question::write_question("question test title", "question test content", &writer).unwrap();
    questions.save_and_flush(&actual).unwrap()
}

#[test]
fn saved_question_is_selected_back() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQuestionRepository::try_new(&conn).unwrap();
    let insert = insert_question(&conn);

    let question = repo
        .find_by_id_and_deleted_false(insert.id().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(question.title(), "question test title");
    assert_eq!(question.contents(), "question test content");
    assert_eq!(question.writer_id(), Some(1));
}

#[test]
fn saving_a_persisted_question_returns_equal_record() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQuestionRepository::try_new(&conn).unwrap();
    let actual = insert_question(&conn);

    let question = repo.save(&actual).unwrap();
    assert_eq!(question.id(), actual.id());
    assert_eq!(question.title(), actual.title());
    assert_eq!(question.writer_id(), actual.writer_id());
    assert_eq!(question.created_at(), actual.created_at());
}

#[test]
fn title_update_is_persisted() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQuestionRepository::try_new(&conn).unwrap();
    let origin = insert_question(&conn);
    let new_title = "질문 있습니다~";

    let mut question = repo.get_one(origin.id().unwrap()).unwrap();
    question.update_title(new_title).unwrap();
    repo.save_and_flush(&question).unwrap();

    let after_update = repo
        .find_by_id_and_deleted_false(origin.id().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(after_update.title(), new_title);
    assert!(after_update.updated_at() >= origin.updated_at());
}

#[test]
fn select_where_not_deleted_skips_tombstones() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let repo = SqliteQuestionRepository::try_new(&conn).unwrap();
    let first_writer = users.save_and_flush(&javajigi()).unwrap();
    let second_writer = users.save_and_flush(&sanjigi()).unwrap();

    let q1 = repo
        .save(&Question::new("title1", "contents1").unwrap().write_by(&first_writer))
        .unwrap();
    let q2 = repo
        .save(&Question::new("title2", "contents2").unwrap().write_by(&second_writer))
        .unwrap();
    let mut q3 = repo
        .save(&Question::new("title3", "contents3").unwrap().write_by(&first_writer))
        .unwrap();
    q3.soft_delete();
    repo.save_and_flush(&q3).unwrap();

    let not_deleted = repo.find_by_deleted_false().unwrap();
    let ids: Vec<_> = not_deleted.iter().map(Question::id).collect();
    assert_eq!(ids, vec![q1.id(), q2.id()]);

    assert!(repo
        .find_by_id_and_deleted_false(q3.id().unwrap())
        .unwrap()
        .is_none());
    assert!(repo.get_one(q3.id().unwrap()).unwrap().is_deleted());
}

#[test]
fn dates_are_generated_on_save() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQuestionRepository::try_new(&conn).unwrap();

    let question = repo.get_one(insert_question(&conn).id().unwrap()).unwrap();
    assert!(question.created_at().is_some());
    assert!(question.updated_at().is_some());
}

#[test]
fn get_one_reports_missing_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQuestionRepository::try_new(&conn).unwrap();

    let err = repo.get_one(99).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: "question",
            id: 99
        }
    ));
}

#[test]
fn writer_must_exist_in_storage() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQuestionRepository::try_new(&conn).unwrap();

    let orphan = Question::new("title1", "contents1")
        .unwrap()
        .write_by(&javajigi());
    let err = repo.save(&orphan).unwrap_err();
    assert!(matches!(err, RepoError::UnknownWriter(1)));
}

#[test]
fn unattributed_question_can_be_saved() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQuestionRepository::try_new(&conn).unwrap();

    let saved = repo
        .save_and_flush(&Question::new("title1", "contents1").unwrap())
        .unwrap();
    assert_eq!(saved.writer_id(), None);
    assert!(saved.is_active());
}
