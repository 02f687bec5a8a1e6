mod common;

use neo_sqlite3::{Connection, Error, ErrorCode, ErrorCondition, OpenMode};
use test_case::test_case;

#[test_case("CREATE TABLE t (x NOT NULL); INSERT INTO t VALUES (NULL)", ErrorCode::ConstraintNotNull ; "not null")]
#[test_case("CREATE TABLE t (x UNIQUE); INSERT INTO t VALUES (1), (1)", ErrorCode::ConstraintUnique ; "unique")]
#[test_case("CREATE TABLE t (x CHECK (x > 0)); INSERT INTO t VALUES (0)", ErrorCode::ConstraintCheck ; "check")]
#[test_case("SELECT * FROM missing", ErrorCode::Error ; "no such table")]
fn test_exec_failures_carry_extended_codes(sql: &str, expected: ErrorCode) {
    let db = Connection::open_in_memory().expect("open in-memory db");
    let e = db.exec(sql);
    assert!(e.is_error());
    assert_eq!(e.code(), expected);
    assert_eq!(e, expected.condition());

    let err = e.throw_if_error().expect_err("error");
    assert_eq!(err, expected);
    assert_eq!(err.context(), "sqlite3_exec() failed");
    assert!(!err.db_message().is_empty());
}

#[test]
fn test_error_display() {
    let db = Connection::open_in_memory().expect("open in-memory db");
    let err = db
        .prepare("SELEKT 1")
        .throw_if_error()
        .expect_err("syntax error");
    assert_eq!(
        err.to_string(),
        "Failure while preparing database statement: near \"SELEKT\": syntax error [error (1)]"
    );
}

#[test]
fn test_read_only_connection_rejects_writes() {
    let file = common::TempDb::new();
    file.connect().exec("CREATE TABLE t (x)").expect("create");

    let ro = Connection::open_with_mode(file.path(), OpenMode::READ_ONLY).expect("open ro");
    assert!(ro.is_readonly());
    let err = ro
        .exec("INSERT INTO t VALUES (1)")
        .throw_if_error()
        .expect_err("read-only");
    assert_eq!(err, ErrorCondition::ReadOnly);
}

#[test]
fn test_missing_file_without_create() {
    let file = common::TempDb::new();
    let e = Connection::open_with_mode(file.path(), OpenMode::READ_WRITE);
    assert_eq!(e, ErrorCode::CantOpen);
    let err: Error = e.throw_if_error().expect_err("cannot open");
    assert!(err.context().starts_with("Failed to open SQLite connection"));
}
