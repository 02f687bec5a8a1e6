mod common;

use neo_sqlite3::{
    with_transaction, Error, ErrorCode, ErrorCondition, RecursiveTransactionGuard,
    TransactionGuard,
};

fn insert(db: &neo_sqlite3::Connection, value: i64) {
    db.prepare("INSERT INTO t VALUES (?)")
        .expect("prepare")
        .exec(&(value,))
        .expect("insert");
}

#[test]
fn test_commit_is_visible_to_other_connections() {
    let file = common::TempDb::new();
    let writer = file.connect();
    writer.exec("CREATE TABLE t (x)").expect("create");
    let reader = file.connect();

    let tx = writer.transaction().expect("begin");
    insert(&writer, 1);
    assert_eq!(common::count(&reader, "t"), 0);
    tx.commit().expect("commit");
    assert_eq!(common::count(&reader, "t"), 1);
}

#[test]
fn test_nested_recursive_guards() {
    let db = neo_sqlite3::Connection::open_in_memory().expect("open in-memory db");
    db.exec("CREATE TABLE t (x)").expect("create");

    fn add_two(db: &neo_sqlite3::Connection) {
        let guard = RecursiveTransactionGuard::new(db).expect("guard");
        insert(db, 1);
        insert(db, 2);
        guard.commit().expect("commit");
    }

    // Standing alone, the helper owns its transaction.
    add_two(&db);
    assert!(!db.is_transaction_active());
    assert_eq!(common::count(&db, "t"), 2);

    // Nested in an outer transaction, it defers to it.
    {
        let outer = RecursiveTransactionGuard::new(&db).expect("outer");
        assert!(outer.is_top_transaction());
        add_two(&db);
        assert!(db.is_transaction_active());
        outer.rollback().expect("rollback");
    }
    assert_eq!(common::count(&db, "t"), 2);
}

#[test]
fn test_busy_writer_is_reported() {
    let file = common::TempDb::new();
    let first = file.connect();
    first.exec("CREATE TABLE t (x)").expect("create");
    let second = file.connect();

    let _lock = TransactionGuard::begin_with(&first, neo_sqlite3::TransactionBehavior::Exclusive)
        .expect("exclusive");
    let err = second.transaction_immediate().expect_err("locked");
    assert_eq!(err, ErrorCondition::Busy);
}

#[test]
fn test_with_transaction_rolls_back_on_error() {
    let db = neo_sqlite3::Connection::open_in_memory().expect("open in-memory db");
    db.exec("CREATE TABLE t (x UNIQUE)").expect("create");

    let result: Result<(), Error> = with_transaction(&db, |db| {
        db.exec("INSERT INTO t VALUES (1)").throw_if_error()?;
        db.exec("INSERT INTO t VALUES (1)").throw_if_error()?;
        Ok(())
    });
    let err = result.expect_err("duplicate");
    assert_eq!(err, ErrorCode::ConstraintUnique);
    assert!(err.to_string().contains("UNIQUE constraint failed"));
    assert!(!db.is_transaction_active());
    assert_eq!(common::count(&db, "t"), 0);
}
