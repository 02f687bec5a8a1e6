mod common;

use neo_sqlite3::{End, ErrorCode, IterRows, IterTuples};

#[test]
fn test_begin_twice_skips_the_first_row() {
    let db = common::stuff_db();
    let mut st = db.prepare("SELECT column1 FROM stuff").expect("prepare");
    let mut rows = IterRows::new(&mut st);

    let first = rows.begin().expect("begin");
    assert_eq!(first.row().get(0).as_integer(), 1);

    // The second begin() steps again: row 1 is gone and row 2 is current.
    let mut second = rows.begin().expect("begin again");
    assert_eq!(second.row().get(0).as_integer(), 4);
    second.advance().expect("advance");
    assert_eq!(second.row().get(0).as_integer(), 7);
    second.advance().expect("advance");
    assert!(second == End);
}

#[test]
fn test_begin_twice_on_tuples_also_skips() {
    let db = common::stuff_db();
    let mut st = db
        .prepare("SELECT column3 FROM stuff ORDER BY column1")
        .expect("prepare");
    let mut tups = IterTuples::<(String,)>::new(&mut st);
    let _ = tups.begin().expect("begin");
    let it = tups.begin().expect("begin again");
    assert_eq!(it.get().0, "two");
}

#[test]
fn test_repeated_dereference_does_not_advance() {
    let db = common::stuff_db();
    let mut st = db.prepare("SELECT * FROM stuff").expect("prepare");
    let mut rows = IterRows::new(&mut st);
    let it = rows.begin().expect("begin");
    for _ in 0..7 {
        let (a, b, c): (i64, i64, String) = it.row().unpack();
        assert_eq!((a, b, c.as_str()), (1, 2, "one"));
    }
}

#[test]
fn test_exec_tuples_collects_all_rows() {
    let db = common::stuff_db();
    let mut st = db
        .prepare("SELECT column1, column3 FROM stuff WHERE column1 > ?")
        .expect("prepare");
    let got: Vec<(i64, String)> = st
        .exec_tuples::<(i64, String), _>(&(2,))
        .expect("exec")
        .collect::<neo_sqlite3::Result<_>>()
        .expect("rows");
    assert_eq!(got, [(4, "two".to_owned()), (7, "three".to_owned())]);

    // Re-executing rebinds from scratch.
    let again: Vec<(i64, String)> = st
        .exec_tuples::<(i64, String), _>(&(5,))
        .expect("exec")
        .collect::<neo_sqlite3::Result<_>>()
        .expect("rows");
    assert_eq!(again, [(7, "three".to_owned())]);
}

#[test]
fn test_exec_each_then_iterate() {
    let db = neo_sqlite3::Connection::open_in_memory().expect("open in-memory db");
    db.exec("CREATE TABLE foo (age, name, score)").expect("create");
    let people = vec![
        (24, String::from("Joe"), 6.3),
        (18, String::from("Amy"), 42.1),
        (99, String::from("George"), 0.2),
    ];
    let before = db.total_changes();
    let e = db
        .prepare("INSERT INTO foo VALUES (?, ?, ?)")
        .expect("prepare")
        .exec_each(&people);
    assert_eq!(e, ErrorCode::Done);
    assert_eq!(db.total_changes() - before, 3);

    let mut st = db
        .prepare("SELECT name FROM foo ORDER BY age")
        .expect("prepare");
    let mut rows = st.exec_rows(&()).expect("exec");
    let mut names = Vec::new();
    while let Some(row) = rows.next_row() {
        names.push(row.expect("row").get(0).as_text().into_owned());
    }
    assert_eq!(names, ["Amy", "Joe", "George"]);
}
