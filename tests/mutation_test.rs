//! Integration tests for the insert and delete operators

use std::sync::Arc;

use pagedb::catalog::Database;
use pagedb::common::{DbConfig, DbError, TableId, TransactionId};
use pagedb::execution::{
    collect_tuples, Delete, Filter, Insert, Op, Operator, Predicate, SeqScan, TupleIterator,
};
use pagedb::tuple::{Field, Tuple, TupleDesc, Type};
use tempfile::TempDir;

fn setup() -> (Database, TableId, TempDir) {
    let dir = TempDir::new().unwrap();
    let db = Database::new(DbConfig::new().with_page_size(128));
    let schema = TupleDesc::builder()
        .field("k", Type::Int)
        .field("v", Type::Int)
        .build_arc();
    let table = db.catalog().create_table("kv", dir.path().join("kv.dat"), schema).unwrap();
    (db, table, dir)
}

fn source(rows: &[(i32, i32)]) -> Box<TupleIterator> {
    let desc = Arc::new(TupleDesc::from_types(&[Type::Int, Type::Int]));
    let tuples = rows
        .iter()
        .map(|&(k, v)| Tuple::from_fields(Arc::clone(&desc), vec![Field::Int(k), Field::Int(v)]))
        .collect();
    Box::new(TupleIterator::new(desc, tuples))
}

fn table_rows(db: &Database, table: TableId, tid: TransactionId) -> Vec<String> {
    let mut scan = SeqScan::new(db, tid, table, "kv").unwrap();
    scan.open().unwrap();
    collect_tuples(&mut scan)
        .unwrap()
        .iter()
        .map(|t| t.to_string())
        .collect()
}

#[test]
fn test_insert_returns_count_once() {
    let (db, table, _dir) = setup();
    let tid = TransactionId::new();
    let rows: Vec<(i32, i32)> = (0..20).map(|i| (i, i * i)).collect();

    let mut insert = Insert::new(tid, source(&rows), table, &db).unwrap();
    assert_eq!(insert.schema().num_fields(), 1);
    assert_eq!(insert.schema().field_type(0).unwrap(), Type::Int);

    insert.open().unwrap();
    assert!(insert.has_next().unwrap());
    assert_eq!(insert.next().unwrap().field(0).unwrap(), &Field::Int(20));
    assert!(!insert.has_next().unwrap());
    assert!(!insert.has_next().unwrap());
    assert!(matches!(insert.next(), Err(DbError::NoSuchElement)));

    assert_eq!(table_rows(&db, table, tid).len(), 20);
    // 8-byte tuples, 15 per 128-byte page
    assert_eq!(db.catalog().file(table).unwrap().num_pages().unwrap(), 2);
}

#[test]
fn test_insert_rewind_repeats_the_drain() {
    let (db, table, _dir) = setup();
    let tid = TransactionId::new();

    let mut insert = Insert::new(tid, source(&[(1, 1), (2, 2), (3, 3)]), table, &db).unwrap();
    insert.open().unwrap();
    assert_eq!(insert.next().unwrap().to_string(), "3");
    assert!(!insert.has_next().unwrap());

    insert.rewind().unwrap();
    assert_eq!(insert.next().unwrap().to_string(), "3");
    assert!(!insert.has_next().unwrap());

    assert_eq!(table_rows(&db, table, tid).len(), 6);
}

#[test]
fn test_insert_schema_mismatch() {
    let (db, table, _dir) = setup();
    let desc = Arc::new(TupleDesc::from_types(&[Type::Int, Type::Str]));
    let child = Box::new(TupleIterator::new(desc, Vec::new()));

    assert!(matches!(
        Insert::new(TransactionId::new(), child, table, &db),
        Err(DbError::SchemaMismatch { .. })
    ));
}

#[test]
fn test_insert_from_scan_of_another_table() {
    let (db, table, dir) = setup();
    let tid = TransactionId::new();
    let mut insert = Insert::new(tid, source(&[(1, 10), (2, 20)]), table, &db).unwrap();
    insert.open().unwrap();
    insert.next().unwrap();

    let copy = db
        .catalog()
        .create_table("copy", dir.path().join("copy.dat"), db.catalog().schema(table).unwrap())
        .unwrap();
    let scan = SeqScan::new(&db, tid, table, "kv").unwrap();
    let mut insert = Insert::new(tid, Box::new(scan), copy, &db).unwrap();
    insert.open().unwrap();
    assert_eq!(insert.next().unwrap().to_string(), "2");

    assert_eq!(table_rows(&db, copy, tid), vec!["1\t10", "2\t20"]);
}

#[test]
fn test_delete_returns_count_once() {
    let (db, table, _dir) = setup();
    let tid = TransactionId::new();
    let rows: Vec<(i32, i32)> = (0..10).map(|i| (i, i % 2)).collect();
    let mut insert = Insert::new(tid, source(&rows), table, &db).unwrap();
    insert.open().unwrap();
    insert.next().unwrap();

    let scan = SeqScan::new(&db, tid, table, "kv").unwrap();
    let odd = Filter::new(Predicate::new(1, Op::Equals, 1), Box::new(scan));
    let mut delete = Delete::new(tid, Box::new(odd), &db);
    delete.open().unwrap();
    assert_eq!(delete.next().unwrap().to_string(), "5");
    assert!(!delete.has_next().unwrap());

    assert_eq!(
        table_rows(&db, table, tid),
        vec!["0\t0", "2\t0", "4\t0", "6\t0", "8\t0"]
    );

    // Nothing odd is left, so a second cycle deletes nothing
    delete.rewind().unwrap();
    assert_eq!(delete.next().unwrap().to_string(), "0");
    assert!(!delete.has_next().unwrap());
}

#[test]
fn test_delete_of_unstored_tuple_fails() {
    let (db, _table, _dir) = setup();
    let mut delete = Delete::new(TransactionId::new(), source(&[(1, 1)]), &db);
    delete.open().unwrap();
    assert!(matches!(delete.next(), Err(DbError::MissingRecordId)));
}
