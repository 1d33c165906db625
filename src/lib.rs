//! Pagedb - heap-file page storage and iterator query execution in Rust
//!
//! Tables are stored as heap files: flat sequences of fixed-size pages, each
//! holding a slot bitmap followed by fixed-width tuple slots. Queries are
//! trees of pull-model operators that request tuples from their children
//! one at a time.
//!
//! # Architecture
//!
//! - **Tuples** (`tuple`): field types, values, schemas and rows
//!   - `TupleDesc`: ordered, typed, optionally named columns
//!   - `Tuple`: one row plus the record id it was read from
//!
//! - **Storage Layer** (`storage`): on-disk layout
//!   - `HeapPage`: slot bitmap + fixed-width slots
//!   - `HeapFile`: page I/O, free-slot search, restartable iteration
//!
//! - **Buffer Pool** (`buffer`): page cache keyed by page id
//!   - `BufferPool`: acquisition per transaction, dirty tracking, commit/abort
//!   - `PageGuard`: RAII hold on an acquired page
//!
//! - **Catalog** (`catalog`): table registry and the `Database` handle
//!
//! - **Execution** (`execution`): operators
//!   - `SeqScan`, `Filter`, `TupleIterator`
//!   - `Join` (nested loop or hash equi-join)
//!   - `Insert`, `Delete`
//!   - `Aggregate` with integer and string aggregators
//!
//! # Example
//!
//! ```rust,no_run
//! use pagedb::catalog::Database;
//! use pagedb::common::{DbConfig, TransactionId};
//! use pagedb::execution::{Aggregate, AggregateOp, Operator, SeqScan};
//! use pagedb::tuple::{Field, Tuple, TupleDesc, Type};
//!
//! let db = Database::new(DbConfig::default());
//! let schema = TupleDesc::builder()
//!     .field("id", Type::Int)
//!     .field("name", Type::Str)
//!     .build_arc();
//! let table = db.catalog().create_table("users", "users.dat", schema.clone()).unwrap();
//!
//! let tid = TransactionId::new();
//! for (id, name) in [(1, "ada"), (2, "grace")] {
//!     let row = Tuple::from_fields(schema.clone(), vec![Field::Int(id), Field::from(name)]);
//!     db.buffer_pool().insert_tuple(tid, table, row).unwrap();
//! }
//!
//! let scan = SeqScan::new(&db, tid, table, "u").unwrap();
//! let mut count = Aggregate::new(Box::new(scan), 0, None, AggregateOp::Count).unwrap();
//! count.open().unwrap();
//! println!("{}", count.next().unwrap());
//!
//! db.buffer_pool().transaction_complete(tid, true).unwrap();
//! ```

pub mod buffer;
pub mod catalog;
pub mod common;
pub mod execution;
pub mod storage;
pub mod tuple;

// Re-export commonly used types at the crate root
pub use common::{DbError, PageId, RecordId, Result, TableId, TransactionId};
