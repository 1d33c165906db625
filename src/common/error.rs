use thiserror::Error;

use super::types::{PageId, RecordId, TableId, TransactionId};
use crate::execution::AggregateOp;
use crate::tuple::Type;

/// Database error types
#[derive(Error, Debug)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Short read on page {page_no}: got {read} of {expected} bytes")]
    ShortRead {
        page_no: u32,
        read: usize,
        expected: usize,
    },

    #[error("Invalid page image for {0}")]
    InvalidPage(PageId),

    #[error("Tuple at {0} does not belong to this file")]
    ForeignTuple(RecordId),

    #[error("Tuple has no record id")]
    MissingRecordId,

    #[error("Slot {slot} on {page_id} is not occupied")]
    SlotNotOccupied { page_id: PageId, slot: u16 },

    #[error("Page {0} has no empty slot")]
    PageFull(PageId),

    #[error("Tuple schema does not match the page schema")]
    TupleSchemaMismatch,

    #[error("String of {len} bytes exceeds the maximum of {max}")]
    StringTooLong { len: usize, max: usize },

    #[error("Schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: String, found: String },

    #[error("No such element")]
    NoSuchElement,

    #[error("Operator is not open")]
    OperatorNotOpen,

    #[error("Field index {index} out of range for {len} fields")]
    FieldIndexOutOfRange { index: usize, len: usize },

    #[error("Field {0} is not set")]
    FieldNotSet(usize),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: Type, found: Type },

    #[error("Aggregate {op} is not supported over {field_type} fields")]
    IllegalAggregate { op: AggregateOp, field_type: Type },

    #[error("Aggregate result {0} does not fit an INT field")]
    AggregateOverflow(i64),

    #[error("Transaction {0} aborted")]
    TransactionAborted(TransactionId),

    #[error("Table {0} not found")]
    TableNotFound(TableId),

    #[error("Table named {0} not found")]
    TableNameNotFound(String),

    #[error("Buffer pool is full, no evictable pages available")]
    BufferPoolFull,

    #[error("Page size {actual} does not match configured page size {expected}")]
    PageSizeMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, DbError>;
