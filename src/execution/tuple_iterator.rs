use std::sync::Arc;

use super::{BoxedOperator, OpCursor, Operator};
use crate::common::Result;
use crate::tuple::{Tuple, TupleDesc};

/// Operator over an in-memory list of tuples.
pub struct TupleIterator {
    schema: Arc<TupleDesc>,
    tuples: Vec<Tuple>,
    /// Position of the next tuple to return
    index: usize,
    cursor: OpCursor,
}

impl TupleIterator {
    pub fn new(schema: Arc<TupleDesc>, tuples: Vec<Tuple>) -> Self {
        Self {
            schema,
            tuples,
            index: 0,
            cursor: OpCursor::new(),
        }
    }
}

impl Operator for TupleIterator {
    fn open(&mut self) -> Result<()> {
        self.index = 0;
        self.cursor.set_open(true);
        Ok(())
    }

    fn close(&mut self) {
        self.cursor.set_open(false);
    }

    fn rewind(&mut self) -> Result<()> {
        self.index = 0;
        self.cursor.clear();
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        let next = self.tuples.get(self.index).cloned();
        if next.is_some() {
            self.index += 1;
        }
        Ok(next)
    }

    fn schema(&self) -> &Arc<TupleDesc> {
        &self.schema
    }

    fn children(&self) -> Vec<&dyn Operator> {
        Vec::new()
    }

    fn set_children(&mut self, _children: Vec<BoxedOperator>) {}

    fn cursor(&self) -> &OpCursor {
        &self.cursor
    }

    fn cursor_mut(&mut self) -> &mut OpCursor {
        &mut self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::DbError;
    use crate::tuple::{Field, Type};

    fn source(values: &[i32]) -> TupleIterator {
        let desc = Arc::new(TupleDesc::from_types(&[Type::Int]));
        let tuples = values
            .iter()
            .map(|&v| Tuple::from_fields(Arc::clone(&desc), vec![Field::Int(v)]))
            .collect();
        TupleIterator::new(desc, tuples)
    }

    #[test]
    fn test_pull_before_open_fails() {
        let mut op = source(&[1]);
        assert!(matches!(op.has_next(), Err(DbError::OperatorNotOpen)));
    }

    #[test]
    fn test_has_next_is_idempotent() {
        let mut op = source(&[1, 2]);
        op.open().unwrap();
        assert!(op.has_next().unwrap());
        assert!(op.has_next().unwrap());
        assert_eq!(op.next().unwrap().field(0).unwrap(), &Field::Int(1));
        assert_eq!(op.next().unwrap().field(0).unwrap(), &Field::Int(2));
        assert!(!op.has_next().unwrap());
        assert!(matches!(op.next(), Err(DbError::NoSuchElement)));
    }

    #[test]
    fn test_rewind_drops_lookahead() {
        let mut op = source(&[1, 2]);
        op.open().unwrap();
        op.next().unwrap();
        assert!(op.has_next().unwrap());

        op.rewind().unwrap();
        assert_eq!(op.next().unwrap().field(0).unwrap(), &Field::Int(1));
    }

    #[test]
    fn test_close_then_reopen() {
        let mut op = source(&[5]);
        op.open().unwrap();
        op.next().unwrap();
        op.close();
        assert!(matches!(op.has_next(), Err(DbError::OperatorNotOpen)));

        op.open().unwrap();
        assert_eq!(op.next().unwrap().field(0).unwrap(), &Field::Int(5));
    }
}
