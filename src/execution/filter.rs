use std::sync::Arc;

use super::{BoxedOperator, OpCursor, Operator, Predicate};
use crate::common::Result;
use crate::tuple::{Tuple, TupleDesc};

/// Passes through the child tuples that satisfy a predicate.
pub struct Filter {
    predicate: Predicate,
    child: BoxedOperator,
    cursor: OpCursor,
}

impl Filter {
    pub fn new(predicate: Predicate, child: BoxedOperator) -> Self {
        Self {
            predicate,
            child,
            cursor: OpCursor::new(),
        }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

impl Operator for Filter {
    fn open(&mut self) -> Result<()> {
        self.child.open()?;
        self.cursor.set_open(true);
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.cursor.set_open(false);
    }

    fn rewind(&mut self) -> Result<()> {
        self.child.rewind()?;
        self.cursor.clear();
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            if self.predicate.filter(&tuple)? {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }

    fn schema(&self) -> &Arc<TupleDesc> {
        self.child.schema()
    }

    fn children(&self) -> Vec<&dyn Operator> {
        vec![self.child.as_ref()]
    }

    fn set_children(&mut self, children: Vec<BoxedOperator>) {
        if let Some(child) = children.into_iter().next() {
            self.child = child;
        }
    }

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
    use crate::execution::{collect_tuples, Op, TupleIterator};
    use crate::tuple::{Field, Type};

    #[test]
    fn test_filter_keeps_matching_rows() {
        let desc = Arc::new(TupleDesc::from_types(&[Type::Int]));
        let rows = (0..10)
            .map(|v| Tuple::from_fields(Arc::clone(&desc), vec![Field::Int(v)]))
            .collect();
        let child = Box::new(TupleIterator::new(desc, rows));

        let mut filter = Filter::new(Predicate::new(0, Op::GreaterThanOrEq, 7), child);
        filter.open().unwrap();
        let out: Vec<String> = collect_tuples(&mut filter)
            .unwrap()
            .iter()
            .map(|t| t.to_string())
            .collect();
        assert_eq!(out, vec!["7", "8", "9"]);

        filter.rewind().unwrap();
        assert_eq!(collect_tuples(&mut filter).unwrap().len(), 3);
    }
}
