use std::sync::Arc;

use super::{BoxedOperator, JoinPredicate, OpCursor, Operator};
use crate::common::Result;
use crate::tuple::{Tuple, TupleDesc};

/// Joins two children by testing the predicate on every (left, right) pair.
///
/// The current left tuple is held across calls. The right child is scanned
/// from its cursor until a match is found or it runs out; when it runs out
/// it is rewound and the next left tuple is taken.
pub struct NestedLoopJoin {
    predicate: JoinPredicate,
    left: BoxedOperator,
    right: BoxedOperator,
    schema: Arc<TupleDesc>,
    /// Left tuple being matched against the right child
    current_left: Option<Tuple>,
    cursor: OpCursor,
}

impl NestedLoopJoin {
    pub fn new(predicate: JoinPredicate, left: BoxedOperator, right: BoxedOperator) -> Self {
        let schema = Arc::new(TupleDesc::merge(left.schema(), right.schema()));
        Self {
            predicate,
            left,
            right,
            schema,
            current_left: None,
            cursor: OpCursor::new(),
        }
    }

    pub fn predicate(&self) -> &JoinPredicate {
        &self.predicate
    }
}

impl Operator for NestedLoopJoin {
    fn open(&mut self) -> Result<()> {
        self.left.open()?;
        self.right.open()?;
        self.current_left = None;
        self.cursor.set_open(true);
        Ok(())
    }

    fn close(&mut self) {
        self.right.close();
        self.left.close();
        self.current_left = None;
        self.cursor.set_open(false);
    }

    fn rewind(&mut self) -> Result<()> {
        self.left.rewind()?;
        self.right.rewind()?;
        self.current_left = None;
        self.cursor.clear();
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        loop {
            if self.current_left.is_none() {
                if !self.left.has_next()? {
                    return Ok(None);
                }
                self.current_left = Some(self.left.next()?);
            }

            if let Some(left) = self.current_left.as_ref() {
                while self.right.has_next()? {
                    let right = self.right.next()?;
                    if self.predicate.filter(left, &right)? {
                        return Ok(Some(Tuple::merge_join(left, &right)));
                    }
                }
            }

            self.right.rewind()?;
            self.current_left = None;
        }
    }

    fn schema(&self) -> &Arc<TupleDesc> {
        &self.schema
    }

    fn children(&self) -> Vec<&dyn Operator> {
        vec![self.left.as_ref(), self.right.as_ref()]
    }

    fn set_children(&mut self, children: Vec<BoxedOperator>) {
        let mut children = children.into_iter();
        if let (Some(left), Some(right)) = (children.next(), children.next()) {
            self.schema = Arc::new(TupleDesc::merge(left.schema(), right.schema()));
            self.left = left;
            self.right = right;
            self.current_left = None;
        }
    }

    fn cursor(&self) -> &OpCursor {
        &self.cursor
    }

    fn cursor_mut(&mut self) -> &mut OpCursor {
        &mut self.cursor
    }
}
