use std::sync::Arc;

use crate::common::{DbError, Result};
use crate::tuple::{Tuple, TupleDesc};

/// Owned, type-erased operator
pub type BoxedOperator = Box<dyn Operator>;

/// Open flag and one-tuple lookahead shared by every operator.
///
/// `has_next` and `next` are implemented once on top of this state, so an
/// operator only has to produce tuples through `fetch_next`.
#[derive(Debug, Default)]
pub struct OpCursor {
    open: bool,
    peeked: Option<Tuple>,
}

impl OpCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Marks the operator open or closed. Closing drops the lookahead.
    pub fn set_open(&mut self, open: bool) {
        self.open = open;
        if !open {
            self.peeked = None;
        }
    }

    /// Drops the lookahead, as every rewind must.
    pub fn clear(&mut self) {
        self.peeked = None;
    }
}

/// A pull-model query execution node.
///
/// Callers drive an operator with `open`, then `has_next`/`next` until
/// `has_next` returns false, then `close`. `rewind` restarts the output from
/// the beginning without reopening.
pub trait Operator {
    /// Opens children and prepares state. Must be called before pulling.
    fn open(&mut self) -> Result<()>;

    /// Closes children and releases state. Reopening is allowed.
    fn close(&mut self);

    /// Restarts the output from the first tuple.
    fn rewind(&mut self) -> Result<()>;

    /// Produces the next tuple, or `None` at end of stream.
    fn fetch_next(&mut self) -> Result<Option<Tuple>>;

    /// Output schema.
    fn schema(&self) -> &Arc<TupleDesc>;

    fn children(&self) -> Vec<&dyn Operator>;

    /// Replaces the children. Operators take as many as they use, in order.
    fn set_children(&mut self, children: Vec<BoxedOperator>);

    fn cursor(&self) -> &OpCursor;

    fn cursor_mut(&mut self) -> &mut OpCursor;

    /// Returns true if `next` will yield a tuple.
    fn has_next(&mut self) -> Result<bool> {
        if !self.cursor().is_open() {
            return Err(DbError::OperatorNotOpen);
        }
        if self.cursor().peeked.is_none() {
            let next = self.fetch_next()?;
            self.cursor_mut().peeked = next;
        }
        Ok(self.cursor().peeked.is_some())
    }

    /// Returns the next tuple, or `NoSuchElement` at end of stream.
    fn next(&mut self) -> Result<Tuple> {
        if !self.has_next()? {
            return Err(DbError::NoSuchElement);
        }
        self.cursor_mut().peeked.take().ok_or(DbError::NoSuchElement)
    }
}

/// Drains an operator into a vector. The operator must already be open.
pub fn collect_tuples(op: &mut dyn Operator) -> Result<Vec<Tuple>> {
    let mut out = Vec::new();
    while op.has_next()? {
        out.push(op.next()?);
    }
    Ok(out)
}
