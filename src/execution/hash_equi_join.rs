use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use log::debug;

use super::{BoxedOperator, JoinPredicate, OpCursor, Operator};
use crate::common::Result;
use crate::tuple::{Field, Tuple, TupleDesc};

/// Equality join that hashes the left child on `field1` and probes it with
/// each right tuple's `field2`.
///
/// The hash table is built on the first pull and survives `rewind`, which
/// only restarts the probe side. Output order is probe order, and within one
/// probe tuple the left tuples appear in their input order.
pub struct HashEquiJoin {
    predicate: JoinPredicate,
    left: BoxedOperator,
    right: BoxedOperator,
    schema: Arc<TupleDesc>,
    /// Left tuples keyed by their join value
    table: Option<HashMap<Field, Vec<Tuple>>>,
    /// Joined rows for the current probe tuple not yet returned
    pending: VecDeque<Tuple>,
    cursor: OpCursor,
}

impl HashEquiJoin {
    pub fn new(predicate: JoinPredicate, left: BoxedOperator, right: BoxedOperator) -> Self {
        let schema = Arc::new(TupleDesc::merge(left.schema(), right.schema()));
        Self {
            predicate,
            left,
            right,
            schema,
            table: None,
            pending: VecDeque::new(),
            cursor: OpCursor::new(),
        }
    }

    pub fn predicate(&self) -> &JoinPredicate {
        &self.predicate
    }

    fn build(&mut self) -> Result<HashMap<Field, Vec<Tuple>>> {
        let mut table: HashMap<Field, Vec<Tuple>> = HashMap::new();
        let mut count = 0usize;
        while self.left.has_next()? {
            let tuple = self.left.next()?;
            let key = tuple.field(self.predicate.field1())?.clone();
            table.entry(key).or_default().push(tuple);
            count += 1;
        }
        debug!("hash join built {} keys from {} tuples", table.len(), count);
        Ok(table)
    }
}

impl Operator for HashEquiJoin {
    fn open(&mut self) -> Result<()> {
        self.left.open()?;
        self.right.open()?;
        self.cursor.set_open(true);
        Ok(())
    }

    fn close(&mut self) {
        self.right.close();
        self.left.close();
        self.table = None;
        self.pending.clear();
        self.cursor.set_open(false);
    }

    fn rewind(&mut self) -> Result<()> {
        self.right.rewind()?;
        self.pending.clear();
        self.cursor.clear();
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        if self.table.is_none() {
            self.table = Some(self.build()?);
        }

        loop {
            if let Some(tuple) = self.pending.pop_front() {
                return Ok(Some(tuple));
            }
            if !self.right.has_next()? {
                return Ok(None);
            }

            let probe = self.right.next()?;
            let key = probe.field(self.predicate.field2())?;
            if let Some(matches) = self.table.as_ref().and_then(|t| t.get(key)) {
                self.pending
                    .extend(matches.iter().map(|left| Tuple::merge_join(left, &probe)));
            }
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
            self.table = None;
            self.pending.clear();
        }
    }

    fn cursor(&self) -> &OpCursor {
        &self.cursor
    }

    fn cursor_mut(&mut self) -> &mut OpCursor {
        &mut self.cursor
    }
}
