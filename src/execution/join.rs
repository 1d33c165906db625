use std::sync::Arc;

use log::debug;

use super::{BoxedOperator, HashEquiJoin, JoinPredicate, NestedLoopJoin, Op, OpCursor, Operator};
use crate::common::{DbError, Result};
use crate::tuple::{Tuple, TupleDesc};

/// Execution strategy picked once from the predicate's operator
enum JoinStrategy {
    NestedLoop(NestedLoopJoin),
    HashEqui(HashEquiJoin),
}

/// Join of two children on a `JoinPredicate`.
///
/// Equality predicates run as a hash equi-join; every other comparison runs
/// as a nested-loop join. Every operator call is forwarded to the chosen
/// strategy.
pub struct Join {
    predicate: JoinPredicate,
    strategy: JoinStrategy,
}

impl Join {
    pub fn new(predicate: JoinPredicate, left: BoxedOperator, right: BoxedOperator) -> Self {
        let strategy = match predicate.op() {
            Op::Equals => JoinStrategy::HashEqui(HashEquiJoin::new(predicate, left, right)),
            _ => JoinStrategy::NestedLoop(NestedLoopJoin::new(predicate, left, right)),
        };
        debug!(
            "join on f{} {} f{} uses {}",
            predicate.field1(),
            predicate.op(),
            predicate.field2(),
            match strategy {
                JoinStrategy::NestedLoop(_) => "nested loop",
                JoinStrategy::HashEqui(_) => "hash",
            }
        );
        Self { predicate, strategy }
    }

    pub fn join_predicate(&self) -> &JoinPredicate {
        &self.predicate
    }

    pub fn is_hash_join(&self) -> bool {
        matches!(self.strategy, JoinStrategy::HashEqui(_))
    }

    /// Name of the left join column as the left child reports it.
    pub fn join_field1_name(&self) -> Result<Option<&str>> {
        self.child_field_name(0, self.predicate.field1())
    }

    /// Name of the right join column as the right child reports it.
    pub fn join_field2_name(&self) -> Result<Option<&str>> {
        self.child_field_name(1, self.predicate.field2())
    }

    fn child_field_name(&self, child: usize, field: usize) -> Result<Option<&str>> {
        let children = self.children();
        let op = children
            .get(child)
            .copied()
            .ok_or(DbError::FieldIndexOutOfRange {
                index: child,
                len: children.len(),
            })?;
        op.schema().field_name(field)
    }

    fn inner(&self) -> &dyn Operator {
        match &self.strategy {
            JoinStrategy::NestedLoop(op) => op,
            JoinStrategy::HashEqui(op) => op,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Operator {
        match &mut self.strategy {
            JoinStrategy::NestedLoop(op) => op,
            JoinStrategy::HashEqui(op) => op,
        }
    }
}

impl Operator for Join {
    fn open(&mut self) -> Result<()> {
        self.inner_mut().open()
    }

    fn close(&mut self) {
        self.inner_mut().close()
    }

    fn rewind(&mut self) -> Result<()> {
        self.inner_mut().rewind()
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        self.inner_mut().fetch_next()
    }

    fn schema(&self) -> &Arc<TupleDesc> {
        self.inner().schema()
    }

    fn children(&self) -> Vec<&dyn Operator> {
        self.inner().children()
    }

    fn set_children(&mut self, children: Vec<BoxedOperator>) {
        self.inner_mut().set_children(children)
    }

    fn cursor(&self) -> &OpCursor {
        self.inner().cursor()
    }

    fn cursor_mut(&mut self) -> &mut OpCursor {
        self.inner_mut().cursor_mut()
    }
}
