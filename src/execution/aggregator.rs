use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::TupleIterator;
use crate::common::{DbError, Result};
use crate::tuple::{Field, Tuple, TupleDesc, Type};

/// Aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
    /// Reserved; accepted but never produces output
    SumCount,
    /// Reserved; accepted but never produces output
    ScAvg,
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
            AggregateOp::Sum => "sum",
            AggregateOp::Avg => "avg",
            AggregateOp::Count => "count",
            AggregateOp::SumCount => "sum_count",
            AggregateOp::ScAvg => "sc_avg",
        };
        write!(f, "{}", s)
    }
}

/// Group a tuple belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// The single implicit group of an aggregate without GROUP BY
    Ungrouped,
    Grouped(Field),
}

impl GroupKey {
    /// Extracts the key of `tuple` for an optional `(field, type)` grouping.
    pub fn of(group_by: Option<(usize, Type)>, tuple: &Tuple) -> Result<Self> {
        match group_by {
            None => Ok(GroupKey::Ungrouped),
            Some((index, expected)) => {
                let value = tuple.field(index)?;
                if value.field_type() != expected {
                    return Err(DbError::TypeMismatch {
                        expected,
                        found: value.field_type(),
                    });
                }
                Ok(GroupKey::Grouped(value.clone()))
            }
        }
    }
}

/// Accumulates tuples into groups and reports one row per group.
///
/// Rows are `(aggregate)` without grouping and `(group, aggregate)` with it.
/// The aggregate column is always INT.
pub trait Aggregator {
    /// Folds one input tuple into its group.
    fn merge_tuple_into_group(&mut self, tuple: &Tuple) -> Result<()>;

    /// Returns an operator over the groups merged so far, in first-seen order.
    fn iterator(&self) -> Result<TupleIterator>;

    /// Schema of the rows produced by `iterator`.
    fn schema(&self) -> &Arc<TupleDesc>;
}

/// Builds the unnamed output schema for an aggregator.
pub(crate) fn result_schema(group_by: Option<(usize, Type)>) -> Arc<TupleDesc> {
    let types = match group_by {
        Some((_, group_type)) => vec![group_type, Type::Int],
        None => vec![Type::Int],
    };
    Arc::new(TupleDesc::from_types(&types))
}

/// Builds one output row, failing if the value does not fit an INT.
pub(crate) fn result_row(schema: &Arc<TupleDesc>, key: &GroupKey, value: i64) -> Result<Tuple> {
    let value = i32::try_from(value).map_err(|_| DbError::AggregateOverflow(value))?;
    let fields = match key {
        GroupKey::Ungrouped => vec![Field::Int(value)],
        GroupKey::Grouped(group) => vec![group.clone(), Field::Int(value)],
    };
    Ok(Tuple::from_fields(Arc::clone(schema), fields))
}

/// Per-group state kept in first-seen order.
#[derive(Debug)]
pub(crate) struct GroupTable<A> {
    index: HashMap<GroupKey, usize>,
    groups: Vec<(GroupKey, A)>,
}

impl<A> GroupTable<A> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }

    /// Returns the state for `key`, creating it with `init` on first sight.
    pub fn entry(&mut self, key: GroupKey, init: impl FnOnce() -> A) -> (&mut A, bool) {
        match self.index.get(&key) {
            Some(&i) => (&mut self.groups[i].1, false),
            None => {
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push((key, init()));
                let last = self.groups.len() - 1;
                (&mut self.groups[last].1, true)
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &A)> {
        self.groups.iter().map(|(k, a)| (k, a))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
