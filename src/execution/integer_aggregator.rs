use std::sync::Arc;

use super::aggregator::{result_row, result_schema, GroupTable};
use super::{AggregateOp, Aggregator, GroupKey, TupleIterator};
use crate::common::{DbError, Result};
use crate::tuple::{Tuple, TupleDesc, Type};

/// Running state of one group
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    /// Min, max or running sum depending on the operator
    value: i64,
    /// Number of tuples merged
    count: i64,
}

/// Aggregates an INT column with any `AggregateOp`.
///
/// Values are accumulated as `i64`. AVG is the sum divided by the count,
/// truncated toward zero, computed when the groups are read out.
pub struct IntegerAggregator {
    group_by: Option<(usize, Type)>,
    agg_field: usize,
    op: AggregateOp,
    groups: GroupTable<Accumulator>,
    schema: Arc<TupleDesc>,
}

impl IntegerAggregator {
    /// `group_by` is the grouping column and its type, or `None` for a
    /// single implicit group.
    pub fn new(group_by: Option<(usize, Type)>, agg_field: usize, op: AggregateOp) -> Self {
        Self {
            group_by,
            agg_field,
            op,
            groups: GroupTable::new(),
            schema: result_schema(group_by),
        }
    }

    fn is_reserved(&self) -> bool {
        matches!(self.op, AggregateOp::SumCount | AggregateOp::ScAvg)
    }

    fn finish(&self, acc: &Accumulator) -> i64 {
        match self.op {
            AggregateOp::Count => acc.count,
            AggregateOp::Avg => acc.value / acc.count,
            _ => acc.value,
        }
    }
}

impl Aggregator for IntegerAggregator {
    fn merge_tuple_into_group(&mut self, tuple: &Tuple) -> Result<()> {
        if self.is_reserved() {
            return Ok(());
        }

        let field = tuple.field(self.agg_field)?;
        let value = i64::from(field.as_int().ok_or(DbError::TypeMismatch {
            expected: Type::Int,
            found: field.field_type(),
        })?);

        let key = GroupKey::of(self.group_by, tuple)?;
        let (acc, is_new) = self.groups.entry(key, || Accumulator { value, count: 0 });
        acc.count += 1;
        if !is_new {
            acc.value = match self.op {
                AggregateOp::Min => acc.value.min(value),
                AggregateOp::Max => acc.value.max(value),
                AggregateOp::Sum | AggregateOp::Avg => acc.value + value,
                _ => acc.value,
            };
        }
        Ok(())
    }

    fn iterator(&self) -> Result<TupleIterator> {
        let mut rows = Vec::new();
        if !self.is_reserved() {
            for (key, acc) in self.groups.iter() {
                rows.push(result_row(&self.schema, key, self.finish(acc))?);
            }
            if self.groups.is_empty() && self.group_by.is_none() && self.op == AggregateOp::Count {
                rows.push(result_row(&self.schema, &GroupKey::Ungrouped, 0)?);
            }
        }
        Ok(TupleIterator::new(Arc::clone(&self.schema), rows))
    }

    fn schema(&self) -> &Arc<TupleDesc> {
        &self.schema
    }
}
