use std::sync::Arc;

use super::aggregator::{result_row, result_schema, GroupTable};
use super::{AggregateOp, Aggregator, GroupKey, TupleIterator};
use crate::common::{DbError, Result};
use crate::tuple::{Tuple, TupleDesc, Type};

/// Aggregates a STRING column. Only COUNT is supported.
pub struct StringAggregator {
    group_by: Option<(usize, Type)>,
    agg_field: usize,
    counts: GroupTable<i64>,
    schema: Arc<TupleDesc>,
}

impl StringAggregator {
    /// Fails with `IllegalAggregate` for any operator other than COUNT.
    pub fn new(group_by: Option<(usize, Type)>, agg_field: usize, op: AggregateOp) -> Result<Self> {
        if op != AggregateOp::Count {
            return Err(DbError::IllegalAggregate {
                op,
                field_type: Type::Str,
            });
        }
        Ok(Self {
            group_by,
            agg_field,
            counts: GroupTable::new(),
            schema: result_schema(group_by),
        })
    }
}

impl Aggregator for StringAggregator {
    fn merge_tuple_into_group(&mut self, tuple: &Tuple) -> Result<()> {
        tuple.field(self.agg_field)?;
        let key = GroupKey::of(self.group_by, tuple)?;
        let (count, _) = self.counts.entry(key, || 0);
        *count += 1;
        Ok(())
    }

    fn iterator(&self) -> Result<TupleIterator> {
        let mut rows = self
            .counts
            .iter()
            .map(|(key, &count)| result_row(&self.schema, key, count))
            .collect::<Result<Vec<_>>>()?;
        if rows.is_empty() && self.group_by.is_none() {
            rows.push(result_row(&self.schema, &GroupKey::Ungrouped, 0)?);
        }
        Ok(TupleIterator::new(Arc::clone(&self.schema), rows))
    }

    fn schema(&self) -> &Arc<TupleDesc> {
        &self.schema
    }
}
