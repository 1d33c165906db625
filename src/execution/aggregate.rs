use std::sync::Arc;

use log::debug;

use super::{
    AggregateOp, Aggregator, BoxedOperator, IntegerAggregator, OpCursor, Operator,
    StringAggregator, TupleIterator,
};
use crate::common::{DbError, Result};
use crate::tuple::{FieldDesc, Tuple, TupleDesc, Type};

/// Computes one aggregate over a single column, optionally grouped by one
/// other column.
///
/// The whole child is drained into an aggregator on the first pull; groups
/// are then returned one per pull. The aggregate column is named
/// `op(column)`, and the group column keeps its input name and type.
pub struct Aggregate {
    child: BoxedOperator,
    agg_field: usize,
    group_field: Option<usize>,
    op: AggregateOp,
    schema: Arc<TupleDesc>,
    /// Finished groups; None until the first pull after open or rewind
    results: Option<TupleIterator>,
    cursor: OpCursor,
}

impl Aggregate {
    /// Fails with `IllegalAggregate` for a non-COUNT aggregate over a
    /// STRING column.
    pub fn new(
        child: BoxedOperator,
        agg_field: usize,
        group_field: Option<usize>,
        op: AggregateOp,
    ) -> Result<Self> {
        let schema = output_schema(child.schema(), agg_field, group_field, op)?;
        Ok(Self {
            child,
            agg_field,
            group_field,
            op,
            schema,
            results: None,
            cursor: OpCursor::new(),
        })
    }

    pub fn group_field(&self) -> Option<usize> {
        self.group_field
    }

    /// Name of the grouping column in the child's schema.
    pub fn group_field_name(&self) -> Option<&str> {
        let g = self.group_field?;
        self.child.schema().field_name(g).ok().flatten()
    }

    pub fn aggregate_field(&self) -> usize {
        self.agg_field
    }

    /// Name of the aggregated column in the child's schema.
    pub fn aggregate_field_name(&self) -> Option<&str> {
        self.child.schema().field_name(self.agg_field).ok().flatten()
    }

    pub fn aggregate_op(&self) -> AggregateOp {
        self.op
    }

    fn make_aggregator(&self) -> Result<Box<dyn Aggregator>> {
        let input = self.child.schema();
        let group_by = match self.group_field {
            Some(g) => Some((g, input.field_type(g)?)),
            None => None,
        };

        let aggregator: Box<dyn Aggregator> = match input.field_type(self.agg_field)? {
            Type::Int => Box::new(IntegerAggregator::new(group_by, self.agg_field, self.op)),
            Type::Str => Box::new(StringAggregator::new(group_by, self.agg_field, self.op)?),
        };
        Ok(aggregator)
    }

    fn compute(&mut self) -> Result<TupleIterator> {
        let mut aggregator = self.make_aggregator()?;
        let mut merged = 0usize;
        while self.child.has_next()? {
            aggregator.merge_tuple_into_group(&self.child.next()?)?;
            merged += 1;
        }
        debug!("{} aggregated {} tuples", self.schema, merged);

        let mut results = aggregator.iterator()?;
        results.open()?;
        Ok(results)
    }
}

/// Builds the `[group, op(column)]` output schema for an input schema,
/// rejecting a non-COUNT aggregate over a STRING column.
fn output_schema(
    input: &TupleDesc,
    agg_field: usize,
    group_field: Option<usize>,
    op: AggregateOp,
) -> Result<Arc<TupleDesc>> {
    let agg_type = input.field_type(agg_field)?;
    if agg_type == Type::Str && op != AggregateOp::Count {
        return Err(DbError::IllegalAggregate {
            op,
            field_type: agg_type,
        });
    }

    let agg_name = format!("{}({})", op, input.field_name(agg_field)?.unwrap_or("null"));
    let mut fields = Vec::with_capacity(2);
    if let Some(g) = group_field {
        fields.push(input.field(g)?.clone());
    }
    fields.push(FieldDesc::named(Type::Int, agg_name));
    Ok(Arc::new(TupleDesc::new(fields)))
}

impl Operator for Aggregate {
    fn open(&mut self) -> Result<()> {
        self.child.open()?;
        self.results = None;
        self.cursor.set_open(true);
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.results = None;
        self.cursor.set_open(false);
    }

    fn rewind(&mut self) -> Result<()> {
        self.child.rewind()?;
        self.results = None;
        self.cursor.clear();
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        if self.results.is_none() {
            self.results = Some(self.compute()?);
        }

        let Some(results) = self.results.as_mut() else {
            return Ok(None);
        };
        if !results.has_next()? {
            return Ok(None);
        }
        let mut tuple = results.next()?;
        tuple.relabel(Arc::clone(&self.schema));
        Ok(Some(tuple))
    }

    fn schema(&self) -> &Arc<TupleDesc> {
        &self.schema
    }

    fn children(&self) -> Vec<&dyn Operator> {
        vec![self.child.as_ref()]
    }

    /// A child this aggregate cannot be computed over is ignored.
    fn set_children(&mut self, children: Vec<BoxedOperator>) {
        let Some(child) = children.into_iter().next() else {
            return;
        };
        match output_schema(child.schema(), self.agg_field, self.group_field, self.op) {
            Ok(schema) => {
                self.child = child;
                self.schema = schema;
                self.results = None;
            }
            Err(e) => debug!("kept child of {}: {}", self.schema, e),
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
    use crate::execution::collect_tuples;
    use crate::tuple::Field;

    fn source(data: &[(&str, i32)]) -> BoxedOperator {
        let desc = TupleDesc::builder()
            .field("t.name", Type::Str)
            .field("t.n", Type::Int)
            .build_arc();
        let tuples = data
            .iter()
            .map(|&(s, v)| Tuple::from_fields(Arc::clone(&desc), vec![Field::from(s), Field::Int(v)]))
            .collect();
        Box::new(TupleIterator::new(desc, tuples))
    }

    fn render(op: &mut dyn Operator) -> Vec<String> {
        collect_tuples(op).unwrap().iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_output_schema_names() {
        let agg = Aggregate::new(source(&[]), 1, Some(0), AggregateOp::Sum).unwrap();
        assert_eq!(agg.schema().num_fields(), 2);
        assert_eq!(agg.schema().field_name(0).unwrap(), Some("t.name"));
        assert_eq!(agg.schema().field_type(0).unwrap(), Type::Str);
        assert_eq!(agg.schema().field_name(1).unwrap(), Some("sum(t.n)"));
        assert_eq!(agg.group_field_name(), Some("t.name"));
        assert_eq!(agg.aggregate_field_name(), Some("t.n"));
    }

    #[test]
    fn test_ungrouped_count() {
        let mut agg = Aggregate::new(source(&[("a", 1), ("b", 2), ("c", 3)]), 1, None, AggregateOp::Count).unwrap();
        assert_eq!(agg.schema().field_name(0).unwrap(), Some("count(t.n)"));
        agg.open().unwrap();
        assert_eq!(render(&mut agg), vec!["3"]);
    }

    #[test]
    fn test_grouped_avg() {
        let mut agg =
            Aggregate::new(source(&[("a", 4), ("b", 5), ("a", 6)]), 1, Some(0), AggregateOp::Avg).unwrap();
        agg.open().unwrap();
        assert_eq!(render(&mut agg), vec!["a\t5", "b\t5"]);
    }

    #[test]
    fn test_rewind_recomputes() {
        let mut agg = Aggregate::new(source(&[("a", 1), ("a", 2)]), 1, None, AggregateOp::Max).unwrap();
        agg.open().unwrap();
        assert_eq!(render(&mut agg), vec!["2"]);
        agg.rewind().unwrap();
        assert_eq!(render(&mut agg), vec!["2"]);
    }

    #[test]
    fn test_string_count_and_illegal_string_sum() {
        let mut count = Aggregate::new(source(&[("a", 1), ("b", 1)]), 0, Some(1), AggregateOp::Count).unwrap();
        count.open().unwrap();
        assert_eq!(render(&mut count), vec!["1\t2"]);

        assert!(matches!(
            Aggregate::new(source(&[]), 0, None, AggregateOp::Sum),
            Err(DbError::IllegalAggregate { .. })
        ));
    }

    #[test]
    fn test_set_children_rebuilds_schema() {
        let mut agg = Aggregate::new(source(&[("a", 1)]), 1, Some(0), AggregateOp::Sum).unwrap();
        assert_eq!(agg.schema().field_type(0).unwrap(), Type::Str);

        let desc = TupleDesc::builder()
            .field("u.g", Type::Int)
            .field("u.n", Type::Int)
            .build_arc();
        let tuples = [(7, 2), (7, 3)]
            .iter()
            .map(|&(g, v)| Tuple::from_fields(Arc::clone(&desc), vec![Field::Int(g), Field::Int(v)]))
            .collect();
        agg.set_children(vec![Box::new(TupleIterator::new(desc, tuples))]);

        assert_eq!(agg.schema().field_type(0).unwrap(), Type::Int);
        assert_eq!(agg.schema().field_name(0).unwrap(), Some("u.g"));
        assert_eq!(agg.schema().field_name(1).unwrap(), Some("sum(u.n)"));
        agg.open().unwrap();
        assert_eq!(render(&mut agg), vec!["7\t5"]);
    }

    #[test]
    fn test_set_children_ignores_unaggregatable_child() {
        let mut agg = Aggregate::new(source(&[("a", 1), ("a", 2)]), 1, Some(0), AggregateOp::Sum).unwrap();

        // Column 1 is STRING here, which SUM cannot aggregate
        let desc = TupleDesc::builder()
            .field("u.n", Type::Int)
            .field("u.name", Type::Str)
            .build_arc();
        agg.set_children(vec![Box::new(TupleIterator::new(desc, Vec::new()))]);

        assert_eq!(agg.schema().field_name(1).unwrap(), Some("sum(t.n)"));
        agg.open().unwrap();
        assert_eq!(render(&mut agg), vec!["a\t3"]);
    }
}
