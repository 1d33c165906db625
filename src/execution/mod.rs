//! Pull-model query operators.

mod aggregate;
mod aggregator;
mod delete;
mod filter;
mod hash_equi_join;
mod insert;
mod integer_aggregator;
mod join;
mod nested_loop_join;
mod operator;
mod predicate;
mod seq_scan;
mod string_aggregator;
mod tuple_iterator;

pub use aggregate::Aggregate;
pub use aggregator::{AggregateOp, Aggregator, GroupKey};
pub use delete::Delete;
pub use filter::Filter;
pub use hash_equi_join::HashEquiJoin;
pub use insert::Insert;
pub use integer_aggregator::IntegerAggregator;
pub use join::Join;
pub use nested_loop_join::NestedLoopJoin;
pub use operator::{collect_tuples, BoxedOperator, OpCursor, Operator};
pub use predicate::{JoinPredicate, Op, Predicate};
pub use seq_scan::SeqScan;
pub use string_aggregator::StringAggregator;
pub use tuple_iterator::TupleIterator;
