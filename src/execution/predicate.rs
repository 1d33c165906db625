use std::cmp::Ordering;
use std::fmt;

use crate::common::Result;
use crate::tuple::{Field, Tuple};

/// Comparison operators usable in predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEq,
    LessThan,
    LessThanOrEq,
    /// Substring match for strings, equality for integers
    Like,
}

impl Op {
    /// Returns whether an ordering between two values satisfies this operator.
    ///
    /// `Like` is treated as equality here; string containment is handled by
    /// `Field::compare`.
    pub fn matches(&self, ordering: Ordering) -> bool {
        match self {
            Op::Equals | Op::Like => ordering == Ordering::Equal,
            Op::NotEquals => ordering != Ordering::Equal,
            Op::GreaterThan => ordering == Ordering::Greater,
            Op::GreaterThanOrEq => ordering != Ordering::Less,
            Op::LessThan => ordering == Ordering::Less,
            Op::LessThanOrEq => ordering != Ordering::Greater,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Op::Equals => "=",
            Op::NotEquals => "<>",
            Op::GreaterThan => ">",
            Op::GreaterThanOrEq => ">=",
            Op::LessThan => "<",
            Op::LessThanOrEq => "<=",
            Op::Like => "LIKE",
        };
        write!(f, "{}", s)
    }
}

/// Compares one field of a tuple against a constant operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    field: usize,
    op: Op,
    operand: Field,
}

impl Predicate {
    pub fn new(field: usize, op: Op, operand: impl Into<Field>) -> Self {
        Self {
            field,
            op,
            operand: operand.into(),
        }
    }

    pub fn field(&self) -> usize {
        self.field
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn operand(&self) -> &Field {
        &self.operand
    }

    /// Evaluates `tuple[field] <op> operand`.
    pub fn filter(&self, tuple: &Tuple) -> Result<bool> {
        Ok(tuple.field(self.field)?.compare(self.op, &self.operand))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{} {} {}", self.field, self.op, self.operand)
    }
}

/// Compares a field of a left tuple with a field of a right tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinPredicate {
    field1: usize,
    op: Op,
    field2: usize,
}

impl JoinPredicate {
    pub fn new(field1: usize, op: Op, field2: usize) -> Self {
        Self { field1, op, field2 }
    }

    pub fn field1(&self) -> usize {
        self.field1
    }

    pub fn field2(&self) -> usize {
        self.field2
    }

    pub fn op(&self) -> Op {
        self.op
    }

    /// Evaluates `t1[field1] <op> t2[field2]`.
    pub fn filter(&self, t1: &Tuple, t2: &Tuple) -> Result<bool> {
        Ok(t1.field(self.field1)?.compare(self.op, t2.field(self.field2)?))
    }
}
