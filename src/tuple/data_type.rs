use std::fmt;

use crate::common::STRING_LEN;

/// Field types supported by the engine.
///
/// Every type has a fixed encoded width so that a tuple's on-page size is a
/// property of its schema alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    /// 32-bit signed integer: 4 bytes, little-endian
    Int,

    /// Variable-length string stored in a fixed-width cell:
    /// length (4 bytes) + STRING_LEN bytes of zero-padded data
    Str,
}

impl Type {
    /// Returns the number of bytes a field of this type occupies on a page.
    pub fn width(&self) -> usize {
        match self {
            Type::Int => 4,
            Type::Str => 4 + STRING_LEN,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "INT"),
            Type::Str => write!(f, "STRING"),
        }
    }
}
