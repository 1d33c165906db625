use std::fmt;

use bytes::{Buf, BufMut};

use super::Type;
use crate::common::{DbError, Result, STRING_LEN};
use crate::execution::Op;

/// A typed value stored in one tuple slot.
///
/// Equality and hashing are by type and value, which is what group keys and
/// hash-join buckets rely on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    /// 32-bit signed integer
    Int(i32),

    /// String of at most STRING_LEN bytes
    Str(String),
}

impl Field {
    /// Returns the declared type of this value.
    pub fn field_type(&self) -> Type {
        match self {
            Field::Int(_) => Type::Int,
            Field::Str(_) => Type::Str,
        }
    }

    /// Returns the integer payload, if this is an integer field.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Field::Int(v) => Some(*v),
            Field::Str(_) => None,
        }
    }

    /// Returns the string payload, if this is a string field.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::Str(s) => Some(s),
            Field::Int(_) => None,
        }
    }

    /// Checks that this value can be stored in a cell of the given type.
    pub fn check_storable(&self, expected: Type) -> Result<()> {
        if self.field_type() != expected {
            return Err(DbError::TypeMismatch {
                expected,
                found: self.field_type(),
            });
        }
        if let Field::Str(s) = self {
            if s.len() > STRING_LEN {
                return Err(DbError::StringTooLong {
                    len: s.len(),
                    max: STRING_LEN,
                });
            }
        }
        Ok(())
    }

    /// Writes the fixed-width encoding of this value.
    pub fn serialize<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        match self {
            Field::Int(v) => buf.put_i32_le(*v),
            Field::Str(s) => {
                let bytes = s.as_bytes();
                if bytes.len() > STRING_LEN {
                    return Err(DbError::StringTooLong {
                        len: bytes.len(),
                        max: STRING_LEN,
                    });
                }
                buf.put_u32_le(bytes.len() as u32);
                buf.put_slice(bytes);
                buf.put_bytes(0, STRING_LEN - bytes.len());
            }
        }
        Ok(())
    }

    /// Reads one value of the given type.
    /// Returns None if the buffer is too short or the cell is malformed.
    pub fn deserialize<B: Buf>(field_type: Type, buf: &mut B) -> Option<Self> {
        if buf.remaining() < field_type.width() {
            return None;
        }

        match field_type {
            Type::Int => Some(Field::Int(buf.get_i32_le())),
            Type::Str => {
                let len = buf.get_u32_le() as usize;
                if len > STRING_LEN {
                    return None;
                }
                let mut data = vec![0u8; STRING_LEN];
                buf.copy_to_slice(&mut data);
                data.truncate(len);
                String::from_utf8(data).ok().map(Field::Str)
            }
        }
    }

    /// Evaluates `self <op> other`.
    ///
    /// Values of different types never satisfy any comparison.
    pub fn compare(&self, op: Op, other: &Field) -> bool {
        match (self, other) {
            (Field::Int(a), Field::Int(b)) => match op {
                Op::Like => a == b,
                _ => op.matches(a.cmp(b)),
            },
            (Field::Str(a), Field::Str(b)) => match op {
                Op::Like => a.contains(b.as_str()),
                _ => op.matches(a.as_str().cmp(b.as_str())),
            },
            _ => false,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i32> for Field {
    fn from(v: i32) -> Self {
        Field::Int(v)
    }
}

impl From<String> for Field {
    fn from(v: String) -> Self {
        Field::Str(v)
    }
}

impl From<&str> for Field {
    fn from(v: &str) -> Self {
        Field::Str(v.to_string())
    }
}
