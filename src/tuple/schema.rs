use std::fmt;
use std::sync::Arc;

use super::Type;
use crate::common::{DbError, Result};

/// A single typed, optionally named column of a tuple descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDesc {
    field_type: Type,
    name: Option<String>,
}

impl FieldDesc {
    pub fn new(field_type: Type, name: Option<String>) -> Self {
        Self { field_type, name }
    }

    pub fn named(field_type: Type, name: impl Into<String>) -> Self {
        Self::new(field_type, Some(name.into()))
    }

    pub fn unnamed(field_type: Type) -> Self {
        Self::new(field_type, None)
    }

    pub fn field_type(&self) -> Type {
        self.field_type
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for FieldDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.field_type, self.name.as_deref().unwrap_or("null"))
    }
}

/// Describes the shape of a tuple: an ordered, non-empty list of typed columns.
///
/// Descriptors are immutable once built and shared behind an `Arc`. Two
/// descriptors are equal when they have the same column types in the same
/// order; column names are ignored.
#[derive(Debug, Clone)]
pub struct TupleDesc {
    /// Ordered list of columns
    fields: Vec<FieldDesc>,

    /// Encoded size of one tuple in bytes
    size: usize,
}

impl TupleDesc {
    /// Creates a descriptor from a list of columns.
    ///
    /// # Panics
    /// Panics if `fields` is empty.
    pub fn new(fields: Vec<FieldDesc>) -> Self {
        assert!(!fields.is_empty(), "A tuple descriptor needs at least one field");
        let size = fields.iter().map(|f| f.field_type.width()).sum();
        Self { fields, size }
    }

    /// Creates a descriptor of unnamed columns.
    pub fn from_types(types: &[Type]) -> Self {
        Self::new(types.iter().map(|&t| FieldDesc::unnamed(t)).collect())
    }

    /// Creates a descriptor builder for fluent construction.
    pub fn builder() -> TupleDescBuilder {
        TupleDescBuilder::new()
    }

    /// Concatenates two descriptors, `d1`'s columns first.
    pub fn merge(d1: &TupleDesc, d2: &TupleDesc) -> TupleDesc {
        let mut fields = Vec::with_capacity(d1.num_fields() + d2.num_fields());
        fields.extend(d1.fields.iter().cloned());
        fields.extend(d2.fields.iter().cloned());
        TupleDesc::new(fields)
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Returns the column at the given index.
    pub fn field(&self, index: usize) -> Result<&FieldDesc> {
        self.fields.get(index).ok_or(DbError::FieldIndexOutOfRange {
            index,
            len: self.fields.len(),
        })
    }

    pub fn field_type(&self, index: usize) -> Result<Type> {
        self.field(index).map(FieldDesc::field_type)
    }

    pub fn field_name(&self, index: usize) -> Result<Option<&str>> {
        self.field(index).map(FieldDesc::name)
    }

    /// Returns the index of the first column with the given name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == Some(name))
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDesc> {
        self.fields.iter()
    }

    /// Returns the encoded size of one tuple in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns a copy of this descriptor with every column name prefixed by
    /// `alias.`; unnamed columns stay unnamed.
    pub fn qualified(&self, alias: &str) -> TupleDesc {
        let fields = self
            .fields
            .iter()
            .map(|f| FieldDesc::new(f.field_type, f.name.as_ref().map(|n| format!("{}.{}", alias, n))))
            .collect();
        TupleDesc::new(fields)
    }
}

impl PartialEq for TupleDesc {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.field_type == b.field_type)
    }
}

impl Eq for TupleDesc {}

impl fmt::Display for TupleDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}

/// Builder for constructing descriptors fluently.
pub struct TupleDescBuilder {
    fields: Vec<FieldDesc>,
}

impl TupleDescBuilder {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Adds a named column.
    pub fn field(mut self, name: impl Into<String>, field_type: Type) -> Self {
        self.fields.push(FieldDesc::named(field_type, name));
        self
    }

    /// Adds an unnamed column.
    pub fn unnamed(mut self, field_type: Type) -> Self {
        self.fields.push(FieldDesc::unnamed(field_type));
        self
    }

    pub fn build(self) -> TupleDesc {
        TupleDesc::new(self.fields)
    }

    /// Builds the descriptor wrapped in an Arc for shared ownership.
    pub fn build_arc(self) -> Arc<TupleDesc> {
        Arc::new(self.build())
    }
}

impl Default for TupleDescBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::STRING_LEN;

    fn create_test_desc() -> TupleDesc {
        TupleDesc::builder()
            .field("id", Type::Int)
            .field("name", Type::Str)
            .unnamed(Type::Int)
            .build()
    }

    #[test]
    fn test_desc_creation() {
        let desc = create_test_desc();

        assert_eq!(desc.num_fields(), 3);
        assert_eq!(desc.field_name(0).unwrap(), Some("id"));
        assert_eq!(desc.field_name(2).unwrap(), None);
        assert_eq!(desc.field_type(1).unwrap(), Type::Str);
        assert!(matches!(
            desc.field_type(3),
            Err(DbError::FieldIndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_size() {
        let desc = create_test_desc();
        assert_eq!(desc.size(), 4 + (4 + STRING_LEN) + 4);
    }

    #[test]
    fn test_field_index() {
        let desc = create_test_desc();
        assert_eq!(desc.field_index("name"), Some(1));
        assert_eq!(desc.field_index("missing"), None);
    }

    #[test]
    fn test_equality_ignores_names() {
        let a = TupleDesc::builder().field("x", Type::Int).field("y", Type::Str).build();
        let b = TupleDesc::from_types(&[Type::Int, Type::Str]);
        let c = TupleDesc::from_types(&[Type::Str, Type::Int]);
        let d = TupleDesc::from_types(&[Type::Int]);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_merge() {
        let d1 = create_test_desc();
        let d2 = TupleDesc::builder().field("score", Type::Int).field("tag", Type::Str).build();
        let merged = TupleDesc::merge(&d1, &d2);

        assert_eq!(merged.num_fields(), d1.num_fields() + d2.num_fields());
        for i in 0..d1.num_fields() {
            assert_eq!(merged.field(i).unwrap(), d1.field(i).unwrap());
        }
        for j in d1.num_fields()..merged.num_fields() {
            assert_eq!(merged.field(j).unwrap(), d2.field(j - d1.num_fields()).unwrap());
        }
        assert_eq!(merged.size(), d1.size() + d2.size());
    }

    #[test]
    fn test_qualified() {
        let desc = create_test_desc().qualified("t");
        assert_eq!(desc.field_name(0).unwrap(), Some("t.id"));
        assert_eq!(desc.field_name(2).unwrap(), None);
    }

    #[test]
    #[should_panic]
    fn test_empty_desc_panics() {
        TupleDesc::new(Vec::new());
    }

    #[test]
    fn test_display() {
        let desc = TupleDesc::builder().field("id", Type::Int).unnamed(Type::Str).build();
        assert_eq!(desc.to_string(), "INT(id), STRING(null)");
    }
}
