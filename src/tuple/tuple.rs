use std::fmt;
use std::sync::Arc;

use bytes::{Buf, BufMut};

use super::{Field, TupleDesc};
use crate::common::{DbError, RecordId, Result};

/// Represents a single row bound to a tuple descriptor.
///
/// Field slots start out unset and are filled positionally. Tuples read from
/// a heap file carry the record id of the slot they came from; synthesized
/// tuples (join output, aggregate rows, mutation counts) carry none.
///
/// ## On-page format
///
/// ```text
/// +-----------+-----------+-----+-----------+
/// | field 0   | field 1   | ... | field n-1 |
/// +-----------+-----------+-----+-----------+
/// ```
///
/// Each field uses its type's fixed width, so the encoded size equals
/// `TupleDesc::size`.
#[derive(Debug, Clone)]
pub struct Tuple {
    /// The descriptor defining the structure of this tuple
    desc: Arc<TupleDesc>,

    /// One slot per column, in descriptor order
    fields: Vec<Option<Field>>,

    /// Location of this tuple on disk, if it was read from a heap file
    record_id: Option<RecordId>,
}

impl Tuple {
    /// Creates a tuple with every field unset.
    pub fn new(desc: Arc<TupleDesc>) -> Self {
        let fields = vec![None; desc.num_fields()];
        Self {
            desc,
            fields,
            record_id: None,
        }
    }

    /// Creates a tuple with all fields set.
    ///
    /// # Panics
    /// Panics if the number of values doesn't match the descriptor.
    pub fn from_fields(desc: Arc<TupleDesc>, values: Vec<Field>) -> Self {
        assert_eq!(
            values.len(),
            desc.num_fields(),
            "Value count must match descriptor field count"
        );
        Self {
            desc,
            fields: values.into_iter().map(Some).collect(),
            record_id: None,
        }
    }

    /// Returns the descriptor of this tuple.
    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    /// Returns the value at the given index.
    pub fn field(&self, index: usize) -> Result<&Field> {
        match self.fields.get(index) {
            Some(Some(field)) => Ok(field),
            Some(None) => Err(DbError::FieldNotSet(index)),
            None => Err(DbError::FieldIndexOutOfRange {
                index,
                len: self.fields.len(),
            }),
        }
    }

    /// Sets the value at the given index.
    pub fn set_field(&mut self, index: usize, value: Field) -> Result<()> {
        let len = self.fields.len();
        let slot = self
            .fields
            .get_mut(index)
            .ok_or(DbError::FieldIndexOutOfRange { index, len })?;
        *slot = Some(value);
        Ok(())
    }

    /// Returns every slot, set or not, in descriptor order.
    pub fn fields(&self) -> impl Iterator<Item = Option<&Field>> {
        self.fields.iter().map(Option::as_ref)
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, record_id: Option<RecordId>) {
        self.record_id = record_id;
    }

    /// Binds this tuple to a new descriptor, discarding every field value.
    pub fn reset_desc(&mut self, desc: Arc<TupleDesc>) {
        self.fields = vec![None; desc.num_fields()];
        self.desc = desc;
    }

    /// Swaps in a descriptor of the same shape, keeping values and record id.
    /// Used to attach column names such as a scan alias.
    pub fn relabel(&mut self, desc: Arc<TupleDesc>) {
        debug_assert!(*desc == *self.desc, "relabel requires an equal descriptor");
        self.desc = desc;
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Builds the concatenation of two tuples for join output.
    ///
    /// The result is bound to `merge(t1.desc, t2.desc)` and carries no record id.
    pub fn merge_join(t1: &Tuple, t2: &Tuple) -> Tuple {
        let desc = Arc::new(TupleDesc::merge(&t1.desc, &t2.desc));
        let fields = t1.fields.iter().chain(&t2.fields).cloned().collect();
        Tuple {
            desc,
            fields,
            record_id: None,
        }
    }

    /// Checks that this tuple can be stored in a page of the given descriptor:
    /// same shape, every field set, every value fits its column.
    pub fn check_storable(&self, desc: &TupleDesc) -> Result<()> {
        if *self.desc != *desc {
            return Err(DbError::TupleSchemaMismatch);
        }
        for (i, col) in desc.fields().enumerate() {
            self.field(i)?.check_storable(col.field_type())?;
        }
        Ok(())
    }

    /// Writes the fixed-width encoding of every field.
    pub fn serialize<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        for i in 0..self.fields.len() {
            self.field(i)?.serialize(buf)?;
        }
        Ok(())
    }

    /// Reads one tuple laid out according to `desc`.
    pub fn deserialize<B: Buf>(desc: Arc<TupleDesc>, buf: &mut B) -> Option<Self> {
        let mut values = Vec::with_capacity(desc.num_fields());
        for col in desc.fields() {
            values.push(Field::deserialize(col.field_type(), buf)?);
        }
        Some(Tuple::from_fields(desc, values))
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.desc == other.desc && self.fields == other.fields && self.record_id == other.record_id
    }
}

impl Eq for Tuple {}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            match field {
                Some(value) => write!(f, "{}", value)?,
                None => write!(f, "null")?,
            }
        }
        Ok(())
    }
}
