use std::sync::Arc;

use bytes::{Buf, BufMut, BytesMut};

use crate::common::{DbError, PageId, RecordId, Result, SlotId, TransactionId};
use crate::tuple::{Tuple, TupleDesc};

/// Heap page layout:
///
/// +------------------+
/// | Slot Bitmap      |  ceil(num_slots / 8) bytes
/// +------------------+
/// | [slot 0]         |  tuple_size bytes each
/// | [slot 1]         |
/// | ...              |
/// +------------------+
/// | Zero padding     |
/// +------------------+
///
/// Slot `i` is occupied when bit `i % 8` of bitmap byte `i / 8` is set.
/// Every slot is exactly `TupleDesc::size` bytes wide, so
/// `num_slots = floor(page_size * 8 / (tuple_size * 8 + 1))`.
#[derive(Debug, Clone)]
pub struct HeapPage {
    pid: PageId,
    desc: Arc<TupleDesc>,
    page_size: usize,
    /// Occupancy bitmap
    header: Vec<u8>,
    /// Decoded tuples, one entry per slot
    tuples: Vec<Option<Tuple>>,
    /// Transaction that last dirtied this page
    dirtied_by: Option<TransactionId>,
}

impl HeapPage {
    /// Returns how many tuples of `tuple_size` bytes fit on one page.
    pub fn slots_per_page(page_size: usize, tuple_size: usize) -> usize {
        (page_size * 8) / (tuple_size * 8 + 1)
    }

    /// Returns the bitmap size in bytes for the given slot count.
    pub fn header_size(num_slots: usize) -> usize {
        (num_slots + 7) / 8
    }

    /// Returns the image of a page with every slot free.
    pub fn empty_page_data(page_size: usize) -> Vec<u8> {
        vec![0u8; page_size]
    }

    /// Decodes a page image.
    pub fn new(pid: PageId, desc: Arc<TupleDesc>, data: &[u8]) -> Result<Self> {
        let page_size = data.len();
        let tuple_size = desc.size();
        let num_slots = Self::slots_per_page(page_size, tuple_size);
        let header_size = Self::header_size(num_slots);

        let mut buf = data;
        let header = buf[..header_size].to_vec();
        buf.advance(header_size);

        let mut tuples = Vec::with_capacity(num_slots);
        for slot in 0..num_slots {
            if bit_is_set(&header, slot) {
                let mut tuple = Tuple::deserialize(Arc::clone(&desc), &mut buf)
                    .ok_or(DbError::InvalidPage(pid))?;
                tuple.set_record_id(Some(RecordId::new(pid, slot_id(pid, slot)?)));
                tuples.push(Some(tuple));
            } else {
                buf.advance(tuple_size);
                tuples.push(None);
            }
        }

        Ok(Self {
            pid,
            desc,
            page_size,
            header,
            tuples,
            dirtied_by: None,
        })
    }

    /// Creates an in-memory page with every slot free.
    pub fn empty(pid: PageId, desc: Arc<TupleDesc>, page_size: usize) -> Result<Self> {
        Self::new(pid, desc, &Self::empty_page_data(page_size))
    }

    /// Encodes this page into a `page_size` byte image.
    pub fn page_data(&self) -> Result<Vec<u8>> {
        let tuple_size = self.desc.size();
        let mut buf = BytesMut::with_capacity(self.page_size);

        buf.put_slice(&self.header);
        for slot in &self.tuples {
            match slot {
                Some(tuple) => tuple.serialize(&mut buf)?,
                None => buf.put_bytes(0, tuple_size),
            }
        }

        let padding = self.page_size - buf.len();
        buf.put_bytes(0, padding);

        Ok(buf.to_vec())
    }

    pub fn id(&self) -> PageId {
        self.pid
    }

    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    pub fn num_slots(&self) -> usize {
        self.tuples.len()
    }

    /// Returns whether the given slot holds a tuple.
    pub fn is_slot_used(&self, slot: usize) -> bool {
        slot < self.tuples.len() && bit_is_set(&self.header, slot)
    }

    pub fn num_empty_slots(&self) -> usize {
        (0..self.num_slots()).filter(|&i| !self.is_slot_used(i)).count()
    }

    /// Stores a tuple in the first free slot and returns its new record id.
    pub fn insert_tuple(&mut self, mut tuple: Tuple) -> Result<RecordId> {
        tuple.check_storable(&self.desc)?;

        let slot = (0..self.num_slots())
            .find(|&i| !self.is_slot_used(i))
            .ok_or(DbError::PageFull(self.pid))?;

        let rid = RecordId::new(self.pid, slot_id(self.pid, slot)?);
        tuple.set_record_id(Some(rid));
        set_bit(&mut self.header, slot, true);
        self.tuples[slot] = Some(tuple);

        Ok(rid)
    }

    /// Removes the tuple stored at the tuple's record id.
    pub fn delete_tuple(&mut self, tuple: &Tuple) -> Result<()> {
        let rid = tuple.record_id().ok_or(DbError::MissingRecordId)?;
        if rid.page_id != self.pid {
            return Err(DbError::ForeignTuple(rid));
        }

        let slot = rid.slot_id.as_usize();
        if !self.is_slot_used(slot) {
            return Err(DbError::SlotNotOccupied {
                page_id: self.pid,
                slot: rid.slot_id.as_u16(),
            });
        }

        set_bit(&mut self.header, slot, false);
        self.tuples[slot] = None;
        Ok(())
    }

    /// Returns the stored tuples in slot order.
    pub fn tuples(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter().flatten()
    }

    /// Marks or clears the dirty state.
    pub fn mark_dirty(&mut self, tid: Option<TransactionId>) {
        self.dirtied_by = tid;
    }

    /// Returns the transaction that dirtied this page, if it is dirty.
    pub fn dirtied_by(&self) -> Option<TransactionId> {
        self.dirtied_by
    }

    pub fn is_dirty(&self) -> bool {
        self.dirtied_by.is_some()
    }
}

/// Slot numbers must fit a `u16`; larger ones mean the page layout is unusable.
fn slot_id(pid: PageId, slot: usize) -> Result<SlotId> {
    u16::try_from(slot)
        .map(SlotId::new)
        .map_err(|_| DbError::InvalidPage(pid))
}

fn bit_is_set(header: &[u8], slot: usize) -> bool {
    header[slot / 8] & (1 << (slot % 8)) != 0
}

fn set_bit(header: &mut [u8], slot: usize, value: bool) {
    if value {
        header[slot / 8] |= 1 << (slot % 8);
    } else {
        header[slot / 8] &= !(1 << (slot % 8));
    }
}
