use std::sync::Arc;

use log::trace;

use super::HeapFile;
use crate::buffer::BufferPool;
use crate::common::{DbError, PageId, Permissions, Result, TransactionId};
use crate::tuple::Tuple;

/// Forward-only, restartable cursor over every tuple of a heap file, in page
/// order and slot order within a page.
///
/// Pages are acquired read-only through the buffer pool one at a time and
/// stay held by the transaction once read.
pub struct HeapFileIterator {
    file: Arc<HeapFile>,
    pool: Arc<BufferPool>,
    tid: TransactionId,
    /// Page the cursor is currently on
    page_no: u32,
    /// Page count captured when the cursor was opened
    num_pages: u32,
    /// Remaining tuples of the current page; None while closed
    current: Option<std::vec::IntoIter<Tuple>>,
}

impl HeapFileIterator {
    pub(crate) fn new(file: Arc<HeapFile>, pool: Arc<BufferPool>, tid: TransactionId) -> Self {
        Self {
            file,
            pool,
            tid,
            page_no: 0,
            num_pages: 0,
            current: None,
        }
    }

    /// Positions the cursor at the first tuple of page 0.
    pub fn open(&mut self) -> Result<()> {
        self.num_pages = self.file.num_pages()?;
        self.page_no = 0;
        let first = if self.num_pages > 0 {
            self.load_page(0)?
        } else {
            Vec::new()
        };
        self.current = Some(first.into_iter());
        Ok(())
    }

    /// Returns true if another tuple is available, skipping empty pages.
    pub fn has_next(&mut self) -> Result<bool> {
        loop {
            let Some(current) = self.current.as_ref() else {
                return Ok(false);
            };
            if !current.as_slice().is_empty() {
                return Ok(true);
            }
            if self.page_no + 1 >= self.num_pages {
                return Ok(false);
            }
            self.page_no += 1;
            let tuples = self.load_page(self.page_no)?;
            self.current = Some(tuples.into_iter());
        }
    }

    /// Returns the next tuple, or `NoSuchElement` once the file is exhausted.
    pub fn next(&mut self) -> Result<Tuple> {
        if !self.has_next()? {
            return Err(DbError::NoSuchElement);
        }
        self.current
            .as_mut()
            .and_then(Iterator::next)
            .ok_or(DbError::NoSuchElement)
    }

    /// Restarts from the first tuple of page 0.
    pub fn rewind(&mut self) -> Result<()> {
        self.close();
        self.open()
    }

    /// Drops the cursor; `has_next` reports false until reopened.
    pub fn close(&mut self) {
        self.current = None;
    }

    fn load_page(&self, page_no: u32) -> Result<Vec<Tuple>> {
        let pid = PageId::new(self.file.id(), page_no);
        trace!("{} scanning {}", self.tid, pid);

        let guard = self.pool.acquire_page(self.tid, pid, Permissions::ReadOnly)?;
        let tuples = guard.read().tuples().cloned().collect();
        guard.retain();
        Ok(tuples)
    }
}
