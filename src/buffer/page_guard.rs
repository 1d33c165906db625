use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;

use super::BufferPool;
use crate::common::{PageId, TransactionId};
use crate::storage::page::HeapPage;

/// Shared handle to a cached page
pub type PageRef = Arc<RwLock<HeapPage>>;

/// RAII guard for a page acquired by a transaction.
///
/// Dropping the guard releases the transaction's hold on the page. Call
/// [`PageGuard::retain`] to keep the hold until the transaction completes,
/// which is what callers do for pages they have read or mutated.
pub struct PageGuard<'a> {
    tid: TransactionId,
    page_id: PageId,
    page: PageRef,
    /// Pool to notify on release; taken by `retain`
    pool: Option<&'a BufferPool>,
}

impl<'a> PageGuard<'a> {
    pub(crate) fn new(pool: &'a BufferPool, tid: TransactionId, page_id: PageId, page: PageRef) -> Self {
        Self {
            tid,
            page_id,
            page,
            pool: Some(pool),
        }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn tid(&self) -> TransactionId {
        self.tid
    }

    /// Keeps the hold and returns the shared page handle.
    pub fn retain(mut self) -> PageRef {
        self.pool = None;
        Arc::clone(&self.page)
    }
}

impl Deref for PageGuard<'_> {
    type Target = RwLock<HeapPage>;

    fn deref(&self) -> &Self::Target {
        &self.page
    }
}

impl Drop for PageGuard<'_> {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.release_page(self.tid, self.page_id);
        }
    }
}
