use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::{Mutex, RwLock};

use super::{PageGuard, PageRef};
use crate::catalog::Catalog;
use crate::common::{DbError, PageId, Permissions, Result, TableId, TransactionId};
use crate::tuple::Tuple;

/// Internal state guarded by one mutex
struct BufferPoolState {
    /// Cached pages
    pages: HashMap<PageId, PageRef>,
    /// Cached page ids in load order, oldest first
    load_order: VecDeque<PageId>,
    /// Pages each transaction currently holds
    holds: HashMap<TransactionId, HashSet<PageId>>,
}

/// BufferPool caches heap pages in memory and hands them out to transactions.
///
/// Pages are read through the catalog's heap files on a miss. Dirty pages are
/// never evicted; they reach disk when their transaction commits or when
/// flushed explicitly. When the pool is full and every cached page is dirty,
/// acquisition fails with `BufferPoolFull`.
pub struct BufferPool {
    /// Maximum number of cached pages
    capacity: usize,
    catalog: Arc<Catalog>,
    state: Mutex<BufferPoolState>,
}

impl BufferPool {
    /// Creates a pool that caches at most `capacity` pages.
    pub fn new(capacity: usize, catalog: Arc<Catalog>) -> Self {
        Self {
            capacity,
            catalog,
            state: Mutex::new(BufferPoolState {
                pages: HashMap::new(),
                load_order: VecDeque::new(),
                holds: HashMap::new(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Returns the number of pages currently cached.
    pub fn cached_pages(&self) -> usize {
        self.state.lock().pages.len()
    }

    /// Acquires a page for `tid`, reading it from disk on a miss.
    pub fn acquire_page(
        &self,
        tid: TransactionId,
        pid: PageId,
        perm: Permissions,
    ) -> Result<PageGuard<'_>> {
        trace!("{} acquiring {} ({:?})", tid, pid, perm);

        let mut state = self.state.lock();
        let page = match state.pages.get(&pid) {
            Some(page) => Arc::clone(page),
            None => {
                let file = self.catalog.file(pid.table_id)?;
                let page = Arc::new(RwLock::new(file.read_page(pid)?));
                self.cache_page(&mut state, pid, Arc::clone(&page))?;
                page
            }
        };

        state.holds.entry(tid).or_default().insert(pid);
        Ok(PageGuard::new(self, tid, pid, page))
    }

    /// Releases `tid`'s hold on a page without completing the transaction.
    pub fn release_page(&self, tid: TransactionId, pid: PageId) {
        let mut state = self.state.lock();
        if let Some(held) = state.holds.get_mut(&tid) {
            held.remove(&pid);
            if held.is_empty() {
                state.holds.remove(&tid);
            }
        }
    }

    /// Returns whether `tid` currently holds the page.
    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        self.state
            .lock()
            .holds
            .get(&tid)
            .map(|held| held.contains(&pid))
            .unwrap_or(false)
    }

    /// Inserts a tuple into a table on behalf of `tid`, marking the touched
    /// page dirty.
    pub fn insert_tuple(&self, tid: TransactionId, table_id: TableId, tuple: Tuple) -> Result<()> {
        let file = self.catalog.file(table_id)?;
        let pages = file.insert_tuple(self, tid, tuple)?;
        self.mark_dirty(tid, pages)
    }

    /// Deletes a tuple, located by its record id, on behalf of `tid`.
    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> Result<()> {
        let rid = tuple.record_id().ok_or(DbError::MissingRecordId)?;
        let file = self.catalog.file(rid.page_id.table_id)?;
        let pages = file.delete_tuple(self, tid, tuple)?;
        self.mark_dirty(tid, pages)
    }

    /// Writes a cached page to disk if it is dirty.
    ///
    /// Pages whose table is no longer registered have nowhere to go and are
    /// dropped from the cache instead.
    pub fn flush_page(&self, pid: PageId) -> Result<()> {
        let page = match self.state.lock().pages.get(&pid) {
            Some(page) => Arc::clone(page),
            None => return Ok(()),
        };

        let file = match self.catalog.file(pid.table_id) {
            Ok(file) => file,
            Err(DbError::TableNotFound(_)) => {
                self.discard_page(pid);
                debug!("discarded {} of an unregistered table", pid);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let mut page = page.write();
        if page.is_dirty() {
            file.write_page(&mut page)?;
            debug!("flushed {}", pid);
        }
        Ok(())
    }

    /// Writes every dirty cached page to disk.
    pub fn flush_all_pages(&self) -> Result<()> {
        let pids: Vec<PageId> = self.state.lock().pages.keys().copied().collect();
        for pid in pids {
            self.flush_page(pid)?;
        }
        Ok(())
    }

    /// Drops a page from the cache without writing it.
    pub fn discard_page(&self, pid: PageId) {
        let mut state = self.state.lock();
        state.pages.remove(&pid);
        state.load_order.retain(|&p| p != pid);
    }

    /// Ends a transaction. On commit its dirty pages are written to disk; on
    /// abort they are discarded so the next reader sees the on-disk image.
    ///
    /// Every hold of the transaction is released even when a flush fails.
    /// All pages are attempted and the first error is returned.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) -> Result<()> {
        let dirtied: Vec<PageId> = {
            let mut state = self.state.lock();
            state.holds.remove(&tid);
            state
                .pages
                .iter()
                .filter(|(_, page)| page.read().dirtied_by() == Some(tid))
                .map(|(&pid, _)| pid)
                .collect()
        };

        let mut result = Ok(());
        for pid in dirtied {
            if !commit {
                self.discard_page(pid);
                continue;
            }
            if let Err(e) = self.flush_page(pid) {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }

        debug!("{} {}", tid, if commit { "committed" } else { "aborted" });
        result
    }

    fn mark_dirty(&self, tid: TransactionId, pages: Vec<PageRef>) -> Result<()> {
        let mut state = self.state.lock();
        for page in pages {
            let pid = {
                let mut guard = page.write();
                guard.mark_dirty(Some(tid));
                guard.id()
            };
            if !state.pages.contains_key(&pid) {
                self.cache_page(&mut state, pid, page)?;
            }
        }
        Ok(())
    }

    fn cache_page(&self, state: &mut BufferPoolState, pid: PageId, page: PageRef) -> Result<()> {
        while state.pages.len() >= self.capacity {
            self.evict_page(state)?;
        }
        state.pages.insert(pid, page);
        state.load_order.push_back(pid);
        Ok(())
    }

    /// Evicts the oldest clean page that no transaction holds.
    fn evict_page(&self, state: &mut BufferPoolState) -> Result<()> {
        let victim = state.load_order.iter().position(|pid| {
            let held = state.holds.values().any(|held| held.contains(pid));
            !held
                && state
                    .pages
                    .get(pid)
                    .and_then(|page| page.try_read().map(|p| !p.is_dirty()))
                    .unwrap_or(false)
        });

        match victim.and_then(|i| state.load_order.remove(i)) {
            Some(pid) => {
                state.pages.remove(&pid);
                debug!("evicted {}", pid);
                Ok(())
            }
            None => Err(DbError::BufferPoolFull),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{DbConfig, TableId};
    use crate::storage::page::HeapPage;
    use crate::tuple::{Field, TupleDesc, Type};
    use tempfile::TempDir;

    const PAGE_SIZE: usize = 64;

    fn setup(capacity: usize, pages: u32) -> (BufferPool, TableId, TempDir) {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(Catalog::new(DbConfig::new().with_page_size(PAGE_SIZE)));
        let desc = Arc::new(TupleDesc::from_types(&[Type::Int]));
        let table_id = catalog
            .create_table("t", dir.path().join("t.dat"), desc)
            .unwrap();
        let file = catalog.file(table_id).unwrap();
        for _ in 0..pages {
            file.append_empty_page().unwrap();
        }
        (BufferPool::new(capacity, catalog), table_id, dir)
    }

    fn int_row(pool: &BufferPool, table_id: TableId, v: i32) -> Tuple {
        let desc = pool.catalog().schema(table_id).unwrap();
        Tuple::from_fields(desc, vec![Field::Int(v)])
    }

    #[test]
    fn test_acquire_caches_and_holds() {
        let (pool, table_id, _dir) = setup(4, 2);
        let tid = TransactionId::new();
        let pid = PageId::new(table_id, 0);

        let guard = pool.acquire_page(tid, pid, Permissions::ReadOnly).unwrap();
        assert_eq!(pool.cached_pages(), 1);
        assert!(pool.holds_lock(tid, pid));

        drop(guard);
        assert!(!pool.holds_lock(tid, pid));
        assert_eq!(pool.cached_pages(), 1);
    }

    #[test]
    fn test_retain_keeps_hold_until_completion() {
        let (pool, table_id, _dir) = setup(4, 1);
        let tid = TransactionId::new();
        let pid = PageId::new(table_id, 0);

        let page = pool.acquire_page(tid, pid, Permissions::ReadWrite).unwrap().retain();
        assert_eq!(page.read().id(), pid);
        assert!(pool.holds_lock(tid, pid));

        pool.transaction_complete(tid, true).unwrap();
        assert!(!pool.holds_lock(tid, pid));
    }

    #[test]
    fn test_clean_pages_are_evicted() {
        let (pool, table_id, _dir) = setup(2, 3);
        let tid = TransactionId::new();

        for page_no in 0..3 {
            pool.acquire_page(tid, PageId::new(table_id, page_no), Permissions::ReadOnly)
                .unwrap();
        }
        assert_eq!(pool.cached_pages(), 2);
    }

    #[test]
    fn test_dirty_pages_are_not_evicted() {
        let (pool, table_id, _dir) = setup(1, 2);
        let tid = TransactionId::new();

        pool.insert_tuple(tid, table_id, int_row(&pool, table_id, 1)).unwrap();
        let result = pool.acquire_page(tid, PageId::new(table_id, 1), Permissions::ReadOnly);
        assert!(matches!(result, Err(DbError::BufferPoolFull)));
    }

    #[test]
    fn test_commit_flushes_and_abort_discards() {
        let (pool, table_id, _dir) = setup(4, 1);
        let file = pool.catalog().file(table_id).unwrap();
        let pid = PageId::new(table_id, 0);

        let t1 = TransactionId::new();
        pool.insert_tuple(t1, table_id, int_row(&pool, table_id, 1)).unwrap();
        assert_eq!(file.read_page(pid).unwrap().tuples().count(), 0);
        pool.transaction_complete(t1, true).unwrap();
        assert_eq!(file.read_page(pid).unwrap().tuples().count(), 1);

        let t2 = TransactionId::new();
        pool.insert_tuple(t2, table_id, int_row(&pool, table_id, 2)).unwrap();
        pool.transaction_complete(t2, false).unwrap();

        let t3 = TransactionId::new();
        let guard = pool.acquire_page(t3, pid, Permissions::ReadOnly).unwrap();
        let page: &RwLock<HeapPage> = &guard;
        assert_eq!(page.read().tuples().count(), 1);
    }

    #[test]
    fn test_held_pages_are_not_evicted() {
        let (pool, table_id, _dir) = setup(1, 2);
        let tid = TransactionId::new();

        let held = pool
            .acquire_page(tid, PageId::new(table_id, 0), Permissions::ReadOnly)
            .unwrap()
            .retain();
        let result = pool.acquire_page(tid, PageId::new(table_id, 1), Permissions::ReadOnly);
        assert!(matches!(result, Err(DbError::BufferPoolFull)));

        pool.transaction_complete(tid, true).unwrap();
        pool.acquire_page(tid, PageId::new(table_id, 1), Permissions::ReadOnly)
            .unwrap();
        assert_eq!(held.read().tuples().count(), 0);
    }

    #[test]
    fn test_commit_after_table_is_replaced() {
        let (pool, table_id, dir) = setup(4, 1);
        let tid = TransactionId::new();
        let pid = PageId::new(table_id, 0);

        pool.insert_tuple(tid, table_id, int_row(&pool, table_id, 1)).unwrap();
        assert!(pool.holds_lock(tid, pid));

        let desc = pool.catalog().schema(table_id).unwrap();
        pool.catalog()
            .create_table("t", dir.path().join("t2.dat"), desc)
            .unwrap();

        pool.transaction_complete(tid, true).unwrap();
        assert!(!pool.holds_lock(tid, pid));
        assert_eq!(pool.cached_pages(), 0);
    }

    #[test]
    fn test_unknown_table() {
        let (pool, _table_id, _dir) = setup(4, 1);
        let result = pool.acquire_page(
            TransactionId::new(),
            PageId::new(TableId::new(999), 0),
            Permissions::ReadOnly,
        );
        assert!(matches!(result, Err(DbError::TableNotFound(_))));
    }
}
