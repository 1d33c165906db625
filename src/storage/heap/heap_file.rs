use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use super::HeapFileIterator;
use crate::buffer::{BufferPool, PageRef};
use crate::common::{DbError, PageId, Permissions, Result, TableId, TransactionId};
use crate::storage::page::HeapPage;
use crate::tuple::{Tuple, TupleDesc};

/// HeapFile stores the tuples of one table, in no particular order, as a
/// flat sequence of fixed-size pages with no file header.
///
/// Page `n` lives at byte offset `n * page_size`. The page count is always
/// derived from the current file length, and the file only ever grows by a
/// whole page at a time.
pub struct HeapFile {
    /// The backing file
    file: Mutex<File>,
    /// Path to the backing file
    path: PathBuf,
    /// Identifier assigned by the catalog
    table_id: TableId,
    /// Shape of every tuple in this file
    desc: Arc<TupleDesc>,
    /// Size of one page in bytes
    page_size: usize,
}

impl HeapFile {
    /// Opens the heap file at `path`, creating it empty if it doesn't exist.
    pub fn open<P: AsRef<Path>>(
        path: P,
        table_id: TableId,
        desc: Arc<TupleDesc>,
        page_size: usize,
    ) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        Ok(Self {
            file: Mutex::new(file),
            path: path.as_ref().to_path_buf(),
            table_id,
            desc,
            page_size,
        })
    }

    pub fn id(&self) -> TableId {
        self.table_id
    }

    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns the number of whole pages in the file.
    ///
    /// A trailing partial page is not counted.
    pub fn num_pages(&self) -> Result<u32> {
        let len = self.file.lock().metadata()?.len();
        Ok((len / self.page_size as u64) as u32)
    }

    /// Reads and decodes one page from disk.
    pub fn read_page(&self, pid: PageId) -> Result<HeapPage> {
        if pid.table_id != self.table_id {
            return Err(DbError::InvalidPage(pid));
        }

        let mut data = vec![0u8; self.page_size];
        let read = {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(pid.offset(self.page_size)))?;
            read_full(&mut *file, &mut data)?
        };

        if read < self.page_size {
            return Err(DbError::ShortRead {
                page_no: pid.page_no,
                read,
                expected: self.page_size,
            });
        }

        HeapPage::new(pid, Arc::clone(&self.desc), &data)
    }

    /// Encodes and writes one page at its offset, then clears its dirty marker.
    pub fn write_page(&self, page: &mut HeapPage) -> Result<()> {
        let pid = page.id();
        if pid.table_id != self.table_id {
            return Err(DbError::InvalidPage(pid));
        }

        let data = page.page_data()?;
        if data.len() != self.page_size {
            return Err(DbError::PageSizeMismatch {
                expected: self.page_size,
                actual: data.len(),
            });
        }

        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(pid.offset(self.page_size)))?;
            file.write_all(&data)?;
            file.flush()?;
        }

        page.mark_dirty(None);
        Ok(())
    }

    /// Appends one empty page image and returns its id.
    ///
    /// The image is written at `num_pages * page_size`, so a trailing partial
    /// page left by an earlier failure is overwritten rather than extended.
    pub fn append_empty_page(&self) -> Result<PageId> {
        let mut file = self.file.lock();
        let page_no = (file.metadata()?.len() / self.page_size as u64) as u32;
        let pid = PageId::new(self.table_id, page_no);

        file.seek(SeekFrom::Start(pid.offset(self.page_size)))?;
        file.write_all(&HeapPage::empty_page_data(self.page_size))?;
        file.flush()?;

        debug!("appended {} to {}", pid, self.path.display());
        Ok(pid)
    }

    /// Inserts a tuple into the first page with a free slot, appending a new
    /// page when every existing page is full.
    ///
    /// Pages inspected and found full are released before the next page is
    /// acquired. The page that receives the tuple stays held by `tid`. The
    /// free-slot check and the insert happen under one write lock, so a
    /// concurrent inserter that took the last slot sends this one on to the
    /// next page.
    pub fn insert_tuple(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        tuple: Tuple,
    ) -> Result<Vec<PageRef>> {
        tuple.check_storable(&self.desc)?;

        loop {
            for page_no in 0..self.num_pages()? {
                let pid = PageId::new(self.table_id, page_no);
                let guard = pool.acquire_page(tid, pid, Permissions::ReadWrite)?;

                let mut page = guard.write();
                if page.num_empty_slots() > 0 {
                    page.insert_tuple(tuple)?;
                    drop(page);
                    return Ok(vec![guard.retain()]);
                }
            }

            let pid = self.append_empty_page()?;
            let guard = pool.acquire_page(tid, pid, Permissions::ReadWrite)?;
            let mut page = guard.write();
            // Other inserters may have filled the new page already
            if page.num_empty_slots() > 0 {
                page.insert_tuple(tuple)?;
                self.write_page(&mut page)?;
                drop(page);
                return Ok(vec![guard.retain()]);
            }
        }
    }

    /// Removes a tuple from the page named by its record id.
    pub fn delete_tuple(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        tuple: &Tuple,
    ) -> Result<Vec<PageRef>> {
        let rid = tuple.record_id().ok_or(DbError::MissingRecordId)?;
        if rid.page_id.table_id != self.table_id || rid.page_id.page_no >= self.num_pages()? {
            return Err(DbError::ForeignTuple(rid));
        }

        let guard = pool.acquire_page(tid, rid.page_id, Permissions::ReadWrite)?;
        guard.write().delete_tuple(tuple)?;
        Ok(vec![guard.retain()])
    }

    /// Returns a restartable iterator over every tuple in the file.
    pub fn iterator(self: &Arc<Self>, pool: Arc<BufferPool>, tid: TransactionId) -> HeapFileIterator {
        HeapFileIterator::new(Arc::clone(self), pool, tid)
    }
}

/// Reads until `buf` is full or the file ends, returning the byte count.
fn read_full(file: &mut File, buf: &mut [u8]) -> Result<usize> {
    let mut read = 0;
    while read < buf.len() {
        match file.read(&mut buf[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(read)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::{Field, Type};
    use tempfile::NamedTempFile;

    const PAGE_SIZE: usize = 128;

    fn open_file(temp: &NamedTempFile) -> HeapFile {
        let desc = Arc::new(TupleDesc::from_types(&[Type::Int, Type::Int]));
        HeapFile::open(temp.path(), TableId::new(1), desc, PAGE_SIZE).unwrap()
    }

    #[test]
    fn test_new_file_is_empty() {
        let temp = NamedTempFile::new().unwrap();
        let file = open_file(&temp);
        assert_eq!(file.num_pages().unwrap(), 0);
        assert_eq!(file.id(), TableId::new(1));
    }

    #[test]
    fn test_append_and_read_page() {
        let temp = NamedTempFile::new().unwrap();
        let file = open_file(&temp);

        let pid = file.append_empty_page().unwrap();
        assert_eq!(pid, PageId::new(TableId::new(1), 0));
        assert_eq!(file.num_pages().unwrap(), 1);

        let page = file.read_page(pid).unwrap();
        assert_eq!(page.num_empty_slots(), page.num_slots());
    }

    #[test]
    fn test_write_page_is_confined_to_its_range() {
        let temp = NamedTempFile::new().unwrap();
        let file = open_file(&temp);
        let p0 = file.append_empty_page().unwrap();
        let p1 = file.append_empty_page().unwrap();
        let p2 = file.append_empty_page().unwrap();

        let mut page = file.read_page(p1).unwrap();
        let row = Tuple::from_fields(Arc::clone(file.desc()), vec![Field::Int(7), Field::Int(8)]);
        page.insert_tuple(row).unwrap();
        page.mark_dirty(Some(TransactionId::new()));
        file.write_page(&mut page).unwrap();
        assert!(!page.is_dirty());

        assert_eq!(file.num_pages().unwrap(), 3);
        assert_eq!(file.read_page(p0).unwrap().tuples().count(), 0);
        assert_eq!(file.read_page(p2).unwrap().tuples().count(), 0);

        let reread = file.read_page(p1).unwrap();
        let stored: Vec<_> = reread.tuples().map(|t| t.to_string()).collect();
        assert_eq!(stored, vec!["7\t8"]);
    }

    #[test]
    fn test_partial_trailing_page_is_ignored() {
        let temp = NamedTempFile::new().unwrap();
        let file = open_file(&temp);
        file.append_empty_page().unwrap();

        {
            let mut raw = OpenOptions::new().append(true).open(temp.path()).unwrap();
            raw.write_all(&[1u8; PAGE_SIZE / 2]).unwrap();
        }
        assert_eq!(file.num_pages().unwrap(), 1);

        let pid = file.append_empty_page().unwrap();
        assert_eq!(pid.page_no, 1);
        assert_eq!(std::fs::metadata(temp.path()).unwrap().len(), 2 * PAGE_SIZE as u64);
    }

    #[test]
    fn test_read_past_end_is_short_read() {
        let temp = NamedTempFile::new().unwrap();
        let file = open_file(&temp);
        let result = file.read_page(PageId::new(TableId::new(1), 4));
        assert!(matches!(result, Err(DbError::ShortRead { page_no: 4, read: 0, .. })));
    }

    #[test]
    fn test_foreign_page_id_rejected() {
        let temp = NamedTempFile::new().unwrap();
        let file = open_file(&temp);
        file.append_empty_page().unwrap();
        let result = file.read_page(PageId::new(TableId::new(2), 0));
        assert!(matches!(result, Err(DbError::InvalidPage(_))));
    }
}
