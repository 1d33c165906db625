/// Default size of a page in bytes (4 KB)
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Maximum number of bytes a string field can hold
pub const STRING_LEN: usize = 128;

/// Default buffer pool capacity (number of cached pages)
pub const DEFAULT_BUFFER_POOL_PAGES: usize = 50;

/// Runtime configuration for a database instance.
///
/// The page size is fixed for the lifetime of a database: every heap file
/// registered with the catalog must be created with the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbConfig {
    page_size: usize,
    buffer_pool_pages: usize,
}

impl DbConfig {
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            buffer_pool_pages: DEFAULT_BUFFER_POOL_PAGES,
        }
    }

    /// Sets the page size in bytes.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the number of pages the buffer pool may cache.
    pub fn with_buffer_pool_pages(mut self, pages: usize) -> Self {
        self.buffer_pool_pages = pages;
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn buffer_pool_pages(&self) -> usize {
        self.buffer_pool_pages
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::new()
    }
}
