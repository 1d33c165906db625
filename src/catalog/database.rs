use std::sync::Arc;

use super::Catalog;
use crate::buffer::BufferPool;
use crate::common::DbConfig;

/// Database bundles the catalog and the buffer pool that share one
/// configuration. It is cheap to clone and is passed to operators that
/// touch storage.
#[derive(Clone)]
pub struct Database {
    config: DbConfig,
    catalog: Arc<Catalog>,
    buffer_pool: Arc<BufferPool>,
}

impl Database {
    pub fn new(config: DbConfig) -> Self {
        let catalog = Arc::new(Catalog::new(config));
        let buffer_pool = Arc::new(BufferPool::new(
            config.buffer_pool_pages(),
            Arc::clone(&catalog),
        ));
        Self {
            config,
            catalog,
            buffer_pool,
        }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new(DbConfig::default())
    }
}
