use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;

use crate::common::{DbConfig, DbError, Result, TableId};
use crate::storage::heap::HeapFile;
use crate::tuple::TupleDesc;

/// Metadata for one registered table
#[derive(Clone)]
pub struct TableInfo {
    pub name: String,
    pub file: Arc<HeapFile>,
}

struct CatalogState {
    tables: HashMap<TableId, TableInfo>,
    names: HashMap<String, TableId>,
    next_id: u32,
}

/// Catalog maps table ids and names to their heap files.
///
/// Table ids are handed out sequentially at registration and are never
/// derived from the file path.
pub struct Catalog {
    config: DbConfig,
    state: RwLock<CatalogState>,
}

impl Catalog {
    pub fn new(config: DbConfig) -> Self {
        Self {
            config,
            state: RwLock::new(CatalogState {
                tables: HashMap::new(),
                names: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Opens (or creates) the heap file at `path` and registers it under
    /// `name`. Registering a name again replaces the earlier table.
    pub fn create_table<P: AsRef<Path>>(
        &self,
        name: &str,
        path: P,
        desc: Arc<TupleDesc>,
    ) -> Result<TableId> {
        let mut state = self.state.write();
        let table_id = TableId::new(state.next_id);
        let file = HeapFile::open(path, table_id, desc, self.config.page_size())?;
        state.next_id += 1;

        if let Some(old) = state.names.insert(name.to_string(), table_id) {
            state.tables.remove(&old);
            debug!("table {} replaced {} with {}", name, old, table_id);
        }
        state.tables.insert(
            table_id,
            TableInfo {
                name: name.to_string(),
                file: Arc::new(file),
            },
        );

        debug!("registered table {} as {}", name, table_id);
        Ok(table_id)
    }

    /// Looks up a table id by name.
    pub fn table_id(&self, name: &str) -> Result<TableId> {
        self.state
            .read()
            .names
            .get(name)
            .copied()
            .ok_or_else(|| DbError::TableNameNotFound(name.to_string()))
    }

    pub fn file(&self, table_id: TableId) -> Result<Arc<HeapFile>> {
        self.table(table_id).map(|info| info.file)
    }

    pub fn schema(&self, table_id: TableId) -> Result<Arc<TupleDesc>> {
        self.table(table_id).map(|info| Arc::clone(info.file.desc()))
    }

    pub fn table_name(&self, table_id: TableId) -> Result<String> {
        self.table(table_id).map(|info| info.name)
    }

    /// Returns every registered table id in ascending order.
    pub fn table_ids(&self) -> Vec<TableId> {
        let mut ids: Vec<TableId> = self.state.read().tables.keys().copied().collect();
        ids.sort();
        ids
    }

    fn table(&self, table_id: TableId) -> Result<TableInfo> {
        self.state
            .read()
            .tables
            .get(&table_id)
            .cloned()
            .ok_or(DbError::TableNotFound(table_id))
    }
}
