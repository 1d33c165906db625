use std::sync::Arc;

use super::{BoxedOperator, OpCursor, Operator};
use crate::catalog::Database;
use crate::common::{Result, TableId, TransactionId};
use crate::storage::heap::HeapFileIterator;
use crate::tuple::{Tuple, TupleDesc};

/// Sequential scan over every tuple of a table.
///
/// Output columns are named `alias.column`. Tuples keep their record ids so
/// they can be fed to `Delete`.
pub struct SeqScan {
    table_id: TableId,
    alias: String,
    schema: Arc<TupleDesc>,
    iter: HeapFileIterator,
    cursor: OpCursor,
}

impl SeqScan {
    pub fn new(db: &Database, tid: TransactionId, table_id: TableId, alias: &str) -> Result<Self> {
        let file = db.catalog().file(table_id)?;
        let schema = Arc::new(file.desc().qualified(alias));
        let iter = file.iterator(Arc::clone(db.buffer_pool()), tid);

        Ok(Self {
            table_id,
            alias: alias.to_string(),
            schema,
            iter,
            cursor: OpCursor::new(),
        })
    }

    /// Scans a table using its registered name as the alias.
    pub fn with_table_name(db: &Database, tid: TransactionId, table_id: TableId) -> Result<Self> {
        let name = db.catalog().table_name(table_id)?;
        Self::new(db, tid, table_id, &name)
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

impl Operator for SeqScan {
    fn open(&mut self) -> Result<()> {
        self.iter.open()?;
        self.cursor.set_open(true);
        Ok(())
    }

    fn close(&mut self) {
        self.iter.close();
        self.cursor.set_open(false);
    }

    fn rewind(&mut self) -> Result<()> {
        self.iter.rewind()?;
        self.cursor.clear();
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        if !self.iter.has_next()? {
            return Ok(None);
        }
        let mut tuple = self.iter.next()?;
        tuple.relabel(Arc::clone(&self.schema));
        Ok(Some(tuple))
    }

    fn schema(&self) -> &Arc<TupleDesc> {
        &self.schema
    }

    fn children(&self) -> Vec<&dyn Operator> {
        Vec::new()
    }

    fn set_children(&mut self, _children: Vec<BoxedOperator>) {}

    fn cursor(&self) -> &OpCursor {
        &self.cursor
    }

    fn cursor_mut(&mut self) -> &mut OpCursor {
        &mut self.cursor
    }
}
