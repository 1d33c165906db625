use std::sync::Arc;

use log::debug;

use super::{BoxedOperator, OpCursor, Operator};
use crate::catalog::Database;
use crate::common::{DbError, Result, TableId, TransactionId};
use crate::tuple::{Field, Tuple, TupleDesc, Type};

/// Progress of a mutation operator. `rewind` moves `Done` back to
/// `NotStarted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MutationState {
    NotStarted,
    Done,
}

/// Single INT column holding the number of affected rows
pub(crate) fn count_schema() -> Arc<TupleDesc> {
    Arc::new(TupleDesc::from_types(&[Type::Int]))
}

/// Inserts every tuple of its child into a table.
///
/// The first pull drains the child and returns one tuple holding the number
/// of rows inserted. Later pulls return nothing until `rewind`.
pub struct Insert {
    tid: TransactionId,
    child: BoxedOperator,
    table_id: TableId,
    /// Schema of the target table, attached to every inserted tuple
    table_schema: Arc<TupleDesc>,
    db: Database,
    state: MutationState,
    schema: Arc<TupleDesc>,
    cursor: OpCursor,
}

impl Insert {
    /// Fails with `SchemaMismatch` when the child's output types differ from
    /// the table's.
    pub fn new(tid: TransactionId, child: BoxedOperator, table_id: TableId, db: &Database) -> Result<Self> {
        let table_schema = db.catalog().schema(table_id)?;
        if **child.schema() != *table_schema {
            return Err(DbError::SchemaMismatch {
                expected: table_schema.to_string(),
                found: child.schema().to_string(),
            });
        }

        Ok(Self {
            tid,
            child,
            table_id,
            table_schema,
            db: db.clone(),
            state: MutationState::NotStarted,
            schema: count_schema(),
            cursor: OpCursor::new(),
        })
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }
}

impl Operator for Insert {
    fn open(&mut self) -> Result<()> {
        self.child.open()?;
        self.state = MutationState::NotStarted;
        self.cursor.set_open(true);
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.cursor.set_open(false);
    }

    fn rewind(&mut self) -> Result<()> {
        self.child.rewind()?;
        self.state = MutationState::NotStarted;
        self.cursor.clear();
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        if self.state == MutationState::Done {
            return Ok(None);
        }

        let pool = self.db.buffer_pool();
        let mut count = 0;
        while self.child.has_next()? {
            let mut tuple = self.child.next()?;
            tuple.relabel(Arc::clone(&self.table_schema));
            tuple.set_record_id(None);
            pool.insert_tuple(self.tid, self.table_id, tuple)?;
            count += 1;
        }
        self.state = MutationState::Done;

        debug!("{} inserted {} tuples into {}", self.tid, count, self.table_id);
        Ok(Some(Tuple::from_fields(
            Arc::clone(&self.schema),
            vec![Field::Int(count)],
        )))
    }

    fn schema(&self) -> &Arc<TupleDesc> {
        &self.schema
    }

    fn children(&self) -> Vec<&dyn Operator> {
        vec![self.child.as_ref()]
    }

    /// A child whose types differ from the table's is ignored.
    fn set_children(&mut self, children: Vec<BoxedOperator>) {
        let Some(child) = children.into_iter().next() else {
            return;
        };
        if **child.schema() == *self.table_schema {
            self.child = child;
        } else {
            debug!("kept child of insert into {}: found {}", self.table_id, child.schema());
        }
    }

    fn cursor(&self) -> &OpCursor {
        &self.cursor
    }

    fn cursor_mut(&mut self) -> &mut OpCursor {
        &mut self.cursor
    }
}
