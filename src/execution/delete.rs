use std::sync::Arc;

use log::debug;

use super::insert::{count_schema, MutationState};
use super::{BoxedOperator, OpCursor, Operator};
use crate::catalog::Database;
use crate::common::{Result, TransactionId};
use crate::tuple::{Field, Tuple, TupleDesc};

/// Deletes every tuple its child produces, locating each by record id.
///
/// Behaves like `Insert`: one count tuple on the first pull, then nothing
/// until `rewind`.
pub struct Delete {
    tid: TransactionId,
    child: BoxedOperator,
    db: Database,
    state: MutationState,
    schema: Arc<TupleDesc>,
    cursor: OpCursor,
}

impl Delete {
    pub fn new(tid: TransactionId, child: BoxedOperator, db: &Database) -> Self {
        Self {
            tid,
            child,
            db: db.clone(),
            state: MutationState::NotStarted,
            schema: count_schema(),
            cursor: OpCursor::new(),
        }
    }
}

impl Operator for Delete {
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
            let tuple = self.child.next()?;
            pool.delete_tuple(self.tid, &tuple)?;
            count += 1;
        }
        self.state = MutationState::Done;

        debug!("{} deleted {} tuples", self.tid, count);
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

    fn set_children(&mut self, children: Vec<BoxedOperator>) {
        if let Some(child) = children.into_iter().next() {
            self.child = child;
        }
    }

    fn cursor(&self) -> &OpCursor {
        &self.cursor
    }

    fn cursor_mut(&mut self) -> &mut OpCursor {
        &mut self.cursor
    }
}
