use super::Value;
use crate::schema::app::EntityId;
use crate::schema::db::{ColumnId, TableId};
use indexmap::IndexMap;
use serde::Serialize;

/// The column distinguishing the concrete types sharing a table.
#[derive(Debug, Clone, Serialize)]
pub struct Discriminator {
    /// Type whose table holds the column
    pub entity: EntityId,

    pub table: TableId,

    pub column: ColumnId,

    pub nullable: bool,

    /// Value per concrete type, in hierarchy order
    pub values: IndexMap<EntityId, Value>,
}

impl Discriminator {
    pub fn value_for(&self, id: EntityId) -> Option<&Value> {
        self.values.get(&id)
    }
}
