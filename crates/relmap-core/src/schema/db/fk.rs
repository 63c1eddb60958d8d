use super::{ColumnId, TableId};
use serde::Serialize;

/// A foreign key constraint between two tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeignKey {
    pub name: String,

    /// Referencing columns, aligned with `principal_columns`
    pub columns: Vec<ColumnId>,

    pub principal_table: TableId,

    pub principal_columns: Vec<ColumnId>,

    pub cascade_delete: bool,
}
