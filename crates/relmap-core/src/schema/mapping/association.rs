use crate::schema::app::AssociationId;
use crate::schema::db::{ColumnId, TableId};
use serde::Serialize;

/// Maps an independent or many-to-many association to store columns.
///
/// For an association stored in the dependent's table, the dependent end's
/// columns are the table's key and the principal end's columns are the
/// association key columns. For a many-to-many association, both are join
/// table columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociationSetMapping {
    pub association: AssociationId,

    pub table: TableId,

    pub source_columns: Vec<ColumnId>,

    pub target_columns: Vec<ColumnId>,
}
