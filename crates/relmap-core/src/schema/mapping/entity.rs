use super::Value;
use crate::schema::app::EntityId;
use crate::schema::db::{ColumnId, TableId};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct EntityMapping {
    pub entity: EntityId,

    /// Ordered fragments; the first one holds the entity's primary key
    pub fragments: Vec<MappingFragment>,

    /// The fragments also describe rows of derived types
    pub is_hierarchy_mapping: bool,
}

/// Binds a subset of an entity's properties to a subset of one table's
/// columns.
#[derive(Debug, Clone, Serialize)]
pub struct MappingFragment {
    pub table: TableId,

    pub properties: Vec<PropertyBinding>,

    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyBinding {
    /// Property names from the entity down to the scalar leaf
    pub path: Vec<String>,

    pub column: ColumnId,
}

/// Rows belong to the fragment's type only when the column holds the value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub column: ColumnId,
    pub value: Value,
}

impl EntityMapping {
    pub(crate) fn new(entity: EntityId) -> Self {
        Self {
            entity,
            fragments: vec![],
            is_hierarchy_mapping: false,
        }
    }

    pub fn tables(&self) -> impl Iterator<Item = TableId> + '_ {
        self.fragments.iter().map(|fragment| fragment.table)
    }

    /// The column a property path is bound to, in the first fragment that
    /// binds it.
    pub fn column_for(&self, path: &[&str]) -> Option<ColumnId> {
        self.fragments.iter().find_map(|fragment| {
            fragment
                .properties
                .iter()
                .find(|binding| binding.path.iter().map(String::as_str).eq(path.iter().copied()))
                .map(|binding| binding.column)
        })
    }
}

impl MappingFragment {
    pub(crate) fn new(table: TableId) -> Self {
        Self {
            table,
            properties: vec![],
            conditions: vec![],
        }
    }

    pub fn binds(&self, path: &[String]) -> bool {
        self.properties.iter().any(|binding| binding.path == path)
    }
}
