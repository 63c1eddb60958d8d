use super::{Column, ColumnId, ForeignKey};
use crate::schema::TableName;
use serde::Serialize;
use std::fmt;

/// A database table
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    /// Uniquely identifies a table
    pub id: TableId,

    /// Name of the table
    pub name: TableName,

    /// The table's columns
    pub columns: Vec<Column>,

    pub primary_key: Vec<ColumnId>,

    pub foreign_keys: Vec<ForeignKey>,

    /// The name was given explicitly and is never uniquified
    #[serde(skip)]
    pub(crate) fixed_name: bool,
}

/// Uniquely identifies a table
#[derive(PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize)]
pub struct TableId(pub usize);

impl Table {
    pub(crate) fn new(id: TableId, name: TableName, fixed_name: bool) -> Self {
        Self {
            id,
            name,
            columns: vec![],
            primary_key: vec![],
            foreign_keys: vec![],
            fixed_name,
        }
    }

    pub fn column(&self, id: impl Into<ColumnId>) -> &Column {
        &self.columns[id.into().index]
    }

    pub(crate) fn column_mut(&mut self, id: impl Into<ColumnId>) -> &mut Column {
        &mut self.columns[id.into().index]
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn primary_key_columns(&self) -> impl ExactSizeIterator<Item = &Column> + '_ {
        self.primary_key
            .iter()
            .map(|column_id| &self.columns[column_id.index])
    }

    /// Column names in column order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub(crate) fn push_column(&mut self, mut column: Column) -> ColumnId {
        let id = ColumnId {
            table: self.id,
            index: self.columns.len(),
        };
        column.id = id;
        self.columns.push(column);
        id
    }
}

impl TableId {
    pub(crate) fn placeholder() -> Self {
        Self(usize::MAX)
    }
}

impl fmt::Debug for TableId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "TableId({})", self.0)
    }
}
