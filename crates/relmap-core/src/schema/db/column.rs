use super::{TableId, Type};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    /// Uniquely identifies the column in the schema.
    pub id: ColumnId,

    /// The name of the column in the database.
    pub name: String,

    /// The database storage type of the column.
    pub ty: Type,

    /// Whether or not the column is nullable
    pub nullable: bool,

    /// `None` means the type's maximum
    pub max_length: Option<u32>,

    pub precision: Option<u8>,

    pub scale: Option<u8>,

    pub fixed_length: bool,

    pub store_generated: StoreGenerated,

    pub concurrency_token: bool,

    /// True if the column is part of the table's primary key
    pub primary_key: bool,

    #[serde(skip)]
    pub(crate) origin: ColumnOrigin,

    /// The name was given explicitly and is never uniquified
    #[serde(skip)]
    pub(crate) fixed_name: bool,
}

#[derive(PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize)]
pub struct ColumnId {
    pub table: TableId,
    pub index: usize,
}

/// How the store computes a column's value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreGenerated {
    #[default]
    None,
    Identity,
    Computed,
}

/// What produced a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnOrigin {
    Property,
    AssociationKey,
    Discriminator,
}

impl Column {
    pub(crate) fn new(id: ColumnId, name: String, ty: Type) -> Self {
        Self {
            id,
            name,
            ty,
            nullable: false,
            max_length: None,
            precision: None,
            scale: None,
            fixed_length: false,
            store_generated: StoreGenerated::None,
            concurrency_token: false,
            primary_key: false,
            origin: ColumnOrigin::Property,
            fixed_name: false,
        }
    }

    /// Copies the storage facets of `other`, as for a column referencing it.
    pub(crate) fn copy_type_of(&mut self, other: &Column) {
        self.ty = other.ty.clone();
        self.max_length = other.max_length;
        self.precision = other.precision;
        self.scale = other.scale;
        self.fixed_length = other.fixed_length;
    }
}

impl ColumnId {
    pub(crate) fn placeholder() -> Self {
        Self {
            table: TableId::placeholder(),
            index: usize::MAX,
        }
    }
}

impl From<&Column> for ColumnId {
    fn from(value: &Column) -> Self {
        value.id
    }
}

impl fmt::Debug for ColumnId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "ColumnId({}/{})", self.table.0, self.index)
    }
}
