//! Store model: schema-qualified tables, columns and foreign keys.

mod column;
pub use column::{Column, ColumnId, StoreGenerated};
pub(crate) use column::ColumnOrigin;

mod fk;
pub use fk::ForeignKey;

mod schema;
pub use schema::Schema;

mod table;
pub use table::{Table, TableId};

mod ty;
pub use ty::Type;
