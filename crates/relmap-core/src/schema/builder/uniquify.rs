use crate::schema::db::{self, ColumnOrigin, Table};
use std::collections::HashSet;

/// Makes table names unique across the store model and column names unique
/// within each table.
///
/// Explicitly named tables and columns keep their names. Conventional names
/// that collide get a numeric suffix, first come first served in creation
/// order. Two explicit names colliding are left for verification to report,
/// as is an explicitly named association key column colliding with a column
/// that existed before it.
pub(super) fn uniquify(db: &mut db::Schema) {
    let mut taken: HashSet<String> = db
        .tables
        .iter()
        .filter(|table| table.fixed_name)
        .map(|table| table.name.key())
        .collect();

    for table in db.tables.iter_mut().filter(|table| !table.fixed_name) {
        let base = table.name.name.clone();
        let mut suffix = 0;

        while !taken.insert(table.name.key()) {
            suffix += 1;
            table.name.name = format!("{base}{suffix}");
        }
    }

    for table in &mut db.tables {
        uniquify_columns(table);
    }
}

fn uniquify_columns(table: &mut Table) {
    let mut taken: HashSet<String> = table
        .columns
        .iter()
        .filter(|column| column.fixed_name && column.origin != ColumnOrigin::AssociationKey)
        .map(|column| column.name.to_lowercase())
        .collect();

    for column in table.columns.iter_mut().filter(|column| !column.fixed_name) {
        let base = column.name.clone();
        let mut suffix = 0;

        while !taken.insert(column.name.to_lowercase()) {
            suffix += 1;
            column.name = format!("{base}{suffix}");
        }
    }
}
