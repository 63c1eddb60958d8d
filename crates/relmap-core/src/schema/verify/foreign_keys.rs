use super::*;

impl Verify<'_> {
    /// A foreign key column stores the same type as the key column it
    /// references.
    pub(super) fn verify_foreign_key_types(&mut self) {
        let db = &self.schema.db;

        for table in &db.tables {
            for fk in &table.foreign_keys {
                if fk.columns.len() != fk.principal_columns.len() {
                    self.errors.push(err!(
                        "foreign key '{}' on table '{}' has {} columns but references {}",
                        fk.name,
                        table.name,
                        fk.columns.len(),
                        fk.principal_columns.len()
                    ));
                    continue;
                }

                let principal_table = db.table(fk.principal_table);

                for (column, principal_column) in fk.columns.iter().zip(&fk.principal_columns) {
                    let column = db.column(*column);
                    let principal_column = db.column(*principal_column);

                    if column.ty != principal_column.ty {
                        self.errors.push(model_err!(
                            ForeignKeyTypeMismatch,
                            table.name,
                            column.name,
                            column.ty.name(),
                            principal_table.name,
                            principal_column.name,
                            principal_column.ty.name()
                        ));
                    }
                }
            }
        }
    }
}
