mod discriminators;
mod foreign_keys;

use super::Schema;
use crate::{Error, Result};
use std::collections::HashSet;
use tracing::debug;

struct Verify<'a> {
    schema: &'a Schema,
    errors: Vec<Error>,
}

impl Schema {
    /// Checks the global invariants of a built model. Every violation found
    /// is reported, not only the first one.
    pub fn verify(&self) -> Result<()> {
        let mut verify = Verify {
            schema: self,
            errors: vec![],
        };
        verify.verify();

        debug!(errors = verify.errors.len(), "verified model");
        Error::aggregate(verify.errors)
    }
}

impl Verify<'_> {
    fn verify(&mut self) {
        self.verify_each_table_has_a_primary_key();
        self.verify_foreign_key_types();
        self.verify_discriminators();
        self.verify_table_names_are_unique();
        self.verify_column_names_are_unique();
        self.verify_associations_have_entity_sets();
        self.verify_bindings_are_unique();
    }

    fn verify_each_table_has_a_primary_key(&mut self) {
        for table in &self.schema.db.tables {
            if table.primary_key.is_empty() {
                self.errors.push(err!("table '{}' has no primary key", table.name));
            }
        }
    }

    /// Explicitly named tables, join tables included, are never uniquified.
    fn verify_table_names_are_unique(&mut self) {
        let mut seen = HashSet::new();

        for table in &self.schema.db.tables {
            if !seen.insert(table.name.key()) {
                self.errors.push(model_err!(TableNameCollision, table.name));
            }
        }
    }

    fn verify_column_names_are_unique(&mut self) {
        for table in &self.schema.db.tables {
            let mut seen = HashSet::new();

            for column in &table.columns {
                if !seen.insert(column.name.to_lowercase()) {
                    self.errors
                        .push(model_err!(ColumnNameCollision, table.name, column.name));
                }
            }
        }
    }

    /// Both ends of an association belong to a hierarchy with an entity set.
    fn verify_associations_have_entity_sets(&mut self) {
        let app = &self.schema.app;

        for association in app.associations() {
            let resolvable = association
                .ends()
                .iter()
                .all(|end| app.entity_set_for(end.entity).is_some());

            if !resolvable {
                self.errors
                    .push(model_err!(EntitySetNotResolvable, association.name));
            }
        }
    }

    fn verify_bindings_are_unique(&mut self) {
        for mapping in self.schema.mapping.entities.values() {
            let entity = self.schema.app.entity(mapping.entity);

            for fragment in &mapping.fragments {
                let mut seen = HashSet::new();

                for binding in &fragment.properties {
                    if !seen.insert(&binding.path) {
                        self.errors.push(model_err!(
                            ConflictingMapping,
                            binding.path.join("."),
                            entity.name
                        ));
                    }
                }
            }
        }
    }
}
