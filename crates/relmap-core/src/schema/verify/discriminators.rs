use super::*;
use std::collections::HashMap;

impl Verify<'_> {
    /// Every concrete type stored in a discriminated table has a value, and
    /// no two types share one.
    pub(super) fn verify_discriminators(&mut self) {
        let app = &self.schema.app;

        for discriminator in &self.schema.mapping.discriminators {
            let table = &self.schema.db.table(discriminator.table).name;

            for (id, mapping) in &self.schema.mapping.entities {
                let entity = app.entity(*id);

                let stored_here = mapping
                    .fragments
                    .first()
                    .is_some_and(|fragment| fragment.table == discriminator.table);

                if entity.is_abstract
                    || !stored_here
                    || !app.is_ancestor_or_self(discriminator.entity, *id)
                {
                    continue;
                }

                if discriminator.value_for(*id).is_none() {
                    self.errors
                        .push(model_err!(MissingDiscriminatorValue, table, entity.name));
                }
            }

            let mut seen = HashMap::new();

            for (id, value) in &discriminator.values {
                if let Some(first) = seen.insert(value, *id) {
                    self.errors.push(model_err!(
                        DuplicateDiscriminatorValue,
                        table,
                        value,
                        app.entity(first).name,
                        app.entity(*id).name
                    ));
                }
            }
        }
    }
}
