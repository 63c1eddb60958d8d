use super::{Convention, ConventionContext, Phase};
use crate::schema::app::{self, FacetSlot};
use crate::schema::db::StoreGenerated;

/// Makes a single integral key of a hierarchy root store generated, unless
/// the key is also a foreign key.
#[derive(Debug)]
pub struct StoreGeneratedIdentityKey;

impl Convention for StoreGeneratedIdentityKey {
    fn name(&self) -> &str {
        "StoreGeneratedIdentityKey"
    }

    fn phase(&self) -> Phase {
        Phase::Association
    }

    fn apply(&self, model: &mut app::Schema, _cx: &mut ConventionContext<'_>) {
        let mut targets = vec![];

        for entity in model.entities().filter(|entity| entity.is_root()) {
            let [key] = model.key_of(entity.id) else {
                continue;
            };

            let Some(property) = entity.property(key) else {
                continue;
            };

            if !property.scalar_ty().is_some_and(|ty| ty.is_integral()) {
                continue;
            }

            let is_foreign_key = model.associations().any(|association| {
                let Some(fk) = association.foreign_key() else {
                    return false;
                };

                model.is_ancestor_or_self(entity.id, association.end(fk.dependent).entity)
                    && fk.dependent_properties.contains(key)
            });

            if !is_foreign_key {
                targets.push((entity.id, key.clone()));
            }
        }

        for (id, key) in targets {
            if let Some(property) = model.entity_mut(id).property_mut(&key) {
                property.store_generated.set_by_convention(StoreGenerated::Identity);
            }
        }
    }
}
