use super::key::key_candidates;
use super::{Convention, ConventionContext, Phase};
use crate::schema::app::{self, ComplexType, ComplexTypeId, EntityId, Property, PropertyTy};
use tracing::debug;

/// Turns entity types that can only be values into complex types.
///
/// A type qualifies when it has no key candidate, no navigations and no
/// inheritance, is not configured or declared as an entity, and is only
/// reached through reference navigations that carry no association
/// configuration. The navigations pointing at it become complex properties.
#[derive(Debug)]
pub struct ComplexTypeDiscovery;

impl Convention for ComplexTypeDiscovery {
    fn name(&self) -> &str {
        "ComplexTypeDiscovery"
    }

    fn phase(&self) -> Phase {
        Phase::Discovery
    }

    fn apply(&self, model: &mut app::Schema, cx: &mut ConventionContext<'_>) {
        let cx = &*cx;

        // Converting a type removes navigations, which can make the
        // referencing type qualify in turn.
        loop {
            let next = model
                .entities()
                .map(|entity| entity.id)
                .find(|id| qualifies(model, cx, *id));

            let Some(id) = next else {
                break;
            };

            convert(model, id);
        }
    }
}

fn qualifies(model: &app::Schema, cx: &ConventionContext<'_>, id: EntityId) -> bool {
    let entity = model.entity(id);

    if entity.declared_root
        || entity.is_abstract
        || entity.base.is_some()
        || entity.key.is_some()
        || entity.table.is_some()
        || !entity.navigations.is_empty()
        || !model.derived(id).is_empty()
        || cx.config.entity_config(&entity.name).is_some()
        || !key_candidates(entity).is_empty()
    {
        return false;
    }

    let mut referenced = false;

    for other in model.entities() {
        for navigation in other.navigations.iter().filter(|navigation| navigation.target == id) {
            if navigation.collection
                || navigation.inverse.is_some()
                || navigation.foreign_key.is_some()
                || cx.config.navigation(&other.name, &navigation.name).is_some()
            {
                return false;
            }

            referenced = true;
        }
    }

    referenced
}

fn convert(model: &mut app::Schema, id: EntityId) {
    let Some(entity) = model.entities.shift_remove(&id) else {
        return;
    };

    let complex_id = ComplexTypeId(model.complex_types.len());

    debug!(ty = %entity.name, "discovered complex type");

    for other in model.entities.values_mut() {
        let (converted, kept) = other
            .navigations
            .drain(..)
            .partition::<Vec<_>, _>(|navigation| navigation.target == id);
        other.navigations = kept;

        for navigation in converted {
            other.properties.push(Property::new(
                &navigation.name,
                PropertyTy::Complex(complex_id),
                false,
                navigation.index,
            ));
        }

        other.properties.sort_by_key(|property| property.index);
    }

    model.complex_types.insert(
        complex_id,
        ComplexType {
            id: complex_id,
            name: entity.name,
            properties: entity.properties,
        },
    );
}
