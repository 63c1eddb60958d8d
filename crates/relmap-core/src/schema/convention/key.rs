use super::{Convention, ConventionContext, Phase};
use crate::schema::app::{self, EntityId, EntityType, Facet};
use std_util::str::eq_ignore_case;

/// Uses a property named `Id` or `{TypeName}Id` as the key of a hierarchy
/// root.
#[derive(Debug)]
pub struct KeyDiscovery;

impl Convention for KeyDiscovery {
    fn name(&self) -> &str {
        "KeyDiscovery"
    }

    fn phase(&self) -> Phase {
        Phase::Discovery
    }

    fn apply(&self, model: &mut app::Schema, cx: &mut ConventionContext<'_>) {
        let roots: Vec<EntityId> = model
            .entities()
            .filter(|entity| entity.is_root() && entity.key.is_none())
            .map(|entity| entity.id)
            .collect();

        for id in roots {
            let mut candidates = key_candidates(model.entity(id));

            match candidates.len() {
                0 => {}
                1 => model.entity_mut(id).key = Some(Facet::convention(candidates.split_off(0))),
                _ => cx.report_ambiguous_key(id, candidates),
            }
        }
    }
}

/// Scalar properties matching the first key pattern that matches at all.
pub(crate) fn key_candidates(entity: &EntityType) -> Vec<String> {
    for pattern in ["Id".to_string(), format!("{}Id", entity.name)] {
        let matches: Vec<String> = entity
            .properties
            .iter()
            .filter(|property| property.scalar_ty().is_some() && eq_ignore_case(&property.name, &pattern))
            .map(|property| property.name.clone())
            .collect();

        if !matches.is_empty() {
            return matches;
        }
    }

    vec![]
}
