use super::{Convention, ConventionContext, Phase};
use crate::schema::app::{self, EntityId, Facet};
use std::collections::HashSet;

/// Pairs two navigations as inverses of each other when each one's target
/// is the other's declaring type and neither has another candidate.
#[derive(Debug)]
pub struct NavigationInverseDiscovery;

type NavRef = (EntityId, String);

impl Convention for NavigationInverseDiscovery {
    fn name(&self) -> &str {
        "NavigationInverseDiscovery"
    }

    fn phase(&self) -> Phase {
        Phase::Discovery
    }

    fn apply(&self, model: &mut app::Schema, cx: &mut ConventionContext<'_>) {
        let claimed = claimed(model, cx);

        let candidates = |(entity, name): &NavRef| -> Vec<NavRef> {
            let Some(navigation) = model.entity(*entity).navigation(name) else {
                return vec![];
            };
            let target = model.entity(navigation.target);

            target
                .navigations
                .iter()
                .filter(|other| other.target == *entity)
                .map(|other| (target.id, other.name.clone()))
                .filter(|other| other != &(*entity, name.clone()) && !claimed.contains(other))
                .collect()
        };

        let mut pairs = vec![];

        for entity in model.entities() {
            for navigation in &entity.navigations {
                let nav = (entity.id, navigation.name.clone());

                if claimed.contains(&nav) {
                    continue;
                }

                let found = candidates(&nav);
                let [other] = &found[..] else {
                    continue;
                };

                // Each pair is seen from both sides; keep the first.
                if *other < nav {
                    continue;
                }

                if candidates(other)[..] == [nav.clone()] {
                    pairs.push((nav.clone(), other.clone()));
                }
            }
        }

        for ((a, a_name), (b, b_name)) in pairs {
            if let Some(navigation) = model.entity_mut(a).navigation_mut(&a_name) {
                navigation.inverse = Some(Facet::convention(b_name.clone()));
            }
            if let Some(navigation) = model.entity_mut(b).navigation_mut(&b_name) {
                navigation.inverse = Some(Facet::convention(a_name));
            }
        }
    }
}

/// Navigations whose pairing is already decided by directives or
/// configuration.
fn claimed(model: &app::Schema, cx: &ConventionContext<'_>) -> HashSet<NavRef> {
    let mut claimed = HashSet::new();

    for entity in model.entities() {
        for navigation in &entity.navigations {
            let stated = cx.config.navigation(&entity.name, &navigation.name);

            if navigation.inverse.is_some() || stated.is_some_and(|config| config.inverse.is_some()) {
                claimed.insert((entity.id, navigation.name.clone()));
            }

            let named = navigation
                .inverse
                .as_ref()
                .map(|facet| facet.value.as_str())
                .or_else(|| stated.and_then(|config| config.inverse_navigation()));

            if let Some(inverse) = named {
                claimed.insert((navigation.target, inverse.to_string()));
            }
        }
    }

    claimed
}
