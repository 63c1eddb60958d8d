use super::{Convention, ConventionContext, Phase};
use crate::schema::app::{self, Constraint, End, ForeignKeyConstraint, Multiplicity, Source};
use std_util::str::eq_ignore_case;
use tracing::trace;

/// Finds foreign key properties of one-to-many associations by name.
///
/// The patterns are tried in order: `{Navigation}{PrincipalKey}`,
/// `{PrincipalType}{PrincipalKey}` and `{PrincipalKey}`. Every key property
/// must match a dependent property of the same scalar type. A match makes
/// the association a foreign key association, and when the principal end's
/// multiplicity was not configured it follows the nullability of the
/// matched properties.
#[derive(Debug)]
pub struct ForeignKeyDiscovery;

impl Convention for ForeignKeyDiscovery {
    fn name(&self) -> &str {
        "ForeignKeyDiscovery"
    }

    fn phase(&self) -> Phase {
        Phase::Association
    }

    fn apply(&self, model: &mut app::Schema, _cx: &mut ConventionContext<'_>) {
        let ids: Vec<_> = model.associations.keys().copied().collect();

        for id in ids {
            let association = model.association(id);

            if association.constraint_source != Source::Convention || association.foreign_key().is_some() {
                continue;
            }

            let Some(dependent_end) = association.dependent_end() else {
                continue;
            };

            let dependent = association.end(dependent_end);
            let principal = association.end(dependent_end.other());

            if !dependent.multiplicity.is_many() || principal.multiplicity.is_many() {
                continue;
            }

            let Some(properties) = discover(model, dependent_end, id) else {
                continue;
            };

            let principal_key = model.key_of(principal.entity).to_vec();

            let nullable = properties.iter().any(|name| {
                model
                    .find_property(dependent.entity, name)
                    .is_some_and(|(_, property)| property.is_nullable())
            });

            trace!(association = %association.name, ?properties, "discovered foreign key");

            let association = &mut model.associations[&id];
            association.constraint = Constraint::ForeignKey(ForeignKeyConstraint {
                dependent: dependent_end,
                dependent_properties: properties,
                principal_properties: principal_key,
            });

            let principal = association.end_mut(dependent_end.other());
            if principal.multiplicity_source == Source::Convention {
                principal.multiplicity = if nullable {
                    Multiplicity::ZeroOrOne
                } else {
                    Multiplicity::One
                };
            }
        }
    }
}

fn discover(model: &app::Schema, dependent_end: End, id: app::AssociationId) -> Option<Vec<String>> {
    let association = model.association(id);
    let dependent = association.end(dependent_end);
    let principal = association.end(dependent_end.other());

    let principal_entity = model.entity(principal.entity);
    let principal_key: Vec<_> = model.key_properties(principal.entity);

    if principal_key.is_empty() {
        return None;
    }

    let dependent_key = model.key_of(dependent.entity);
    let candidates = model.all_properties(dependent.entity);

    let mut prefixes = vec![];
    if let Some(navigation) = &dependent.navigation {
        prefixes.push(navigation.as_str());
    }
    prefixes.push(principal_entity.name.as_str());
    prefixes.push("");

    for prefix in prefixes {
        let matched: Option<Vec<String>> = principal_key
            .iter()
            .map(|key| {
                let expected = format!("{prefix}{}", key.name);

                candidates
                    .iter()
                    .find(|property| {
                        eq_ignore_case(&property.name, &expected)
                            && property.scalar_ty().is_some()
                            && property.scalar_ty() == key.scalar_ty()
                    })
                    .map(|property| property.name.clone())
            })
            .collect();

        let Some(matched) = matched else {
            continue;
        };

        // Matching the dependent's own key would turn the association into
        // a one-to-one.
        if matched.len() == dependent_key.len() && matched.iter().all(|name| dependent_key.contains(name)) {
            continue;
        }

        return Some(matched);
    }

    None
}
