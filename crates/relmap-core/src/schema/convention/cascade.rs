use super::{Convention, ConventionContext, Phase};
use crate::schema::app::{self, Constraint, DeleteBehavior, Multiplicity, Source};

/// Deletes dependents with their principal when the relationship is
/// required: every foreign key property is non-nullable, or for an
/// independent association the principal end is `One`.
#[derive(Debug)]
pub struct OneToManyCascadeDelete;

/// Deletes join table rows with either end of a many-to-many association.
#[derive(Debug)]
pub struct ManyToManyCascadeDelete;

impl Convention for OneToManyCascadeDelete {
    fn name(&self) -> &str {
        "OneToManyCascadeDelete"
    }

    fn phase(&self) -> Phase {
        Phase::Association
    }

    fn apply(&self, model: &mut app::Schema, _cx: &mut ConventionContext<'_>) {
        let mut decisions = vec![];

        for association in model.associations() {
            if association.cascade_source.is_some() {
                continue;
            }

            let (Some(principal), Some(dependent)) = (association.principal_end(), association.dependent()) else {
                continue;
            };

            let cascade = match &association.constraint {
                Constraint::ForeignKey(fk) => fk.dependent_properties.iter().all(|name| {
                    model
                        .find_property(dependent.entity, name)
                        .is_some_and(|(_, property)| !property.is_nullable())
                }),
                Constraint::Independent(_) => association.end(principal).multiplicity == Multiplicity::One,
            };

            decisions.push((association.id, principal, cascade));
        }

        for (id, principal, cascade) in decisions {
            let association = &mut model.associations[&id];
            association.cascade_source = Some(Source::Convention);
            association.end_mut(principal).delete_behavior = if cascade {
                DeleteBehavior::Cascade
            } else {
                DeleteBehavior::None
            };
        }
    }
}

impl Convention for ManyToManyCascadeDelete {
    fn name(&self) -> &str {
        "ManyToManyCascadeDelete"
    }

    fn phase(&self) -> Phase {
        Phase::Association
    }

    fn apply(&self, model: &mut app::Schema, _cx: &mut ConventionContext<'_>) {
        for association in model.associations.values_mut() {
            if association.cascade_source.is_some() || !association.is_many_to_many() {
                continue;
            }

            if let Constraint::Independent(ia) = &mut association.constraint {
                ia.cascade_delete = true;
                association.cascade_source = Some(Source::Convention);
            }
        }
    }
}
