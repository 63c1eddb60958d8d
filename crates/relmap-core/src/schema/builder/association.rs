use crate::schema::app::{
    self, Association, AssociationEnd, AssociationId, Constraint, DeleteBehavior, End, EntityId, EntitySet,
    ForeignKeyConstraint, IndependentConstraint, Multiplicity, Navigation, Role, Source,
};
use crate::schema::config::{ConstraintConfiguration, Inverse, NavigationConfiguration};
use crate::schema::{ConfigurationStore, TableName};
use crate::{Error, Result};
use indexmap::IndexMap;
use std_util::str::pluralize;
use tracing::trace;

/// A navigation, identified by its declaring entity and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct NavRef {
    entity: EntityId,
    name: String,
}

/// One or two navigations forming a single association. `a` comes first in
/// canonical order and its declaring type is the source end.
#[derive(Debug)]
struct Pair {
    a: NavRef,
    b: Option<NavRef>,
}

/// A configuration statement about an association, normalized to the
/// source/target orientation of its pair.
#[derive(Debug, Default)]
struct Statement {
    source: Option<Multiplicity>,
    target: Option<Multiplicity>,
    principal: Option<End>,
    foreign_key: Option<Vec<String>>,
    mapping: Option<Mapping>,
    cascade_delete: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Mapping {
    key_columns: Vec<String>,
    table: Option<TableName>,
    source_keys: Vec<String>,
    target_keys: Vec<String>,
}

/// Outcome of merging two statements.
enum Merge {
    Agree(Statement),
    ConflictMultiplicity,
    ConflictConstraint,
    ConflictMapping,
}

/// Pairs navigations into associations and decides ends, multiplicities
/// and constraints. Every pair is resolved before failing so that all
/// conflicts are reported together.
pub(super) fn resolve(model: &mut app::Schema, config: &ConfigurationStore) -> Result<()> {
    let pairs = pair_navigations(model, config)?;
    let mut errors = vec![];

    for pair in pairs {
        let id = AssociationId(model.associations.len());

        let resolved = Resolve::new(model, config, &pair).resolve(id);

        match resolved {
            Ok(association) => {
                trace!(association = %association.name, constraint = ?association.constraint_source, "resolved association");

                link(model, &pair.a, id);
                if let Some(b) = &pair.b {
                    link(model, b, id);
                }

                model.associations.insert(id, association);
            }
            Err(err) => errors.push(err),
        }
    }

    Error::aggregate(errors)
}

/// One entity set per hierarchy root.
pub(super) fn build_entity_sets(model: &mut app::Schema) {
    model.entity_sets = model
        .entities()
        .filter(|entity| entity.is_root())
        .map(|entity| EntitySet {
            name: entity
                .entity_set_name
                .as_ref()
                .map(|name| name.value.clone())
                .unwrap_or_else(|| pluralize(&entity.name)),
            root: entity.id,
        })
        .collect();
}

fn link(model: &mut app::Schema, nav: &NavRef, id: AssociationId) {
    if let Some(navigation) = model.entity_mut(nav.entity).navigation_mut(&nav.name) {
        navigation.association = Some(id);
    }
}

/// Decides which navigations are inverses of each other. Explicit
/// configuration is applied first, then directive and convention facets on
/// the navigations that remain.
fn pair_navigations(model: &app::Schema, config: &ConfigurationStore) -> Result<Vec<Pair>> {
    let mut partners: IndexMap<NavRef, Option<NavRef>> = IndexMap::new();

    for entity in model.entities() {
        for navigation in &entity.navigations {
            let Some(nav_config) = config.navigation(&entity.name, &navigation.name) else {
                continue;
            };

            let nav = NavRef {
                entity: entity.id,
                name: navigation.name.clone(),
            };

            match &nav_config.inverse {
                Some(Inverse::Navigation(inverse)) => {
                    let target = model.entity(navigation.target);

                    if target.navigation(inverse).is_none() {
                        return Err(model_err!(NavigationPropertyNotFound, inverse, target.name));
                    }

                    let other = NavRef {
                        entity: target.id,
                        name: inverse.clone(),
                    };

                    for (from, to) in [(&nav, &other), (&other, &nav)] {
                        match partners.get(from) {
                            Some(Some(existing)) if existing != to => {
                                return Err(model_err!(ConflictingConstraint, from.name, model.entity(from.entity).name));
                            }
                            Some(None) => {
                                return Err(model_err!(ConflictingConstraint, from.name, model.entity(from.entity).name));
                            }
                            _ => {}
                        }
                    }

                    partners.insert(nav.clone(), Some(other.clone()));
                    partners.insert(other, Some(nav));
                }
                Some(Inverse::None) => {
                    if let Some(Some(_)) = partners.get(&nav) {
                        return Err(model_err!(ConflictingConstraint, nav.name, entity.name));
                    }
                    partners.insert(nav, None);
                }
                None => {}
            }
        }
    }

    for entity in model.entities() {
        for navigation in &entity.navigations {
            let nav = NavRef {
                entity: entity.id,
                name: navigation.name.clone(),
            };

            if partners.contains_key(&nav) {
                continue;
            }

            let Some(inverse) = &navigation.inverse else {
                continue;
            };

            let other = NavRef {
                entity: navigation.target,
                name: inverse.value.clone(),
            };

            if partners.contains_key(&other) {
                continue;
            }

            if model.entity(other.entity).navigation(&other.name).is_some() {
                partners.insert(nav.clone(), Some(other.clone()));
                partners.insert(other, Some(nav));
            }
        }
    }

    let mut pairs = vec![];
    let mut emitted = std::collections::HashSet::new();

    for entity in model.entities() {
        for navigation in &entity.navigations {
            let nav = NavRef {
                entity: entity.id,
                name: navigation.name.clone(),
            };

            if emitted.contains(&nav) {
                continue;
            }

            let b = partners.get(&nav).cloned().flatten();

            emitted.insert(nav.clone());
            if let Some(b) = &b {
                emitted.insert(b.clone());
            }

            pairs.push(Pair { a: nav, b });
        }
    }

    Ok(pairs)
}

struct Resolve<'a> {
    model: &'a app::Schema,
    pair: &'a Pair,
    a: &'a Navigation,
    b: Option<&'a Navigation>,
    a_config: Option<&'a NavigationConfiguration>,
    b_config: Option<&'a NavigationConfiguration>,
    source: EntityId,
    target: EntityId,
}

impl<'a> Resolve<'a> {
    fn new(model: &'a app::Schema, config: &'a ConfigurationStore, pair: &'a Pair) -> Self {
        let navigation = |nav: &NavRef| {
            model
                .entity(nav.entity)
                .navigation(&nav.name)
                .expect("invalid navigation")
        };

        let a = navigation(&pair.a);
        let b = pair.b.as_ref().map(navigation);

        Self {
            model,
            pair,
            a,
            b,
            a_config: config.navigation(&model.entity(pair.a.entity).name, &pair.a.name),
            b_config: pair
                .b
                .as_ref()
                .and_then(|b| config.navigation(&model.entity(b.entity).name, &b.name)),
            source: pair.a.entity,
            target: pair.b.as_ref().map(|b| b.entity).unwrap_or(a.target),
        }
    }

    fn resolve(&self, id: AssociationId) -> Result<Association> {
        let statement = self.statement()?;

        let (source, source_from) = match statement.source {
            Some(multiplicity) => (multiplicity, Source::Explicit),
            None => match self.b {
                Some(b) => default_multiplicity(b),
                None if self.a.collection => (Multiplicity::ZeroOrOne, Source::Convention),
                None => (Multiplicity::Many, Source::Convention),
            },
        };

        let (target, target_from) = match statement.target {
            Some(multiplicity) => (multiplicity, Source::Explicit),
            None => default_multiplicity(self.a),
        };

        let foreign_key = self.foreign_key(&statement)?;
        let principal = self.principal(source, target, &statement, foreign_key.as_ref())?;

        let mut association = Association {
            id,
            name: format!("{}_{}", self.model.entity(self.source).name, self.a.name),
            source: AssociationEnd {
                entity: self.source,
                multiplicity: source,
                multiplicity_source: source_from,
                navigation: Some(self.a.name.clone()),
                delete_behavior: DeleteBehavior::None,
            },
            target: AssociationEnd {
                entity: self.target,
                multiplicity: target,
                multiplicity_source: target_from,
                navigation: self.b.map(|b| b.name.clone()),
                delete_behavior: DeleteBehavior::None,
            },
            constraint: Constraint::Independent(IndependentConstraint::default()),
            constraint_source: Source::Convention,
            cascade_source: None,
        };

        match principal {
            None => {
                if foreign_key.is_some() {
                    return Err(self.blame(ErrorOn::Constraint));
                }

                let mapping = statement.mapping.clone().unwrap_or_default();

                association.constraint = Constraint::Independent(IndependentConstraint {
                    dependent: None,
                    key_columns: vec![],
                    join_table: mapping.table,
                    source_keys: mapping.source_keys,
                    target_keys: mapping.target_keys,
                    cascade_delete: false,
                });

                if statement.mapping.is_some() {
                    association.constraint_source = Source::Explicit;
                }
            }
            Some(principal) => {
                let dependent = principal.other();
                let principal_key = self.model.key_of(association.end(principal).entity).to_vec();

                if let Some((properties, from)) = foreign_key {
                    self.check_foreign_key(&association, dependent, &properties, principal_key.len())?;

                    let nullable = properties.iter().any(|name| {
                        self.model
                            .find_property(association.end(dependent).entity, name)
                            .is_some_and(|(_, property)| property.is_nullable())
                    });

                    let principal_end = association.end_mut(principal);
                    if principal_end.multiplicity_source == Source::Convention && !principal_end.multiplicity.is_many() {
                        principal_end.multiplicity = if nullable {
                            Multiplicity::ZeroOrOne
                        } else {
                            Multiplicity::One
                        };
                    }

                    association.constraint = Constraint::ForeignKey(ForeignKeyConstraint {
                        dependent,
                        dependent_properties: properties,
                        principal_properties: principal_key,
                    });
                    association.constraint_source = from;
                } else if let Some(mapping) = &statement.mapping {
                    if !mapping.key_columns.is_empty() && mapping.key_columns.len() != principal_key.len() {
                        return Err(model_err!(
                            ForeignKeyArityMismatch,
                            self.dependent_navigation(dependent),
                            self.model.entity(association.end(dependent).entity).name,
                            principal_key.len(),
                            mapping.key_columns.len()
                        ));
                    }

                    association.constraint = Constraint::Independent(IndependentConstraint {
                        dependent: Some(dependent),
                        key_columns: mapping.key_columns.clone(),
                        ..IndependentConstraint::default()
                    });
                    association.constraint_source = Source::Explicit;
                } else if association.end(principal).multiplicity == Multiplicity::One
                    && !association.end(dependent).multiplicity.is_many()
                {
                    // Required one-to-one: the dependent's key references
                    // the principal's key.
                    let dependent_key = self.model.key_of(association.end(dependent).entity).to_vec();

                    if dependent_key.len() != principal_key.len() {
                        return Err(model_err!(
                            ForeignKeyArityMismatch,
                            self.dependent_navigation(dependent),
                            self.model.entity(association.end(dependent).entity).name,
                            principal_key.len(),
                            dependent_key.len()
                        ));
                    }

                    association.constraint = Constraint::ForeignKey(ForeignKeyConstraint {
                        dependent,
                        dependent_properties: dependent_key,
                        principal_properties: principal_key,
                    });
                } else {
                    association.constraint = Constraint::Independent(IndependentConstraint {
                        dependent: Some(dependent),
                        ..IndependentConstraint::default()
                    });
                }
            }
        }

        if let Some(cascade) = statement.cascade_delete {
            match association.principal_end() {
                Some(principal) => {
                    association.end_mut(principal).delete_behavior = if cascade {
                        DeleteBehavior::Cascade
                    } else {
                        DeleteBehavior::None
                    };
                }
                None => {
                    if let Constraint::Independent(ia) = &mut association.constraint {
                        ia.cascade_delete = cascade;
                    }
                }
            }
            association.cascade_source = Some(Source::Explicit);
        }

        Ok(association)
    }

    /// Merges the statements made through either navigation.
    fn statement(&self) -> Result<Statement> {
        let a = self.a_config.map(|config| normalize(config, End::Source));
        let b = self.b_config.map(|config| normalize(config, End::Target));

        match (a, b) {
            (Some(a), Some(b)) => match merge(a, b) {
                Merge::Agree(statement) => Ok(statement),
                Merge::ConflictMultiplicity => Err(self.blame(ErrorOn::Multiplicity)),
                Merge::ConflictConstraint => Err(self.blame(ErrorOn::Constraint)),
                Merge::ConflictMapping => Err(self.blame(ErrorOn::Mapping)),
            },
            (Some(statement), None) | (None, Some(statement)) => Ok(statement),
            (None, None) => Ok(Statement::default()),
        }
    }

    /// Dependent properties named by configuration or directives.
    fn foreign_key(&self, statement: &Statement) -> Result<Option<(Vec<String>, Source)>> {
        if let Some(properties) = &statement.foreign_key {
            return Ok(Some((properties.clone(), Source::Explicit)));
        }

        let a = self.a.foreign_key.as_ref().map(|fk| &fk.value);
        let b = self.b.and_then(|b| b.foreign_key.as_ref()).map(|fk| &fk.value);

        match (a, b) {
            (Some(a), Some(b)) if a != b => Err(self.blame(ErrorOn::Constraint)),
            (Some(properties), _) | (None, Some(properties)) => Ok(Some((properties.clone(), Source::Directive))),
            (None, None) => Ok(None),
        }
    }

    fn principal(
        &self,
        source: Multiplicity,
        target: Multiplicity,
        statement: &Statement,
        foreign_key: Option<&(Vec<String>, Source)>,
    ) -> Result<Option<End>> {
        use Multiplicity::*;

        let implied = match (source, target) {
            (Many, Many) => {
                if statement.principal.is_some() {
                    return Err(self.blame(ErrorOn::Constraint));
                }
                return Ok(None);
            }
            (Many, _) | (ZeroOrOne, One) => Some(End::Target),
            (_, Many) | (One, ZeroOrOne) => Some(End::Source),
            (One, One) | (ZeroOrOne, ZeroOrOne) => None,
        };

        match (implied, statement.principal) {
            (Some(implied), Some(designated)) if implied != designated => Err(self.blame(ErrorOn::Constraint)),
            (Some(end), _) | (None, Some(end)) => Ok(Some(end)),
            (None, None) => {
                if let Some((properties, _)) = foreign_key {
                    let holds = |entity: EntityId| {
                        properties
                            .iter()
                            .all(|name| self.model.find_property(entity, name).is_some())
                    };

                    match (holds(self.source), holds(self.target)) {
                        (true, false) => return Ok(Some(End::Target)),
                        (false, true) => return Ok(Some(End::Source)),
                        _ => {}
                    }
                }

                let mut names = [
                    self.model.entity(self.source).name.as_str(),
                    self.model.entity(self.target).name.as_str(),
                ];
                names.sort();

                Err(model_err!(UnableToDeterminePrincipal, names[0], names[1]))
            }
        }
    }

    fn check_foreign_key(
        &self,
        association: &Association,
        dependent: End,
        properties: &[String],
        expected: usize,
    ) -> Result<()> {
        let entity = association.end(dependent).entity;
        let dependent_type = &self.model.entity(entity).name;

        for name in properties {
            let found = self
                .model
                .find_property(entity, name)
                .is_some_and(|(_, property)| property.scalar_ty().is_some());

            if !found {
                return Err(model_err!(ForeignKeyPropertyNotFound, name, dependent_type));
            }
        }

        if properties.len() != expected {
            return Err(model_err!(
                ForeignKeyArityMismatch,
                self.dependent_navigation(dependent),
                dependent_type,
                expected,
                properties.len()
            ));
        }

        Ok(())
    }

    /// Navigation declared on the dependent's type, or the other one when the
    /// dependent has none.
    fn dependent_navigation(&self, dependent: End) -> &str {
        match (dependent, self.b) {
            (End::Target, Some(b)) => &b.name,
            _ => &self.a.name,
        }
    }

    /// Conflicts are reported against the navigation whose statement was
    /// merged last.
    fn blame(&self, on: ErrorOn) -> Error {
        let nav = match (&self.pair.b, self.b_config) {
            (Some(b), Some(_)) => b,
            _ => &self.pair.a,
        };
        let ty = &self.model.entity(nav.entity).name;

        match on {
            ErrorOn::Multiplicity => model_err!(ConflictingMultiplicities, nav.name, ty),
            ErrorOn::Constraint => model_err!(ConflictingConstraint, nav.name, ty),
            ErrorOn::Mapping => model_err!(ConflictingMapping, nav.name, ty),
        }
    }
}

enum ErrorOn {
    Multiplicity,
    Constraint,
    Mapping,
}

/// Multiplicity of the end a navigation points at, when nothing is
/// configured.
fn default_multiplicity(navigation: &Navigation) -> (Multiplicity, Source) {
    if navigation.collection {
        (Multiplicity::Many, Source::Convention)
    } else if navigation.required {
        (Multiplicity::One, Source::Directive)
    } else {
        (Multiplicity::ZeroOrOne, Source::Convention)
    }
}

/// Rewrites a statement made on the navigation declared at `declaring` into
/// source/target orientation.
fn normalize(config: &NavigationConfiguration, declaring: End) -> Statement {
    // `has_*` sets the far end, `with_*` the declaring end.
    let (source, target) = match declaring {
        End::Source => (config.source_multiplicity, Some(config.target_multiplicity)),
        End::Target => (Some(config.target_multiplicity), config.source_multiplicity),
    };

    let principal = config.source_role.map(|role| match role {
        Role::Principal => declaring,
        Role::Dependent => declaring.other(),
    });

    let mut statement = Statement {
        source,
        target,
        principal,
        cascade_delete: config.cascade_delete,
        ..Statement::default()
    };

    match &config.constraint {
        Some(ConstraintConfiguration::ForeignKey(properties)) => statement.foreign_key = Some(properties.clone()),
        Some(ConstraintConfiguration::Independent(mapping)) => {
            let (source_keys, target_keys) = match declaring {
                End::Source => (mapping.left_keys.clone(), mapping.right_keys.clone()),
                End::Target => (mapping.right_keys.clone(), mapping.left_keys.clone()),
            };

            statement.mapping = Some(Mapping {
                key_columns: mapping.key_columns.clone(),
                table: mapping.table.clone(),
                source_keys,
                target_keys,
            });
        }
        None => {}
    }

    statement
}

fn merge(a: Statement, b: Statement) -> Merge {
    /// `None` when both sides are set and differ.
    fn agree<T: PartialEq>(a: Option<T>, b: Option<T>) -> Option<Option<T>> {
        match (a, b) {
            (Some(a), Some(b)) if a != b => None,
            (Some(value), _) | (None, Some(value)) => Some(Some(value)),
            (None, None) => Some(None),
        }
    }

    let (Some(source), Some(target)) = (agree(a.source, b.source), agree(a.target, b.target)) else {
        return Merge::ConflictMultiplicity;
    };

    let Some(principal) = agree(a.principal, b.principal) else {
        return Merge::ConflictConstraint;
    };

    let Some(cascade_delete) = agree(a.cascade_delete, b.cascade_delete) else {
        return Merge::ConflictConstraint;
    };

    let (foreign_key, mapping) = match (a.foreign_key, a.mapping, b.foreign_key, b.mapping) {
        (Some(_), _, _, Some(_)) | (_, Some(_), Some(_), _) => return Merge::ConflictConstraint,
        (Some(a), _, Some(b), _) if a != b => return Merge::ConflictConstraint,
        (Some(fk), _, _, _) | (_, _, Some(fk), _) => (Some(fk), None),
        (None, Some(a), None, Some(b)) => match merge_mapping(a, b) {
            Some(mapping) => (None, Some(mapping)),
            None => return Merge::ConflictMapping,
        },
        (None, mapping, None, None) | (None, None, None, mapping) => (None, mapping),
    };

    Merge::Agree(Statement {
        source,
        target,
        principal,
        foreign_key,
        mapping,
        cascade_delete,
    })
}

/// Combines the store mapping stated through both navigations. Unset parts
/// match anything.
fn merge_mapping(a: Mapping, b: Mapping) -> Option<Mapping> {
    fn columns(a: Vec<String>, b: Vec<String>) -> Option<Vec<String>> {
        match (a.is_empty(), b.is_empty()) {
            (_, true) => Some(a),
            (true, false) => Some(b),
            (false, false) if a == b => Some(a),
            _ => None,
        }
    }

    let table = match (a.table, b.table) {
        (Some(a), Some(b)) if a.key() != b.key() => return None,
        (Some(table), _) | (None, Some(table)) => Some(table),
        (None, None) => None,
    };

    let key_columns = columns(a.key_columns, b.key_columns)?;

    let keys = columns(a.source_keys.clone(), b.source_keys.clone())
        .zip(columns(a.target_keys.clone(), b.target_keys.clone()))
        // Both sides may name the keys from the configured entity's point
        // of view.
        .or_else(|| columns(a.source_keys, b.target_keys).zip(columns(a.target_keys, b.source_keys)));

    let (source_keys, target_keys) = keys?;

    Some(Mapping {
        key_columns,
        table,
        source_keys,
        target_keys,
    })
}
