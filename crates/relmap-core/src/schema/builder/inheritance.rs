use crate::schema::app::{self, Constraint, EntityId, EntityType, Multiplicity};
use crate::schema::config::{ConditionConfiguration, MappingConfiguration};
use crate::schema::{BuildOptions, ConfigurationStore, TableName};
use crate::Result;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Where every entity type's rows are stored: the outcome of choosing an
/// inheritance strategy per type and folding types into tables.
#[derive(Debug, Default)]
pub(super) struct Plan {
    pub(super) tables: Vec<PlannedTable>,

    /// In hierarchy pre-order, so base types precede derived types
    pub(super) entities: IndexMap<EntityId, EntityPlan>,
}

#[derive(Debug)]
pub(super) struct PlannedTable {
    pub(super) name: TableName,
    pub(super) fixed: bool,

    /// First entity stored in the table
    pub(super) owner: EntityId,
}

#[derive(Debug)]
pub(super) struct EntityPlan {
    pub(super) strategy: Strategy,
    pub(super) fragments: Vec<FragmentPlan>,

    /// The primary key columns keep the key property's store-generated
    /// pattern
    pub(super) key_store_generated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Strategy {
    /// Hierarchy root with its own table
    Root,

    /// Stored in the table of `host`, told apart by a discriminator
    Tph { host: EntityId },

    /// Own table holding the declared properties, keyed by the parent's key
    Tpt { parent: EntityId },

    /// Own table holding every property, inherited ones included
    Tpc,

    /// Abstract type without any table
    Unmapped,
}

#[derive(Debug)]
pub(super) struct FragmentPlan {
    /// Index into [`Plan::tables`]
    pub(super) table: usize,

    /// `None` holds every property not listed by another fragment
    pub(super) properties: Option<Vec<String>>,

    pub(super) column_names: IndexMap<String, String>,

    pub(super) conditions: Vec<ConditionConfiguration>,
}

impl Plan {
    pub(super) fn entity(&self, id: EntityId) -> &EntityPlan {
        self.entities.get(&id).expect("invalid entity ID")
    }
}

impl EntityPlan {
    /// Properties listed by any fragment.
    pub(super) fn listed(&self) -> HashSet<&str> {
        self.fragments
            .iter()
            .filter_map(|fragment| fragment.properties.as_ref())
            .flatten()
            .map(String::as_str)
            .collect()
    }
}

struct Planner<'a> {
    model: &'a app::Schema,
    config: &'a ConfigurationStore,
    options: &'a BuildOptions,
    strategies: IndexMap<EntityId, Strategy>,
    own_tables: HashMap<EntityId, (TableName, bool)>,
    plan: Plan,
    table_keys: HashMap<String, usize>,
}

pub(super) fn plan(model: &app::Schema, config: &ConfigurationStore, options: &BuildOptions) -> Result<Plan> {
    let mut planner = Planner {
        model,
        config,
        options,
        strategies: IndexMap::new(),
        own_tables: HashMap::new(),
        plan: Plan::default(),
        table_keys: HashMap::new(),
    };

    for root in model.entities().filter(|entity| entity.is_root()) {
        for id in model.hierarchy(root.id) {
            planner.choose_strategy(model.entity(id))?;
        }
    }

    planner.check_tpc_siblings()?;
    planner.drop_unused_abstract_tables()?;

    for (id, strategy) in planner.strategies.clone() {
        let plan = planner.entity_plan(model.entity(id), strategy)?;
        planner.plan.entities.insert(id, plan);
    }

    debug!(tables = planner.plan.tables.len(), "planned inheritance");

    Ok(planner.plan)
}

impl<'a> Planner<'a> {
    fn choose_strategy(&mut self, entity: &EntityType) -> Result<()> {
        let own_table = self.own_table(entity);

        let strategy = match entity.base {
            None => Strategy::Root,
            Some(base) => {
                let host = self.host_of(base);
                let maps_inherited = self
                    .config
                    .entity_config(&entity.name)
                    .is_some_and(|config| config.maps_inherited_properties());

                match &own_table {
                    _ if maps_inherited => {
                        if own_table.is_none() {
                            return Err(model_err!(UnsupportedTablePerConcreteMapping, entity.name));
                        }
                        Strategy::Tpc
                    }
                    Some((name, _)) if Some(name.key()) != self.own_tables.get(&host).map(|(host, _)| host.key()) => {
                        Strategy::Tpt { parent: base }
                    }
                    // Rows of a table-per-concrete-type table belong to one type
                    _ if self.strategies.get(&host) == Some(&Strategy::Tpc) => {
                        return Err(model_err!(UnsupportedTablePerConcreteMapping, entity.name));
                    }
                    _ => Strategy::Tph { host },
                }
            }
        };

        if !matches!(strategy, Strategy::Tph { .. }) {
            if let Some(table) = own_table {
                self.own_tables.insert(entity.id, table);
            }
        }

        self.strategies.insert(entity.id, strategy);
        Ok(())
    }

    /// The table a type names for itself. Derived types only get one when
    /// it was configured.
    fn own_table(&self, entity: &EntityType) -> Option<(TableName, bool)> {
        let (name, fixed) = match &entity.table {
            Some(table) if entity.is_root() || table.is_configured() => (table.value.clone(), table.is_configured()),
            None if entity.is_root() => (TableName::new(&entity.name), false),
            _ => return None,
        };

        let name = match &self.options.table_name_prefix {
            Some(prefix) if !fixed => TableName {
                name: format!("{prefix}{}", name.name),
                ..name
            },
            _ => name,
        };

        Some((name.or_schema(&self.options.default_schema), fixed))
    }

    /// The type whose table stores rows of `id`.
    fn host_of(&self, id: EntityId) -> EntityId {
        match self.strategies.get(&id) {
            Some(Strategy::Tph { host }) => *host,
            _ => id,
        }
    }

    /// A table-per-concrete-type type cannot sit next to concrete siblings
    /// that share their parent's table.
    fn check_tpc_siblings(&self) -> Result<()> {
        for (id, strategy) in &self.strategies {
            let (Strategy::Tpc, Some(base)) = (strategy, self.model.entity(*id).base) else {
                continue;
            };

            let mixed = self.model.derived(base).into_iter().any(|sibling| {
                matches!(self.strategies[&sibling], Strategy::Tph { .. }) && !self.model.entity(sibling).is_abstract
            });

            if mixed {
                return Err(model_err!(UnsupportedTablePerConcreteMapping, self.model.entity(*id).name));
            }
        }

        Ok(())
    }

    /// An abstract type owning a table that stores no concrete type loses
    /// the table. When the table was configured this is an error.
    fn drop_unused_abstract_tables(&mut self) -> Result<()> {
        let owners: Vec<EntityId> = self
            .strategies
            .iter()
            .filter(|(id, strategy)| {
                self.model.entity(**id).is_abstract
                    && matches!(strategy, Strategy::Root | Strategy::Tpt { .. } | Strategy::Tpc)
            })
            .map(|(id, _)| *id)
            .collect();

        for owner in owners {
            let used = self.model.hierarchy(owner).into_iter().skip(1).any(|id| {
                match self.strategies[&id] {
                    Strategy::Tph { host } => host == owner && !self.model.entity(id).is_abstract,
                    Strategy::Tpt { parent } => self.host_of(parent) == owner,
                    _ => false,
                }
            });

            if used {
                continue;
            }

            if let Some((name, true)) = self.own_tables.get(&owner) {
                return Err(model_err!(OrphanedConfiguredTableDetected, name));
            }

            debug!(entity = %self.model.entity(owner).name, "abstract type has no table");

            self.own_tables.remove(&owner);
            self.strategies.insert(owner, Strategy::Unmapped);

            for id in self.model.hierarchy(owner) {
                if self.strategies[&id] == (Strategy::Tph { host: owner }) {
                    self.strategies.insert(id, Strategy::Unmapped);
                }
            }
        }

        Ok(())
    }

    fn entity_plan(&mut self, entity: &EntityType, strategy: Strategy) -> Result<EntityPlan> {
        let mappings: &[MappingConfiguration] = self
            .config
            .entity_config(&entity.name)
            .map(|config| &config.mappings[..])
            .unwrap_or(&[]);

        let mut conditions = vec![];
        let mut column_names = IndexMap::new();

        for mapping in mappings.iter().filter(|mapping| mapping.properties.is_none()) {
            conditions.extend(mapping.conditions.iter().cloned());
            column_names.extend(mapping.column_names.clone());
        }

        let mut fragments = vec![];

        match strategy {
            Strategy::Unmapped => {}
            Strategy::Tph { host } => {
                let Some(table) = self.table_of(host) else {
                    return Err(model_err!(UnsupportedTablePerConcreteMapping, entity.name));
                };
                fragments.push(FragmentPlan {
                    table,
                    properties: None,
                    column_names,
                    conditions,
                });
            }
            Strategy::Root | Strategy::Tpt { .. } | Strategy::Tpc => {
                let Some((own_name, own_fixed)) = self.own_tables.get(&entity.id).cloned() else {
                    return Err(model_err!(UnsupportedTablePerConcreteMapping, entity.name));
                };

                let listed: Vec<&MappingConfiguration> =
                    mappings.iter().filter(|mapping| mapping.properties.is_some()).collect();

                let has_catch_all = listed.len() < mappings.len()
                    || self
                        .config
                        .entity_config(&entity.name)
                        .is_some_and(|config| config.table.is_some());

                if listed.is_empty() || has_catch_all {
                    let table = self.register(&own_name, own_fixed, entity.id)?;
                    fragments.push(FragmentPlan {
                        table,
                        properties: None,
                        column_names,
                        conditions,
                    });
                }

                for mapping in listed {
                    let (name, fixed) = match &mapping.table {
                        Some(name) => (name.clone().or_schema(&self.options.default_schema), true),
                        None => (own_name.clone(), own_fixed),
                    };

                    let table = self.register(&name, fixed, entity.id)?;
                    fragments.push(FragmentPlan {
                        table,
                        properties: mapping.properties.clone(),
                        column_names: mapping.column_names.clone(),
                        conditions: mapping.conditions.clone(),
                    });
                }

                self.check_split_properties(entity, strategy, &fragments)?;
            }
        }

        let key_store_generated = match strategy {
            Strategy::Root => true,
            Strategy::Tpc => self.tpc_keeps_identity(entity, &fragments),
            _ => false,
        };

        Ok(EntityPlan {
            strategy,
            fragments,
            key_store_generated,
        })
    }

    /// The primary table of a type planned earlier.
    fn table_of(&self, id: EntityId) -> Option<usize> {
        self.plan
            .entities
            .get(&id)
            .and_then(|plan| plan.fragments.first())
            .map(|fragment| fragment.table)
    }

    fn register(&mut self, name: &TableName, fixed: bool, owner: EntityId) -> Result<usize> {
        let key = name.key();

        if let Some(index) = self.table_keys.get(&key).copied() {
            let existing = self.plan.tables[index].owner;
            let (a, b) = (self.model.root_of(existing), self.model.root_of(owner));

            if a != b && !self.shares_key(a, b) {
                return Err(model_err!(
                    InvalidTableSplitting,
                    name,
                    self.model.entity(existing).name,
                    self.model.entity(owner).name
                ));
            }

            self.plan.tables[index].fixed |= fixed;
            return Ok(index);
        }

        let index = self.plan.tables.len();
        self.plan.tables.push(PlannedTable {
            name: name.clone(),
            fixed,
            owner,
        });
        self.table_keys.insert(key, index);

        Ok(index)
    }

    /// Two hierarchies may share a table when a required one-to-one
    /// association relates their keys.
    fn shares_key(&self, a: EntityId, b: EntityId) -> bool {
        self.model.associations().any(|association| {
            let Constraint::ForeignKey(fk) = &association.constraint else {
                return false;
            };

            let ends = [association.source.entity, association.target.entity];
            let dependent = association.end(fk.dependent);
            let principal = association.end(fk.dependent.other());

            (ends == [a, b] || ends == [b, a])
                && principal.multiplicity == Multiplicity::One
                && dependent.multiplicity == Multiplicity::One
                && fk.dependent_properties == self.model.key_of(dependent.entity)
        })
    }

    /// Listed properties must exist and belong to exactly one fragment;
    /// without a catch-all fragment every property must be listed.
    fn check_split_properties(&self, entity: &EntityType, strategy: Strategy, fragments: &[FragmentPlan]) -> Result<()> {
        let candidates: Vec<&str> = match strategy {
            Strategy::Tpc => self
                .model
                .all_properties(entity.id)
                .into_iter()
                .map(|property| property.name.as_str())
                .collect(),
            _ => entity.properties.iter().map(|property| property.name.as_str()).collect(),
        };

        let key = self.model.key_of(entity.id);
        let mut seen = HashSet::new();

        for fragment in fragments {
            let Some(properties) = &fragment.properties else {
                continue;
            };

            for name in properties {
                if !candidates.contains(&name.as_str()) {
                    return Err(model_err!(NoSuchProperty, name, entity.name));
                }

                if !key.contains(name) && !seen.insert(name.as_str()) {
                    return Err(model_err!(ConflictingMapping, name, entity.name));
                }
            }
        }

        if fragments.iter().all(|fragment| fragment.properties.is_some()) {
            if let Some(name) = candidates
                .iter()
                .copied()
                .find(|name| !key.iter().any(|key| key == name) && !seen.contains(name))
            {
                return Err(model_err!(UnmappedProperty, name, entity.name));
            }
        }

        Ok(())
    }

    /// A table-per-concrete-type key keeps a configured store-generated
    /// pattern only along a single, unsplit chain of types.
    fn tpc_keeps_identity(&self, entity: &EntityType, fragments: &[FragmentPlan]) -> bool {
        let root = self.model.root_of(entity.id);
        let configured = self
            .model
            .key_properties(root)
            .iter()
            .all(|property| property.store_generated.as_ref().is_some_and(|facet| facet.is_configured()));

        let ancestors = self.model.ancestors(entity.id);

        configured
            && fragments.len() == 1
            && ancestors
                .iter()
                .skip(1)
                .all(|id| self.model.derived(*id).len() == 1)
            && !ancestors
                .iter()
                .any(|id| matches!(self.strategies.get(id), Some(Strategy::Tpt { .. })))
    }
}
