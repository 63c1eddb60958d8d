use super::draft::apply_config;
use super::inheritance::{EntityPlan, FragmentPlan, Plan, Strategy};
use crate::schema::app::{
    self, Association, AssociationEnd, ComplexTypeId, Constraint, DeleteBehavior, End, EntityId, EntityType,
    ForeignKeyConstraint, IndependentConstraint, Multiplicity, Property, PropertyTy,
};
use crate::schema::db::{self, Column, ColumnId, ColumnOrigin, ForeignKey, StoreGenerated, Table, TableId, Type};
use crate::schema::graph::ScalarType;
use crate::schema::mapping::{
    AssociationSetMapping, Condition, Discriminator, EntityMapping, Mapping, MappingFragment, PropertyBinding, Value,
};
use crate::schema::{BuildOptions, ConfigurationStore, TableName};
use crate::Result;
use indexmap::IndexMap;
use std::collections::HashSet;
use std_util::str::{eq_ignore_case, pluralize};
use tracing::warn;

/// Builds the store model and the mapping from the inheritance plan.
struct BuildTables<'a> {
    model: &'a app::Schema,
    config: &'a ConfigurationStore,
    plan: &'a Plan,
    options: &'a BuildOptions,
    db: db::Schema,
    mapping: Mapping,

    /// Foreign key properties of required associations, by declaring type
    required_foreign_keys: HashSet<(EntityId, String)>,
}

/// A column about to be added, with the property path it stores.
struct Pending {
    column: Column,
    path: Vec<String>,
    order: Option<i32>,
}

/// Where a property path of a fragment is stored.
enum Slot {
    Existing(ColumnId),
    New(usize),
}

pub(super) fn build(
    model: &app::Schema,
    config: &ConfigurationStore,
    plan: &Plan,
    options: &BuildOptions,
) -> Result<(db::Schema, Mapping)> {
    let tables = plan
        .tables
        .iter()
        .enumerate()
        .map(|(index, table)| Table::new(TableId(index), table.name.clone(), table.fixed))
        .collect();

    let mut cx = BuildTables {
        model,
        config,
        plan,
        options,
        db: db::Schema { tables },
        mapping: Mapping::default(),
        required_foreign_keys: required_foreign_keys(model),
    };

    for (id, entity_plan) in &plan.entities {
        cx.map_entity(model.entity(*id), entity_plan)?;
    }

    cx.map_discriminators()?;
    cx.map_inheritance_keys();

    for association in model.associations() {
        cx.map_association(association)?;
    }

    Ok((cx.db, cx.mapping))
}

fn required_foreign_keys(model: &app::Schema) -> HashSet<(EntityId, String)> {
    let mut ret = HashSet::new();

    for association in model.associations() {
        let Constraint::ForeignKey(fk) = &association.constraint else {
            continue;
        };

        if association.end(fk.dependent.other()).multiplicity != Multiplicity::One {
            continue;
        }

        let dependent = association.end(fk.dependent).entity;

        for name in &fk.dependent_properties {
            if let Some((declaring, _)) = model.find_property(dependent, name) {
                ret.insert((declaring, name.clone()));
            }
        }
    }

    ret
}

impl<'a> BuildTables<'a> {
    fn map_entity(&mut self, entity: &EntityType, plan: &EntityPlan) -> Result<()> {
        let mut mapping = EntityMapping::new(entity.id);
        mapping.is_hierarchy_mapping = entity.is_abstract && !plan.fragments.is_empty();

        let listed = plan.listed();
        let key = self.model.key_properties(entity.id);
        let derived = matches!(plan.strategy, Strategy::Tph { .. });

        let properties: Vec<&Property> = match plan.strategy {
            Strategy::Tpc => self.model.all_properties(entity.id),
            _ => entity.properties.iter().collect(),
        };

        for (index, fragment) in plan.fragments.iter().enumerate() {
            let table = TableId(fragment.table);
            let mut pending = vec![];
            let mut slots = vec![];

            let existing_key = self.db.table(table).primary_key.clone();

            if existing_key.is_empty() {
                for property in &key {
                    let (name, fixed) = self.column_name(fragment, property);
                    let mut column = self.scalar_column(property, name, fixed);
                    column.nullable = false;
                    column.primary_key = true;

                    if !(plan.key_store_generated && index == 0) {
                        column.store_generated = StoreGenerated::None;
                    }

                    slots.push((vec![property.name.clone()], Slot::New(pending.len())));
                    pending.push(Pending {
                        column,
                        path: vec![property.name.clone()],
                        order: property.column_order.as_ref().map(|order| order.value),
                    });
                }
            } else {
                if !derived {
                    self.check_shared_key(entity, table, &key, &existing_key)?;
                }

                for (property, column) in key.iter().zip(&existing_key) {
                    slots.push((vec![property.name.clone()], Slot::Existing(*column)));
                }
            }

            if derived {
                self.bind_inherited(entity, table, &mut slots);
            }

            let first_property = pending.len();

            for property in &properties {
                if key.iter().any(|key| key.name == property.name) {
                    continue;
                }

                let included = match &fragment.properties {
                    Some(names) => names.contains(&property.name),
                    None => !listed.contains(property.name.as_str()),
                };

                if included {
                    self.property_columns(entity, fragment, property, derived, &mut pending);
                }
            }

            for (index, pending) in pending.iter().enumerate().skip(first_property) {
                slots.push((pending.path.clone(), Slot::New(index)));
            }

            let ids = self.push_pending(table, &pending, existing_key.is_empty());

            let mut out = MappingFragment::new(table);

            for (path, slot) in slots {
                let column = match slot {
                    Slot::Existing(column) => column,
                    Slot::New(index) => ids[index],
                };
                out.properties.push(PropertyBinding { path, column });
            }

            mapping.fragments.push(out);
        }

        self.mapping.entities.insert(entity.id, mapping);
        Ok(())
    }

    /// Two hierarchies sharing a table must have matching keys.
    fn check_shared_key(
        &self,
        entity: &EntityType,
        table: TableId,
        key: &[&Property],
        existing: &[ColumnId],
    ) -> Result<()> {
        let table = self.db.table(table);

        let matches = key.len() == existing.len()
            && key
                .iter()
                .zip(existing)
                .all(|(property, column)| self.scalar_column(property, String::new(), false).ty == table.column(*column).ty);

        if !matches {
            let owner = self
                .plan
                .tables
                .get(table.id.0)
                .map(|planned| self.model.entity(planned.owner).name.as_str())
                .unwrap_or_default();

            return Err(model_err!(InvalidTableSplitting, table.name, owner, entity.name));
        }

        Ok(())
    }

    /// A type sharing its host's table also stores its inherited properties
    /// in the columns of its base type.
    fn bind_inherited(&self, entity: &EntityType, table: TableId, slots: &mut Vec<(Vec<String>, Slot)>) {
        let Some(base) = entity.base else {
            return;
        };

        let Some(base_mapping) = self.mapping.entities.get(&base) else {
            return;
        };

        for fragment in base_mapping.fragments.iter().filter(|fragment| fragment.table == table) {
            for binding in &fragment.properties {
                if slots.iter().any(|(path, _)| *path == binding.path) {
                    continue;
                }
                slots.push((binding.path.clone(), Slot::Existing(binding.column)));
            }
        }
    }

    fn column_name(&self, fragment: &FragmentPlan, property: &Property) -> (String, bool) {
        if let Some(name) = fragment.column_names.get(&property.name) {
            return (name.clone(), true);
        }

        match &property.column_name {
            Some(name) => (name.value.clone(), name.is_configured()),
            None => (property.name.clone(), false),
        }
    }

    fn property_columns(
        &self,
        entity: &EntityType,
        fragment: &FragmentPlan,
        property: &Property,
        derived: bool,
        pending: &mut Vec<Pending>,
    ) {
        let declaring = self
            .model
            .find_property(entity.id, &property.name)
            .map(|(id, _)| id)
            .unwrap_or(entity.id);

        match property.ty {
            PropertyTy::Scalar(_) => {
                let (name, fixed) = self.column_name(fragment, property);
                let mut column = self.scalar_column(property, name, fixed);

                let required = self.required_foreign_keys.contains(&(declaring, property.name.clone()));
                column.nullable = derived || (property.is_nullable() && !required);

                pending.push(Pending {
                    column,
                    path: vec![property.name.clone()],
                    order: property.column_order.as_ref().map(|order| order.value),
                });
            }
            PropertyTy::Complex(id) => {
                let declaring = &self.model.entity(declaring).name;
                self.complex_columns(declaring, fragment, vec![property.name.clone()], id, derived, pending);
            }
        }
    }

    /// Flattens a complex property into `{Property}_{Leaf}` columns.
    fn complex_columns(
        &self,
        declaring: &str,
        fragment: &FragmentPlan,
        path: Vec<String>,
        id: ComplexTypeId,
        derived: bool,
        pending: &mut Vec<Pending>,
    ) {
        let entity_config = self.config.entity_config(declaring);

        for leaf in &self.model.complex_type(id).properties {
            let mut path = path.clone();
            path.push(leaf.name.clone());

            match leaf.ty {
                PropertyTy::Complex(inner) => self.complex_columns(declaring, fragment, path, inner, derived, pending),
                PropertyTy::Scalar(_) => {
                    let dotted = path.join(".");
                    let mut property = leaf.clone();

                    if let Some(config) = entity_config.and_then(|config| config.properties.get(&dotted)) {
                        apply_config(&mut property, config);
                    }

                    let (name, fixed) = match fragment.column_names.get(&dotted) {
                        Some(name) => (name.clone(), true),
                        None => match &property.column_name {
                            Some(name) if name.is_configured() => (name.value.clone(), true),
                            _ => (path.join("_"), false),
                        },
                    };

                    let mut column = self.scalar_column(&property, name, fixed);
                    column.nullable = derived || property.is_nullable();

                    pending.push(Pending {
                        column,
                        order: property.column_order.as_ref().map(|order| order.value),
                        path,
                    });
                }
            }
        }
    }

    fn scalar_column(&self, property: &Property, name: String, fixed: bool) -> Column {
        let scalar = property.scalar_ty().unwrap_or(ScalarType::String);

        let ty = match &property.column_type {
            Some(ty) => Type::parse(&ty.value),
            None if property.row_version => Type::RowVersion,
            None => Type::from_scalar(scalar),
        };

        let mut column = Column::new(ColumnId::placeholder(), name, ty);
        column.nullable = property.is_nullable();
        column.max_length = property.max_length.as_ref().map(|len| len.value);
        column.fixed_length = property.fixed_length.as_ref().is_some_and(|fixed| fixed.value);
        column.store_generated = property.store_generated();
        column.concurrency_token = property.concurrency_token || property.row_version;
        column.fixed_name = fixed;

        if let Some(precision) = &property.precision {
            column.precision = Some(precision.value.0);
            column.scale = Some(precision.value.1);
        }

        column
    }

    /// Adds pending columns in column order and returns their ids, aligned
    /// with `pending`. Primary key columns keep key order.
    fn push_pending(&mut self, table: TableId, pending: &[Pending], set_key: bool) -> Vec<ColumnId> {
        let mut order: Vec<usize> = (0..pending.len()).collect();
        order.sort_by_key(|index| (pending[*index].order.is_none(), pending[*index].order));

        let table = &mut self.db.tables[table.0];
        let mut ids = vec![ColumnId::placeholder(); pending.len()];

        for index in order {
            ids[index] = table.push_column(pending[index].column.clone());
        }

        if set_key {
            table.primary_key = pending
                .iter()
                .zip(&ids)
                .filter(|(pending, _)| pending.column.primary_key)
                .map(|(_, id)| *id)
                .collect();
        }

        ids
    }

    /// Adds the discriminator column of every table shared by several
    /// concrete types, or configured with conditions.
    fn map_discriminators(&mut self) -> Result<()> {
        let mut groups: IndexMap<EntityId, Vec<EntityId>> = IndexMap::new();

        for (id, plan) in &self.plan.entities {
            match plan.strategy {
                Strategy::Tph { host } => groups.entry(host).or_default().push(*id),
                Strategy::Unmapped => {}
                _ => groups.entry(*id).or_default().insert(0, *id),
            }
        }

        for (host, members) in groups {
            let concrete = members
                .iter()
                .filter(|id| !self.model.entity(**id).is_abstract)
                .count();

            let explicit: Vec<(EntityId, &Value, &str)> = members
                .iter()
                .filter_map(|id| Some((*id, self.plan.entity(*id).fragments.first()?)))
                .flat_map(|(id, fragment)| {
                    fragment
                        .conditions
                        .iter()
                        .map(move |condition| (id, &condition.value, condition.column.as_str()))
                })
                .collect();

            if concrete <= 1 && explicit.is_empty() {
                continue;
            }

            let Some(table) = self.mapping.entity(host).fragments.first().map(|fragment| fragment.table) else {
                continue;
            };

            let name = explicit
                .first()
                .map(|(_, _, column)| column.to_string())
                .unwrap_or_else(|| self.options.discriminator_column.clone());

            if let Some((id, _, column)) = explicit.iter().find(|(_, _, column)| !eq_ignore_case(column, &name)) {
                return Err(model_err!(ConflictingMapping, column, self.model.entity(*id).name));
            }

            let ty = match explicit.first() {
                Some((_, Value::I64(_), _)) => Type::Int,
                Some((_, Value::Bool(_), _)) => Type::Bit,
                _ => Type::NVarChar,
            };

            let mut values = IndexMap::new();
            let mut defaulted = false;

            for id in &members {
                let entity = self.model.entity(*id);

                match explicit.iter().find(|(member, _, _)| member == id) {
                    Some((_, value, _)) => {
                        values.insert(*id, (*value).clone());
                    }
                    None if !entity.is_abstract && ty.is_string() => {
                        defaulted = true;
                        values.insert(*id, Value::String(entity.name.clone()));
                    }
                    None => {}
                }
            }

            let nullable = defaulted && !explicit.is_empty();

            let mut column = Column::new(ColumnId::placeholder(), name, ty.clone());
            column.nullable = nullable;
            column.origin = ColumnOrigin::Discriminator;
            column.fixed_name = !explicit.is_empty();

            if ty.is_string() {
                column.max_length = Some(self.options.key_max_length);
            }

            let table_name = self.db.table(table).name.to_string();
            let column = self.db.tables[table.0].push_column(column);

            if nullable {
                warn!(table = %table_name, "discriminator column is nullable; configured and default values are mixed");
            }

            for (id, value) in &values {
                if let Some(fragment) = self.mapping.entity_mut(*id).fragments.first_mut() {
                    fragment.conditions.push(Condition {
                        column,
                        value: value.clone(),
                    });
                }
            }

            self.mapping.discriminators.push(Discriminator {
                entity: host,
                table,
                column,
                nullable,
                values,
            });
        }

        Ok(())
    }

    /// Foreign keys from a derived type's own table to its parent's table,
    /// and from secondary fragments to the primary one.
    fn map_inheritance_keys(&mut self) {
        let mut keys = vec![];

        for (id, plan) in &self.plan.entities {
            let entity = self.model.entity(*id);
            let mapping = self.mapping.entity(*id);

            let Some(primary) = mapping.fragments.first() else {
                continue;
            };

            let key = self.model.key_of(*id);

            if let Strategy::Tpt { parent } = plan.strategy {
                if let Some(parent_fragment) = self.mapping.entity(parent).fragments.first() {
                    keys.push((
                        primary.table,
                        ForeignKey {
                            name: format!("{}_TypeConstraint", entity.name),
                            columns: key_columns(primary, key),
                            principal_table: parent_fragment.table,
                            principal_columns: key_columns(parent_fragment, key),
                            cascade_delete: false,
                        },
                    ));
                }
            }

            for fragment in mapping.fragments.iter().skip(1).filter(|fragment| fragment.table != primary.table) {
                keys.push((
                    fragment.table,
                    ForeignKey {
                        name: format!("{}_{}", entity.name, self.db.table(fragment.table).name.name),
                        columns: key_columns(fragment, key),
                        principal_table: primary.table,
                        principal_columns: key_columns(primary, key),
                        cascade_delete: false,
                    },
                ));
            }
        }

        for (table, fk) in keys {
            self.db.tables[table.0].foreign_keys.push(fk);
        }
    }

    fn map_association(&mut self, association: &Association) -> Result<()> {
        match &association.constraint {
            Constraint::ForeignKey(fk) => self.map_foreign_key(association, fk),
            Constraint::Independent(ia) => match ia.dependent {
                Some(dependent) => self.map_independent(association, ia, dependent),
                None => self.map_join_table(association, ia),
            },
        }
    }

    fn map_foreign_key(&mut self, association: &Association, fk: &ForeignKeyConstraint) -> Result<()> {
        let dependent = association.end(fk.dependent);
        let principal = association.end(fk.dependent.other());

        let columns = self.columns_of(dependent.entity, &fk.dependent_properties)?;
        let principal_columns = self.columns_of(principal.entity, &fk.principal_properties)?;

        // Types sharing a table share their key columns.
        if columns == principal_columns {
            return Ok(());
        }

        let (Some(table), Some(principal_table)) = (columns.first(), principal_columns.first()) else {
            return Ok(());
        };

        let (table, principal_table) = (table.table, principal_table.table);

        self.db.tables[table.0].foreign_keys.push(ForeignKey {
            name: association.name.clone(),
            columns,
            principal_table,
            principal_columns,
            cascade_delete: principal.delete_behavior == DeleteBehavior::Cascade,
        });

        Ok(())
    }

    /// Adds `{Navigation}_{PrincipalKey}` columns to the dependent's table.
    fn map_independent(&mut self, association: &Association, ia: &IndependentConstraint, dependent_end: End) -> Result<()> {
        let dependent = association.end(dependent_end);
        let principal = association.end(dependent_end.other());

        let principal_key = self.model.key_of(principal.entity);
        let principal_columns = self.columns_of(principal.entity, principal_key)?;
        let dependent_columns = self.columns_of(dependent.entity, self.model.key_of(dependent.entity))?;

        let Some(table) = dependent_columns.first().map(|column| column.table) else {
            return Err(model_err!(UnsupportedTablePerConcreteMapping, self.model.entity(dependent.entity).name));
        };

        let prefix = dependent
            .navigation
            .clone()
            .unwrap_or_else(|| self.model.entity(principal.entity).name.clone());

        let nullable = principal.multiplicity != Multiplicity::One
            || matches!(self.plan.entity(dependent.entity).strategy, Strategy::Tph { .. });

        let mut columns = vec![];

        for (index, (key, principal_column)) in principal_key.iter().zip(&principal_columns).enumerate() {
            let (name, fixed) = match ia.key_columns.get(index) {
                Some(name) => (name.clone(), true),
                None => (format!("{prefix}_{key}"), false),
            };

            let mut column = Column::new(ColumnId::placeholder(), name, Type::Int);
            column.copy_type_of(self.db.column(*principal_column));
            column.nullable = nullable;
            column.origin = ColumnOrigin::AssociationKey;
            column.fixed_name = fixed;

            columns.push(self.db.tables[table.0].push_column(column));
        }

        self.db.tables[table.0].foreign_keys.push(ForeignKey {
            name: association.name.clone(),
            columns: columns.clone(),
            principal_table: principal_columns.first().map(|column| column.table).unwrap_or(table),
            principal_columns,
            cascade_delete: principal.delete_behavior == DeleteBehavior::Cascade,
        });

        let (source_columns, target_columns) = match dependent_end {
            End::Source => (dependent_columns, columns),
            End::Target => (columns, dependent_columns),
        };

        self.mapping.associations.push(AssociationSetMapping {
            association: association.id,
            table,
            source_columns,
            target_columns,
        });

        Ok(())
    }

    /// Stores a many-to-many association in a join table keyed by both ends.
    fn map_join_table(&mut self, association: &Association, ia: &IndependentConstraint) -> Result<()> {
        let source = &association.source;
        let target = &association.target;

        let source_columns = self.columns_of(source.entity, self.model.key_of(source.entity))?;
        let target_columns = self.columns_of(target.entity, self.model.key_of(target.entity))?;

        let (name, fixed) = match &ia.join_table {
            Some(name) => (name.clone().or_schema(&self.options.default_schema), true),
            None => {
                let target_set = self
                    .model
                    .entity_set_for(target.entity)
                    .map(|set| set.name.clone())
                    .unwrap_or_else(|| pluralize(&self.model.entity(target.entity).name));

                let prefix = self.options.table_name_prefix.as_deref().unwrap_or_default();
                let name = format!("{prefix}{}{target_set}", self.model.entity(source.entity).name);

                (TableName::new(name).or_schema(&self.options.default_schema), false)
            }
        };

        let id = TableId(self.db.tables.len());
        let mut table = Table::new(id, name, fixed);

        let join_source = self.join_columns(association, &mut table, source, &source_columns, &ia.source_keys)?;
        let join_target = self.join_columns(association, &mut table, target, &target_columns, &ia.target_keys)?;

        table.primary_key = join_source.iter().chain(&join_target).copied().collect();

        for (suffix, columns, principal_columns) in [
            ("Source", &join_source, &source_columns),
            ("Target", &join_target, &target_columns),
        ] {
            table.foreign_keys.push(ForeignKey {
                name: format!("{}_{suffix}", association.name),
                columns: columns.clone(),
                principal_table: principal_columns.first().map(|column| column.table).unwrap_or(id),
                principal_columns: principal_columns.clone(),
                cascade_delete: ia.cascade_delete,
            });
        }

        self.db.tables.push(table);

        self.mapping.associations.push(AssociationSetMapping {
            association: association.id,
            table: id,
            source_columns: join_source,
            target_columns: join_target,
        });

        Ok(())
    }

    fn join_columns(
        &self,
        association: &Association,
        table: &mut Table,
        end: &AssociationEnd,
        principal_columns: &[ColumnId],
        explicit: &[String],
    ) -> Result<Vec<ColumnId>> {
        let entity = self.model.entity(end.entity);
        let key = self.model.key_of(end.entity);

        if !explicit.is_empty() && explicit.len() != key.len() {
            return Err(model_err!(
                ForeignKeyArityMismatch,
                association.source.navigation.as_deref().unwrap_or_default(),
                entity.name,
                key.len(),
                explicit.len()
            ));
        }

        let mut columns = vec![];

        for (index, (key, principal_column)) in key.iter().zip(principal_columns).enumerate() {
            let (name, fixed) = match explicit.get(index) {
                Some(name) => (name.clone(), true),
                None => (format!("{}_{key}", entity.name), false),
            };

            let mut column = Column::new(ColumnId::placeholder(), name, Type::Int);
            column.copy_type_of(self.db.column(*principal_column));
            column.primary_key = true;
            column.origin = ColumnOrigin::AssociationKey;
            column.fixed_name = fixed;

            columns.push(table.push_column(column));
        }

        Ok(columns)
    }

    /// Columns storing the named properties of an entity type.
    fn columns_of(&self, entity: EntityId, properties: &[String]) -> Result<Vec<ColumnId>> {
        properties
            .iter()
            .map(|name| {
                self.property_column(entity, name)
                    .ok_or_else(|| model_err!(UnsupportedTablePerConcreteMapping, self.model.entity(entity).name))
            })
            .collect()
    }

    fn property_column(&self, entity: EntityId, name: &str) -> Option<ColumnId> {
        let (declaring, _) = self.model.find_property(entity, name)?;

        [entity, declaring]
            .iter()
            .filter_map(|id| self.mapping.entities.get(id))
            .find_map(|mapping| mapping.column_for(&[name]))
    }
}

fn key_columns(fragment: &MappingFragment, key: &[String]) -> Vec<ColumnId> {
    key.iter()
        .filter_map(|name| {
            fragment
                .properties
                .iter()
                .find(|binding| binding.path.len() == 1 && binding.path[0] == *name)
                .map(|binding| binding.column)
        })
        .collect()
}
