use super::discover::Discovered;
use crate::schema::app::{
    self, ComplexType, ComplexTypeId, EntityId, EntityType, Facet, Navigation, Property, PropertyTy, Source,
};
use crate::schema::config::{EntityConfiguration, PropertyConfiguration};
use crate::schema::convention::ConventionContext;
use crate::schema::graph::{Directives, PropertyDescriptor, PropertyKind, TypeDescriptor};
use crate::schema::ConfigurationStore;
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};

/// Reads descriptors, directives and configuration into the first
/// conceptual model snapshot. Conventions have not run yet.
struct Draft<'a> {
    config: &'a ConfigurationStore,
    discovered: &'a Discovered<'a>,
    entity_ids: HashMap<&'a str, EntityId>,
    complex_ids: HashMap<&'a str, ComplexTypeId>,
}

pub(super) fn draft(config: &ConfigurationStore, discovered: &Discovered<'_>) -> Result<app::Schema> {
    let draft = Draft {
        config,
        discovered,
        entity_ids: discovered
            .entities
            .iter()
            .enumerate()
            .map(|(i, ty)| (ty.name.as_str(), EntityId(i)))
            .collect(),
        complex_ids: discovered
            .complex_types
            .iter()
            .enumerate()
            .map(|(i, ty)| (ty.name.as_str(), ComplexTypeId(i)))
            .collect(),
    };

    let mut schema = app::Schema::default();

    for (i, ty) in discovered.complex_types.iter().copied().enumerate() {
        let id = ComplexTypeId(i);
        schema.complex_types.insert(id, draft.complex_type(id, ty)?);
    }

    for (i, ty) in discovered.entities.iter().copied().enumerate() {
        let id = EntityId(i);
        schema.entities.insert(id, draft.entity(id, ty)?);
    }

    link_inverse_directives(&mut schema)?;

    Ok(schema)
}

/// Reports hierarchy roots without a key and makes key properties
/// non-nullable.
pub(super) fn finish_keys(schema: &mut app::Schema, cx: &ConventionContext<'_>) -> Result<()> {
    let mut errors = vec![];

    for entity in schema.entities.values_mut().filter(|entity| entity.is_root()) {
        let Some(key) = &entity.key else {
            errors.push(match cx.ambiguous_key(entity.id) {
                Some(candidates) => model_err!(MultiplePropertiesMatchedAsKeys, entity.name, candidates.join(", ")),
                None => model_err!(KeyNotDefined, entity.name),
            });
            continue;
        };

        for name in key.value.clone() {
            let property = entity
                .properties
                .iter_mut()
                .find(|property| property.name == name && property.scalar_ty().is_some());

            match property {
                Some(property) => property.nullable.value = false,
                None => errors.push(model_err!(NoSuchProperty, name, entity.name)),
            }
        }
    }

    Error::aggregate(errors)
}

/// Applies complex-type and global complex-property configuration to every
/// complex type. Declared complex types were configured while drafting, so
/// this only changes those found by conventions.
pub(super) fn configure_complex_types(schema: &mut app::Schema, config: &ConfigurationStore) -> Result<()> {
    for complex in schema.complex_types.values_mut() {
        configure_complex_type(complex, config)?;
    }

    Ok(())
}

fn configure_complex_type(complex: &mut ComplexType, config: &ConfigurationStore) -> Result<()> {
    let type_config = config.complex_type_config(&complex.name);

    for property in &mut complex.properties {
        let type_level = type_config.and_then(|config| config.properties.get(&property.name));
        let global = config.global_complex_property(&property.name);

        check_agreement(&format!("{}.{}", complex.name, property.name), &[type_level, global])?;

        let merged = type_level.cloned().unwrap_or_default();
        let merged = match global {
            Some(global) => merged.or(global),
            None => merged,
        };
        apply_config(property, &merged);
    }

    Ok(())
}

/// Checks `Address.Street` style configuration: every segment must exist,
/// and the entity, complex type and global scopes must agree.
///
/// Runs once conventions have decided which types are complex.
pub(super) fn check_property_paths(schema: &app::Schema, config: &ConfigurationStore) -> Result<()> {
    for entity in schema.entities() {
        let Some(entity_config) = config.entity_config(&entity.name) else {
            continue;
        };

        for (path, path_config) in entity_config.properties.iter().filter(|(path, _)| path.contains('.')) {
            let mut segments = path.split('.');
            let first = segments.next().unwrap_or_default();

            let mut current = match entity.property(first).and_then(Property::complex_ty) {
                Some(id) => schema.complex_type(id),
                None => return Err(model_err!(NoSuchProperty, first, entity.name)),
            };

            let mut leaf = None;

            for segment in segments {
                let Some(property) = current.property(segment) else {
                    return Err(model_err!(NoSuchProperty, segment, current.name));
                };

                leaf = Some((current, segment));

                if let Some(id) = property.complex_ty() {
                    current = schema.complex_type(id);
                }
            }

            let Some((declaring, leaf)) = leaf else {
                continue;
            };

            let type_level = config
                .complex_type_config(&declaring.name)
                .and_then(|config| config.properties.get(leaf));
            let global = config.global_complex_property(leaf);

            check_agreement(
                &format!("{}.{}", entity.name, path),
                &[Some(path_config), type_level, global],
            )?;
        }
    }

    Ok(())
}

impl<'a> Draft<'a> {
    fn complex_type(&self, id: ComplexTypeId, ty: &TypeDescriptor) -> Result<ComplexType> {
        let type_config = self.config.complex_type_config(&ty.name);
        let mut properties = vec![];

        if let Some(type_config) = type_config {
            for name in type_config.properties.keys() {
                if ty.property_named(name).is_none() {
                    return Err(model_err!(NoSuchProperty, name, ty.name));
                }
            }
        }

        for (index, descriptor) in ty.properties.iter().enumerate() {
            if descriptor.directives.not_mapped
                || type_config.is_some_and(|config| config.ignored.contains(&descriptor.name))
            {
                continue;
            }

            // Complex types carry no navigations.
            if let Some(property) = self.property(descriptor, index) {
                properties.push(property);
            }
        }

        let mut complex = ComplexType {
            id,
            name: ty.name.clone(),
            properties,
        };
        configure_complex_type(&mut complex, self.config)?;

        Ok(complex)
    }

    fn entity(&self, id: EntityId, ty: &'a TypeDescriptor) -> Result<EntityType> {
        let config = self.config.entity_config(&ty.name);
        let base = ty
            .base
            .as_deref()
            .and_then(|base| self.entity_ids.get(base))
            .copied();

        let descriptors = self.descriptors(ty);

        let mut properties = vec![];
        let mut navigations = vec![];

        for (index, descriptor) in descriptors.iter().enumerate() {
            if descriptor.directives.not_mapped || config.is_some_and(|config| config.is_ignored(&descriptor.name)) {
                continue;
            }

            if let Some(target) = descriptor.target() {
                if let Some(target) = self.entity_ids.get(target) {
                    navigations.push(Navigation {
                        name: descriptor.name.clone(),
                        target: *target,
                        collection: matches!(descriptor.kind, PropertyKind::Collection(_)),
                        required: descriptor.directives.required,
                        inverse: descriptor.directives.inverse_property.clone().map(Facet::directive),
                        foreign_key: Some(descriptor.directives.foreign_key_names())
                            .filter(|names| !names.is_empty())
                            .map(Facet::directive),
                        association: None,
                        index,
                    });
                    continue;
                }
            }

            let Some(mut property) = self.property(descriptor, index) else {
                continue;
            };

            if let Some(property_config) = config.and_then(|config| config.properties.get(&descriptor.name)) {
                apply_config(&mut property, property_config);
            }

            properties.push(property);
        }

        link_foreign_key_directives(ty, &descriptors, &mut navigations)?;

        if let Some(config) = config {
            check_configured_members(ty, config, &properties, &navigations)?;
        }

        let key = if base.is_some() {
            None
        } else {
            key_of(ty, config, &properties)?
        };

        check_column_orders(ty, &properties)?;

        let table = match config.and_then(EntityConfiguration::configured_table) {
            Some(table) => Some(Facet::explicit(table.clone())),
            None => ty.directives.table.clone().map(Facet::directive),
        };

        Ok(EntityType {
            id,
            name: ty.name.clone(),
            base,
            is_abstract: ty.is_abstract,
            properties,
            navigations,
            key,
            table,
            entity_set_name: config
                .and_then(|config| config.entity_set_name.clone())
                .map(Facet::explicit),
            declared_root: self.discovered.roots.contains(ty.name.as_str()),
        })
    }

    /// Declared properties, preceded by those of unmapped base types.
    fn descriptors(&self, ty: &'a TypeDescriptor) -> Vec<&'a PropertyDescriptor> {
        let mut chain = vec![];
        let mut current = ty.base.as_deref();

        while let Some(name) = current {
            if self.entity_ids.contains_key(name) {
                break;
            }

            let Some(base) = self.discovered.graph.get(name) else {
                break;
            };

            chain.push(base);
            current = base.base.as_deref();
        }

        chain
            .into_iter()
            .rev()
            .flat_map(|base| base.properties.iter())
            .chain(ty.properties.iter())
            .collect()
    }

    fn property(&self, descriptor: &PropertyDescriptor, index: usize) -> Option<Property> {
        match &descriptor.kind {
            PropertyKind::Scalar(ty) => {
                let mut property = Property::new(&descriptor.name, PropertyTy::Scalar(*ty), descriptor.nullable, index);
                apply_directives(&mut property, &descriptor.directives);
                Some(property)
            }
            PropertyKind::Complex(name) | PropertyKind::Reference(name) => {
                let id = self.complex_ids.get(name.as_str())?;
                let mut property = Property::new(&descriptor.name, PropertyTy::Complex(*id), false, index);
                apply_directives(&mut property, &descriptor.directives);
                Some(property)
            }
            PropertyKind::Collection(_) => None,
        }
    }
}

fn apply_directives(property: &mut Property, directives: &Directives) {
    if directives.required {
        property.nullable = Facet::directive(false);
    }

    property.max_length = directives.max_length.map(Facet::directive);
    property.column_name = directives.column_name.clone().map(Facet::directive);
    property.column_order = directives.column_order.map(Facet::directive);
    property.column_type = directives.column_type.clone().map(Facet::directive);
    property.store_generated = directives.database_generated.map(Facet::directive);
    property.concurrency_token = directives.concurrency_check;
    property.row_version = directives.timestamp;
}

pub(super) fn apply_config(property: &mut Property, config: &PropertyConfiguration) {
    if let Some(required) = config.required {
        property.nullable = Facet::explicit(!required);
    }
    if let Some(len) = config.max_length {
        property.max_length = Some(Facet::explicit(len));
    }
    if let Some(fixed) = config.fixed_length {
        property.fixed_length = Some(Facet::explicit(fixed));
    }
    if let Some(name) = &config.column_name {
        property.column_name = Some(Facet::explicit(name.clone()));
    }
    if let Some(order) = config.column_order {
        property.column_order = Some(Facet::explicit(order));
    }
    if let Some(ty) = &config.column_type {
        property.column_type = Some(Facet::explicit(ty.clone()));
    }
    if let Some(precision) = config.precision {
        property.precision = Some(Facet::explicit(precision));
    }
    if let Some(token) = config.concurrency_token {
        property.concurrency_token = token;
    }
    if let Some(row_version) = config.row_version {
        property.row_version = row_version;
    }
    if let Some(pattern) = config.store_generated {
        property.store_generated = Some(Facet::explicit(pattern));
    }
}

/// Every facet set at more than one scope must have the same value.
fn check_agreement(path: &str, levels: &[Option<&PropertyConfiguration>]) -> Result<()> {
    let mut seen: Vec<(&'static str, String)> = vec![];

    for level in levels.iter().flatten() {
        for (facet, value) in level.facets() {
            match seen.iter().find(|(name, _)| *name == facet) {
                Some((_, previous)) if *previous != value => {
                    return Err(model_err!(ConflictingConfigurationValue, facet, path, previous, value));
                }
                Some(_) => {}
                None => seen.push((facet, value)),
            }
        }
    }

    Ok(())
}

/// A scalar property marked as foreign key for a navigation contributes to
/// that navigation's dependent properties, ordered by column order.
fn link_foreign_key_directives(
    ty: &TypeDescriptor,
    descriptors: &[&PropertyDescriptor],
    navigations: &mut [Navigation],
) -> Result<()> {
    let mut linked: Vec<(&str, Option<i32>, &str)> = vec![];

    for descriptor in descriptors {
        let PropertyKind::Scalar(_) = descriptor.kind else {
            continue;
        };

        let Some(navigation) = &descriptor.directives.foreign_key else {
            continue;
        };

        if !navigations.iter().any(|candidate| &candidate.name == navigation) {
            return Err(model_err!(NavigationPropertyNotFound, navigation, ty.name));
        }

        linked.push((navigation.as_str(), descriptor.directives.column_order, descriptor.name.as_str()));
    }

    linked.sort_by_key(|(_, order, _)| *order);

    for navigation in navigations.iter_mut() {
        if navigation.foreign_key.is_some() {
            continue;
        }

        let names: Vec<String> = linked
            .iter()
            .filter(|(name, _, _)| *name == navigation.name)
            .map(|(_, _, property)| property.to_string())
            .collect();

        if !names.is_empty() {
            navigation.foreign_key = Some(Facet::directive(names));
        }
    }

    Ok(())
}

fn check_configured_members(
    ty: &TypeDescriptor,
    config: &EntityConfiguration,
    properties: &[Property],
    navigations: &[Navigation],
) -> Result<()> {
    for navigation in config.navigations.keys() {
        if !navigations.iter().any(|candidate| &candidate.name == navigation) {
            return Err(model_err!(NavigationPropertyNotFound, navigation, ty.name));
        }
    }

    for path in config.properties.keys() {
        // A dotted path may start at a navigation that conventions later
        // turn into a complex property.
        let (first, dotted) = match path.split_once('.') {
            Some((first, _)) => (first, true),
            None => (path.as_str(), false),
        };

        let navigation = dotted && navigations.iter().any(|navigation| navigation.name == first);

        if !navigation && !properties.iter().any(|property| property.name == first) {
            return Err(model_err!(NoSuchProperty, first, ty.name));
        }
    }

    Ok(())
}

fn key_of(
    ty: &TypeDescriptor,
    config: Option<&EntityConfiguration>,
    properties: &[Property],
) -> Result<Option<Facet<Vec<String>>>> {
    if let Some(key) = config.and_then(|config| config.key.as_ref()) {
        for name in key {
            if !properties.iter().any(|property| &property.name == name) {
                return Err(model_err!(NoSuchProperty, name, ty.name));
            }
        }

        return Ok(Some(Facet::explicit(key.clone())));
    }

    let mut marked: Vec<&Property> = properties
        .iter()
        .filter(|property| {
            ty.property_named(&property.name)
                .is_some_and(|descriptor| descriptor.directives.key)
        })
        .collect();

    match marked.len() {
        0 => Ok(None),
        1 => Ok(Some(Facet::directive(vec![marked[0].name.clone()]))),
        _ => {
            if marked.iter().any(|property| property.column_order.is_none()) {
                return Err(model_err!(CompositeKeyOrderMissing, ty.name));
            }

            marked.sort_by_key(|property| property.column_order.as_ref().map(|order| order.value));

            Ok(Some(Facet::directive(
                marked.into_iter().map(|property| property.name.clone()).collect(),
            )))
        }
    }
}

fn check_column_orders(ty: &TypeDescriptor, properties: &[Property]) -> Result<()> {
    let mut seen = HashSet::new();

    for property in properties {
        let Some(order) = &property.column_order else {
            continue;
        };

        if !seen.insert(order.value) {
            return Err(model_err!(DuplicateConfiguredColumnOrder, ty.name, order.value));
        }
    }

    Ok(())
}

/// Validates inverse navigation directives and sets the partner side.
fn link_inverse_directives(schema: &mut app::Schema) -> Result<()> {
    let mut partners = vec![];

    for entity in schema.entities() {
        for navigation in &entity.navigations {
            let Some(inverse) = &navigation.inverse else {
                continue;
            };

            if inverse.source != Source::Directive {
                continue;
            }

            let target = schema.entity(navigation.target);

            if target.navigation(&inverse.value).is_none() {
                return Err(model_err!(NavigationPropertyNotFound, inverse.value, target.name));
            }

            partners.push((target.id, inverse.value.clone(), navigation.name.clone()));
        }
    }

    for (target, name, partner) in partners {
        if let Some(navigation) = schema.entity_mut(target).navigation_mut(&name) {
            if navigation.inverse.is_none() {
                navigation.inverse = Some(Facet::directive(partner));
            }
        }
    }

    Ok(())
}
