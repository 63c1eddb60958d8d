use crate::schema::graph::{PropertyDescriptor, PropertyKind, TypeDescriptor};
use crate::schema::{ConfigurationStore, TypeGraph};
use crate::Result;
use indexmap::IndexSet;
use std::collections::{HashSet, VecDeque};

/// The closure of types reachable from the roots, in canonical order.
pub(super) struct Discovered<'a> {
    pub(super) graph: &'a TypeGraph,
    pub(super) entities: Vec<&'a TypeDescriptor>,
    pub(super) complex_types: Vec<&'a TypeDescriptor>,
    pub(super) roots: HashSet<&'a str>,
}

pub(super) fn discover<'a>(graph: &'a TypeGraph, config: &ConfigurationStore) -> Result<Discovered<'a>> {
    let excluded = |ty: &TypeDescriptor| config.is_ignored(&ty.name) || ty.directives.not_mapped;

    let mut complex_names: HashSet<&str> = graph
        .types()
        .filter(|ty| ty.is_complex)
        .map(|ty| ty.name.as_str())
        .collect();

    for name in config.complex_type_names() {
        let ty = graph.get(name).ok_or_else(|| model_err!(TypeNotFound, name))?;
        complex_names.insert(&ty.name);
    }

    let mut roots = HashSet::new();
    let mut queue = VecDeque::new();

    for name in graph.roots().into_iter().chain(config.entity_names()) {
        let ty = graph.get(name).ok_or_else(|| model_err!(TypeNotFound, name))?;

        if !excluded(ty) {
            roots.insert(ty.name.as_str());
            queue.push_back(ty);
        }
    }

    let mut seen = IndexSet::new();

    while let Some(ty) = queue.pop_front() {
        if !seen.insert(ty.name.as_str()) {
            continue;
        }

        let mut reached = vec![];

        if let Some(base) = &ty.base {
            reached.push(base.as_str());
        }

        reached.extend(graph.derived_types(&ty.name).map(|derived| derived.name.as_str()));

        let ignored = config.entity_config(&ty.name);

        for property in ty.properties.iter().filter(|property| {
            !property.directives.not_mapped && !ignored.is_some_and(|config| config.is_ignored(&property.name))
        }) {
            match &property.kind {
                PropertyKind::Complex(name) => {
                    let target = graph.get(name).ok_or_else(|| model_err!(TypeNotFound, name))?;
                    complex_names.insert(&target.name);
                    reached.push(&target.name);
                }
                PropertyKind::Reference(name) | PropertyKind::Collection(name) => reached.push(name),
                PropertyKind::Scalar(_) => {}
            }
        }

        for name in reached {
            let target = graph.get(name).ok_or_else(|| model_err!(TypeNotFound, name))?;

            if !excluded(target) {
                queue.push_back(target);
            }
        }
    }

    let mut entities = vec![];
    let mut complex_types = vec![];

    for name in seen {
        let Some(ty) = graph.get(name) else {
            continue;
        };

        if complex_names.contains(name) {
            complex_types.push(ty);
        } else {
            entities.push(ty);
        }
    }

    entities.sort_by(|a, b| a.name.cmp(&b.name));
    complex_types.sort_by(|a, b| a.name.cmp(&b.name));

    check_complex_cycles(&complex_types, &complex_names)?;

    Ok(Discovered {
        graph,
        entities,
        complex_types,
        roots,
    })
}

/// Fails when a complex type contains itself, directly or through other
/// complex types.
fn check_complex_cycles(complex_types: &[&TypeDescriptor], complex_names: &HashSet<&str>) -> Result<()> {
    let find = |name: &str| complex_types.iter().copied().find(|ty| ty.name == name);

    let nested = |property: &PropertyDescriptor| match &property.kind {
        PropertyKind::Complex(name) | PropertyKind::Reference(name) if complex_names.contains(&name[..]) => {
            Some(name.clone())
        }
        _ => None,
    };

    for ty in complex_types {
        // Depth-first walk keeping the current path on the stack.
        let mut stack: Vec<(String, Vec<String>)> = vec![(ty.name.clone(), vec![ty.name.clone()])];

        while let Some((name, path)) = stack.pop() {
            let Some(current) = find(&name) else {
                continue;
            };

            for next in current.properties.iter().filter_map(nested) {
                if path.contains(&next) {
                    return Err(model_err!(CircularComplexTypeHierarchy, next));
                }

                let mut path = path.clone();
                path.push(next.clone());
                stack.push((next, path));
            }
        }
    }

    Ok(())
}
