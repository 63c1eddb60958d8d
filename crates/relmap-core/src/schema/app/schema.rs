use super::{Association, AssociationId, ComplexType, ComplexTypeId, EntityId, EntitySet, EntityType, Property};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Schema {
    /// Entity types in canonical (name) order
    pub entities: IndexMap<EntityId, EntityType>,

    pub complex_types: IndexMap<ComplexTypeId, ComplexType>,

    pub associations: IndexMap<AssociationId, Association>,

    /// One set per hierarchy, in root order
    pub entity_sets: Vec<EntitySet>,
}

impl Schema {
    pub fn entities(&self) -> impl Iterator<Item = &EntityType> {
        self.entities.values()
    }

    /// Get an entity type by ID
    pub fn entity(&self, id: impl Into<EntityId>) -> &EntityType {
        self.entities.get(&id.into()).expect("invalid entity ID")
    }

    pub fn entity_mut(&mut self, id: impl Into<EntityId>) -> &mut EntityType {
        self.entities.get_mut(&id.into()).expect("invalid entity ID")
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&EntityType> {
        self.entities.values().find(|entity| entity.name == name)
    }

    pub fn complex_type(&self, id: ComplexTypeId) -> &ComplexType {
        self.complex_types.get(&id).expect("invalid complex type ID")
    }

    pub fn complex_type_by_name(&self, name: &str) -> Option<&ComplexType> {
        self.complex_types.values().find(|complex| complex.name == name)
    }

    pub fn associations(&self) -> impl Iterator<Item = &Association> {
        self.associations.values()
    }

    pub fn association(&self, id: AssociationId) -> &Association {
        self.associations.get(&id).expect("invalid association ID")
    }

    /// The association a navigation takes part in.
    pub fn association_for(&self, entity: &str, navigation: &str) -> Option<&Association> {
        let id = self.entity_by_name(entity)?.navigation(navigation)?.association?;
        self.associations.get(&id)
    }

    /// The entity itself followed by its ancestors, up to the root.
    pub fn ancestors(&self, id: EntityId) -> Vec<EntityId> {
        let mut ret = vec![id];
        let mut current = self.entity(id);

        while let Some(base) = current.base {
            ret.push(base);
            current = self.entity(base);
        }

        ret
    }

    pub fn root_of(&self, id: EntityId) -> EntityId {
        let mut current = self.entity(id);

        while let Some(base) = current.base {
            current = self.entity(base);
        }

        current.id
    }

    /// Directly derived types, in canonical order
    pub fn derived(&self, id: EntityId) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|entity| entity.base == Some(id))
            .map(|entity| entity.id)
            .collect()
    }

    /// The entity and all its descendants, in pre-order.
    pub fn hierarchy(&self, id: EntityId) -> Vec<EntityId> {
        let mut ret = vec![];
        let mut stack = vec![id];

        while let Some(id) = stack.pop() {
            ret.push(id);

            let mut derived = self.derived(id);
            derived.reverse();
            stack.extend(derived);
        }

        ret
    }

    pub fn is_ancestor_or_self(&self, ancestor: EntityId, id: EntityId) -> bool {
        self.ancestors(id).contains(&ancestor)
    }

    /// Properties visible on an entity type: inherited ones first.
    pub fn all_properties(&self, id: EntityId) -> Vec<&Property> {
        self.ancestors(id)
            .into_iter()
            .rev()
            .flat_map(|id| self.entity(id).properties.iter())
            .collect()
    }

    /// Finds a property declared on the entity or one of its ancestors.
    pub fn find_property(&self, id: EntityId, name: &str) -> Option<(EntityId, &Property)> {
        self.ancestors(id)
            .into_iter()
            .find_map(|id| self.entity(id).property(name).map(|property| (id, property)))
    }

    /// Key property names of the entity's hierarchy.
    pub fn key_of(&self, id: EntityId) -> &[String] {
        self.entity(self.root_of(id))
            .key
            .as_ref()
            .map(|key| &key.value[..])
            .unwrap_or(&[])
    }

    pub fn key_properties(&self, id: EntityId) -> Vec<&Property> {
        let root = self.entity(self.root_of(id));

        self.key_of(id)
            .iter()
            .filter_map(|name| root.property(name))
            .collect()
    }

    /// The entity set of the hierarchy the entity belongs to.
    pub fn entity_set_for(&self, id: EntityId) -> Option<&EntitySet> {
        let root = self.root_of(id);
        self.entity_sets.iter().find(|set| set.root == root)
    }
}
