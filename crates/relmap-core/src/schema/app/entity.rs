use super::{AssociationId, Facet, Property};
use crate::schema::TableName;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct EntityType {
    /// Uniquely identifies the entity type within the schema
    pub id: EntityId,

    pub name: String,

    pub base: Option<EntityId>,

    pub is_abstract: bool,

    /// Declared scalar and complex properties; inherited ones live on the
    /// base types.
    pub properties: Vec<Property>,

    /// Declared navigations
    pub navigations: Vec<Navigation>,

    /// Key property names, in key order. Only set on hierarchy roots.
    pub key: Option<Facet<Vec<String>>>,

    pub table: Option<Facet<TableName>>,

    /// Name of the entity set. Only set on hierarchy roots.
    pub entity_set_name: Option<Facet<String>>,

    /// Declared as a root of the model by the caller
    #[serde(skip)]
    pub(crate) declared_root: bool,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityId(pub usize);

/// A reference or collection navigation.
#[derive(Debug, Clone, Serialize)]
pub struct Navigation {
    pub name: String,

    pub target: EntityId,

    pub collection: bool,

    /// Marked required by a directive
    pub required: bool,

    /// Inverse navigation on the target type
    pub inverse: Option<Facet<String>>,

    /// Dependent properties named by directives, in key order
    pub foreign_key: Option<Facet<Vec<String>>>,

    /// Set once associations are resolved
    pub association: Option<AssociationId>,

    /// Position among the declaring type's members
    pub index: usize,
}

/// The set an entity hierarchy is stored in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySet {
    pub name: String,
    pub root: EntityId,
}

impl EntityType {
    pub fn is_root(&self) -> bool {
        self.base.is_none()
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|property| property.name == name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|property| property.name == name)
    }

    pub fn navigation(&self, name: &str) -> Option<&Navigation> {
        self.navigations.iter().find(|navigation| navigation.name == name)
    }

    pub(crate) fn navigation_mut(&mut self, name: &str) -> Option<&mut Navigation> {
        self.navigations.iter_mut().find(|navigation| navigation.name == name)
    }
}

impl EntityId {
    pub(crate) fn placeholder() -> Self {
        Self(usize::MAX)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "EntityId({})", self.0)
    }
}
