mod association;
pub use association::AssociationSetMapping;

mod discriminator;
pub use discriminator::Discriminator;

mod entity;
pub use entity::{Condition, EntityMapping, MappingFragment, PropertyBinding};

mod value;
pub use value::Value;

use super::app::{AssociationId, EntityId};
use indexmap::IndexMap;
use serde::Serialize;

/// Defines the correspondence between conceptual entity types and store
/// tables.
///
/// Each entity type has an ordered list of fragments. A fragment binds
/// property paths to columns of one table, optionally guarded by
/// discriminator conditions. Independent associations and many-to-many
/// associations are mapped through association set mappings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Mapping {
    /// Per-entity mappings indexed by entity identifier.
    pub entities: IndexMap<EntityId, EntityMapping>,

    pub associations: Vec<AssociationSetMapping>,

    pub discriminators: Vec<Discriminator>,
}

impl Mapping {
    /// Returns the mapping for the specified entity.
    ///
    /// # Panics
    ///
    /// Panics if the entity ID does not exist in the mapping.
    pub fn entity(&self, id: impl Into<EntityId>) -> &EntityMapping {
        self.entities.get(&id.into()).expect("invalid entity ID")
    }

    pub(crate) fn entity_mut(&mut self, id: impl Into<EntityId>) -> &mut EntityMapping {
        self.entities.get_mut(&id.into()).expect("invalid entity ID")
    }

    pub fn association(&self, id: AssociationId) -> Option<&AssociationSetMapping> {
        self.associations
            .iter()
            .find(|mapping| mapping.association == id)
    }
}
