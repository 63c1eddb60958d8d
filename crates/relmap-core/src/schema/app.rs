//! Conceptual model: entity types, complex types, associations and entity
//! sets.

mod association;
pub use association::{
    Association, AssociationEnd, AssociationId, Constraint, DeleteBehavior, End, ForeignKeyConstraint,
    IndependentConstraint, Multiplicity, Role,
};

mod complex;
pub use complex::{ComplexType, ComplexTypeId};

mod entity;
pub use entity::{EntityId, EntitySet, EntityType, Navigation};

mod facet;
pub use facet::{Facet, Source};
pub(crate) use facet::FacetSlot;

mod property;
pub use property::{Property, PropertyTy};

mod schema;
pub use schema::Schema;
