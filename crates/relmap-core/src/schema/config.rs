mod entity;
pub use entity::{ComplexTypeConfiguration, EntityConfiguration};

mod mapping;
pub use mapping::{ConditionConfiguration, MappingConfiguration, RequiresConfiguration};

mod navigation;
pub use navigation::{AssociationMappingConfiguration, ConstraintConfiguration, Inverse, NavigationConfiguration};

mod property;
pub use property::{ComplexPropertiesConfiguration, PropertyConfiguration};

use indexmap::{IndexMap, IndexSet};

/// Explicit, builder-style configuration.
///
/// Statements are keyed by type, property path or navigation. Repeating a
/// statement for the same key overwrites the earlier values; statements made
/// through different keys about the same association are reconciled by the
/// builder and reported when they disagree. The store is only read while
/// building.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationStore {
    entities: IndexMap<String, EntityConfiguration>,
    complex_types: IndexMap<String, ComplexTypeConfiguration>,
    complex_properties: ComplexPropertiesConfiguration,
    ignored: IndexSet<String>,
}

impl ConfigurationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures an entity type. The type becomes a root of the model.
    pub fn entity(&mut self, name: &str) -> &mut EntityConfiguration {
        self.entities.entry(name.to_string()).or_default()
    }

    /// Configures a complex type. The type is treated as complex even when
    /// it is not marked as such.
    pub fn complex_type(&mut self, name: &str) -> &mut ComplexTypeConfiguration {
        self.complex_types.entry(name.to_string()).or_default()
    }

    /// Facets applied to every complex-type property with a given name.
    pub fn complex_properties(&mut self) -> &mut ComplexPropertiesConfiguration {
        &mut self.complex_properties
    }

    /// Excludes a type from the model.
    pub fn ignore(&mut self, name: &str) -> &mut Self {
        self.ignored.insert(name.to_string());
        self
    }

    pub fn entity_config(&self, name: &str) -> Option<&EntityConfiguration> {
        self.entities.get(name)
    }

    pub fn complex_type_config(&self, name: &str) -> Option<&ComplexTypeConfiguration> {
        self.complex_types.get(name)
    }

    pub fn global_complex_property(&self, name: &str) -> Option<&PropertyConfiguration> {
        self.complex_properties.get(name)
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.contains(name)
    }

    /// Names of every explicitly configured entity type.
    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    pub fn complex_type_names(&self) -> impl Iterator<Item = &str> {
        self.complex_types.keys().map(String::as_str)
    }

    pub(crate) fn navigation(&self, ty: &str, navigation: &str) -> Option<&NavigationConfiguration> {
        self.entities.get(ty)?.navigations.get(navigation)
    }
}
