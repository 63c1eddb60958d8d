use super::{MappingConfiguration, NavigationConfiguration, PropertyConfiguration};
use crate::schema::app::Multiplicity;
use crate::schema::TableName;
use indexmap::{IndexMap, IndexSet};

/// Configuration of one entity type.
#[derive(Debug, Clone, Default)]
pub struct EntityConfiguration {
    pub(crate) key: Option<Vec<String>>,
    pub(crate) table: Option<TableName>,
    pub(crate) entity_set_name: Option<String>,
    /// Keyed by property path; nested complex properties use `.`
    pub(crate) properties: IndexMap<String, PropertyConfiguration>,
    pub(crate) navigations: IndexMap<String, NavigationConfiguration>,
    pub(crate) mappings: Vec<MappingConfiguration>,
    pub(crate) ignored: IndexSet<String>,
}

/// Configuration of one complex type.
#[derive(Debug, Clone, Default)]
pub struct ComplexTypeConfiguration {
    pub(crate) properties: IndexMap<String, PropertyConfiguration>,
    pub(crate) ignored: IndexSet<String>,
}

impl EntityConfiguration {
    /// Sets the key properties, in key order.
    pub fn has_key<S: Into<String>>(&mut self, properties: impl IntoIterator<Item = S>) -> &mut Self {
        self.key = Some(properties.into_iter().map(Into::into).collect());
        self
    }

    pub fn to_table(&mut self, table: impl Into<TableName>) -> &mut Self {
        self.table = Some(table.into());
        self
    }

    pub fn has_entity_set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.entity_set_name = Some(name.into());
        self
    }

    /// Configures a property; `Address.Street` reaches into complex
    /// properties.
    pub fn property(&mut self, path: &str) -> &mut PropertyConfiguration {
        self.properties.entry(path.to_string()).or_default()
    }

    /// Excludes a property or navigation from the model.
    pub fn ignore(&mut self, property: &str) -> &mut Self {
        self.ignored.insert(property.to_string());
        self
    }

    pub fn has_required(&mut self, navigation: &str) -> &mut NavigationConfiguration {
        self.navigation(navigation, Multiplicity::One)
    }

    pub fn has_optional(&mut self, navigation: &str) -> &mut NavigationConfiguration {
        self.navigation(navigation, Multiplicity::ZeroOrOne)
    }

    pub fn has_many(&mut self, navigation: &str) -> &mut NavigationConfiguration {
        self.navigation(navigation, Multiplicity::Many)
    }

    /// Adds a mapping fragment.
    pub fn map(&mut self, f: impl FnOnce(&mut MappingConfiguration)) -> &mut Self {
        let mut mapping = MappingConfiguration::default();
        f(&mut mapping);
        self.mappings.push(mapping);
        self
    }

    fn navigation(&mut self, navigation: &str, multiplicity: Multiplicity) -> &mut NavigationConfiguration {
        let config = self
            .navigations
            .entry(navigation.to_string())
            .or_insert_with(|| NavigationConfiguration::new(navigation, multiplicity));

        config.target_multiplicity = multiplicity;
        config
    }

    pub(crate) fn is_ignored(&self, property: &str) -> bool {
        self.ignored.contains(property)
    }

    /// Table named by the entity or by a fragment without a property list.
    pub(crate) fn configured_table(&self) -> Option<&TableName> {
        self.table.as_ref().or_else(|| {
            self.mappings
                .iter()
                .find(|mapping| mapping.properties.is_none())
                .and_then(|mapping| mapping.table.as_ref())
        })
    }

    pub(crate) fn maps_inherited_properties(&self) -> bool {
        self.mappings.iter().any(|mapping| mapping.map_inherited_properties)
    }
}

impl ComplexTypeConfiguration {
    pub fn property(&mut self, name: &str) -> &mut PropertyConfiguration {
        self.properties.entry(name.to_string()).or_default()
    }

    pub fn ignore(&mut self, property: &str) -> &mut Self {
        self.ignored.insert(property.to_string());
        self
    }
}
