use crate::schema::mapping::Value;
use crate::schema::TableName;
use indexmap::IndexMap;

/// One `map` statement on an entity: a mapping fragment.
///
/// Several fragments on the same entity split it across tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingConfiguration {
    pub(crate) table: Option<TableName>,
    pub(crate) properties: Option<Vec<String>>,
    pub(crate) map_inherited_properties: bool,
    pub(crate) conditions: Vec<ConditionConfiguration>,
    pub(crate) column_names: IndexMap<String, String>,
}

/// A discriminator condition on a fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionConfiguration {
    pub(crate) column: String,
    pub(crate) value: Value,
}

/// Returned by [`MappingConfiguration::requires`].
pub struct RequiresConfiguration<'a> {
    mapping: &'a mut MappingConfiguration,
    column: String,
}

impl MappingConfiguration {
    pub fn to_table(&mut self, table: impl Into<TableName>) -> &mut Self {
        self.table = Some(table.into());
        self
    }

    /// Restricts the fragment to the named properties.
    pub fn properties<S: Into<String>>(&mut self, properties: impl IntoIterator<Item = S>) -> &mut Self {
        self.properties = Some(properties.into_iter().map(Into::into).collect());
        self
    }

    /// Stores inherited properties in this fragment's table as well.
    pub fn map_inherited_properties(&mut self) -> &mut Self {
        self.map_inherited_properties = true;
        self
    }

    pub fn requires(&mut self, column: impl Into<String>) -> RequiresConfiguration<'_> {
        RequiresConfiguration {
            mapping: self,
            column: column.into(),
        }
    }

    /// Renames the column of a property within this fragment only.
    pub fn has_column_name(&mut self, property: impl Into<String>, column: impl Into<String>) -> &mut Self {
        self.column_names.insert(property.into(), column.into());
        self
    }

    pub(crate) fn lists(&self, property: &str) -> bool {
        self.properties
            .as_ref()
            .is_some_and(|properties| properties.iter().any(|p| p == property))
    }
}

impl<'a> RequiresConfiguration<'a> {
    pub fn has_value(self, value: impl Into<Value>) -> &'a mut MappingConfiguration {
        let RequiresConfiguration { mapping, column } = self;
        mapping.conditions.push(ConditionConfiguration {
            column,
            value: value.into(),
        });
        mapping
    }
}
