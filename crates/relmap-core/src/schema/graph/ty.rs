use super::PropertyDescriptor;
use crate::schema::TableName;

/// Describes one domain type: an entity candidate or a complex type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub name: String,

    /// Name of the base type, if any
    pub base: Option<String>,

    /// Declared properties, in declaration order
    pub properties: Vec<PropertyDescriptor>,

    pub is_abstract: bool,

    /// Marked as a complex (value) type
    pub is_complex: bool,

    pub directives: TypeDirectives,
}

/// Declarative hints attached to a type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeDirectives {
    pub table: Option<TableName>,
    pub not_mapped: bool,
}

impl TypeDescriptor {
    pub fn entity(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            properties: vec![],
            is_abstract: false,
            is_complex: false,
            directives: TypeDirectives::default(),
        }
    }

    pub fn complex(name: impl Into<String>) -> Self {
        Self {
            is_complex: true,
            ..Self::entity(name)
        }
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    pub fn table(mut self, table: impl Into<TableName>) -> Self {
        self.directives.table = Some(table.into());
        self
    }

    pub fn not_mapped(mut self) -> Self {
        self.directives.not_mapped = true;
        self
    }

    pub fn property_named(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|property| property.name == name)
    }
}
