use super::Property;
use serde::Serialize;
use std::fmt;

/// A value type without identity, flattened into its owner's table.
#[derive(Debug, Clone, Serialize)]
pub struct ComplexType {
    pub id: ComplexTypeId,
    pub name: String,
    pub properties: Vec<Property>,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize)]
pub struct ComplexTypeId(pub usize);

impl ComplexType {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|property| property.name == name)
    }
}

impl fmt::Debug for ComplexTypeId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "ComplexTypeId({})", self.0)
    }
}
