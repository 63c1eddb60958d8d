use super::Directives;
use crate::schema::db::StoreGenerated;
use serde::Serialize;

/// Describes one declared property of a domain type.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub name: String,
    pub kind: PropertyKind,

    /// Whether the CLR-level value may be absent
    pub nullable: bool,

    pub directives: Directives,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    Scalar(ScalarType),

    /// A property holding a complex type by name
    Complex(String),

    /// Reference navigation to an entity type
    Reference(String),

    /// Collection navigation to an entity type
    Collection(String),
}

/// Primitive property types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScalarType {
    Bool,
    Byte,
    Int16,
    Int32,
    Int64,
    Decimal,
    Double,
    String,
    Binary,
    Guid,
    DateTime,
}

impl ScalarType {
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            ScalarType::Byte | ScalarType::Int16 | ScalarType::Int32 | ScalarType::Int64
        )
    }

    /// Reference-typed values are nullable unless marked otherwise.
    pub fn is_nullable_by_default(self) -> bool {
        matches!(self, ScalarType::String | ScalarType::Binary)
    }
}

impl PropertyDescriptor {
    fn new(name: impl Into<String>, kind: PropertyKind, nullable: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable,
            directives: Directives::default(),
        }
    }

    pub fn scalar(name: impl Into<String>, ty: ScalarType) -> Self {
        Self::new(name, PropertyKind::Scalar(ty), ty.is_nullable_by_default())
    }

    pub fn complex(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Complex(ty.into()), false)
    }

    pub fn reference(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Reference(target.into()), true)
    }

    pub fn collection(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Collection(target.into()), false)
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn key(mut self) -> Self {
        self.directives.key = true;
        self
    }

    pub fn column_order(mut self, order: i32) -> Self {
        self.directives.column_order = Some(order);
        self
    }

    pub fn required(mut self) -> Self {
        self.directives.required = true;
        self
    }

    pub fn foreign_key(mut self, names: impl Into<String>) -> Self {
        self.directives.foreign_key = Some(names.into());
        self
    }

    pub fn inverse_property(mut self, name: impl Into<String>) -> Self {
        self.directives.inverse_property = Some(name.into());
        self
    }

    pub fn max_length(mut self, len: u32) -> Self {
        self.directives.max_length = Some(len);
        self
    }

    pub fn column_name(mut self, name: impl Into<String>) -> Self {
        self.directives.column_name = Some(name.into());
        self
    }

    pub fn column_type(mut self, ty: impl Into<String>) -> Self {
        self.directives.column_type = Some(ty.into());
        self
    }

    pub fn concurrency_check(mut self) -> Self {
        self.directives.concurrency_check = true;
        self
    }

    pub fn timestamp(mut self) -> Self {
        self.directives.timestamp = true;
        self
    }

    pub fn not_mapped(mut self) -> Self {
        self.directives.not_mapped = true;
        self
    }

    pub fn database_generated(mut self, pattern: StoreGenerated) -> Self {
        self.directives.database_generated = Some(pattern);
        self
    }

    /// Target type name for navigations
    pub fn target(&self) -> Option<&str> {
        match &self.kind {
            PropertyKind::Reference(target) | PropertyKind::Collection(target) => Some(target),
            _ => None,
        }
    }

    pub fn is_navigation(&self) -> bool {
        self.target().is_some()
    }
}
