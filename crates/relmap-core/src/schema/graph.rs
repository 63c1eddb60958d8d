mod directive;
pub use directive::Directives;

mod property;
pub use property::{PropertyDescriptor, PropertyKind, ScalarType};

mod ty;
pub use ty::{TypeDescriptor, TypeDirectives};

use indexmap::{IndexMap, IndexSet};

/// The domain types handed to the builder.
///
/// Types are stored by name. Roots are the types the caller declares as
/// entry points; everything reachable from them through navigations,
/// complex properties and base types becomes part of the model. When no
/// root is declared, every non-complex type is a root.
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    types: IndexMap<String, TypeDescriptor>,
    roots: IndexSet<String>,
}

impl TypeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a type description, replacing any previous one with the same name.
    pub fn with_type(mut self, ty: TypeDescriptor) -> Self {
        self.add_type(ty);
        self
    }

    pub fn add_type(&mut self, ty: TypeDescriptor) -> &mut Self {
        self.types.insert(ty.name.clone(), ty);
        self
    }

    /// Declares a type as a root of the model.
    pub fn with_root(mut self, name: &str) -> Self {
        self.roots.insert(name.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values()
    }

    /// Declared roots, or every non-complex type when none are declared.
    pub fn roots(&self) -> Vec<&str> {
        if self.roots.is_empty() {
            self.types
                .values()
                .filter(|ty| !ty.is_complex)
                .map(|ty| ty.name.as_str())
                .collect()
        } else {
            self.roots.iter().map(String::as_str).collect()
        }
    }

    /// Types that name `name` as their base type.
    pub fn derived_types<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a TypeDescriptor> + 'a {
        self.types
            .values()
            .filter(move |ty| ty.base.as_deref() == Some(name))
    }
}
