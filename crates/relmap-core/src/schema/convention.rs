//! Caller-adjustable rules that fill in model information the caller left
//! unspecified.

mod cascade;
pub use cascade::{ManyToManyCascadeDelete, OneToManyCascadeDelete};

mod complex_type;
pub use complex_type::ComplexTypeDiscovery;

mod facets;
pub use facets::ColumnFacets;

mod foreign_key;
pub use foreign_key::ForeignKeyDiscovery;

mod identity;
pub use identity::StoreGeneratedIdentityKey;

mod inverse;
pub use inverse::NavigationInverseDiscovery;

mod key;
pub use key::KeyDiscovery;

mod table_name;
pub use table_name::{PluralizingEntitySetName, PluralizingTableName};

use super::app::{self, EntityId};
use super::{BuildOptions, ConfigurationStore};
use crate::Result;
use std::{fmt, sync::Arc};
use tracing::trace;

/// A single model-building rule.
///
/// A convention only fills slots that are still empty; it never overrides a
/// value that came from configuration or a directive, and it never fails.
/// Situations it cannot decide are left for the builder to report.
pub trait Convention: fmt::Debug + Send + Sync {
    /// Unique name used to position the convention in a [`Conventions`] list
    fn name(&self) -> &str;

    /// When the convention runs
    fn phase(&self) -> Phase;

    fn apply(&self, model: &mut app::Schema, cx: &mut ConventionContext<'_>);
}

/// Conventions run in two passes: before associations are resolved, and
/// after, when association ends and constraints exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Discovery,
    Association,
}

/// Read-only inputs handed to conventions, plus a place to record
/// ambiguities.
pub struct ConventionContext<'a> {
    pub config: &'a ConfigurationStore,
    pub options: &'a BuildOptions,
    ambiguous_keys: Vec<(EntityId, Vec<String>)>,
}

/// An ordered, caller-owned list of conventions.
#[derive(Clone)]
pub struct Conventions {
    items: Vec<Arc<dyn Convention>>,
}

impl<'a> ConventionContext<'a> {
    pub(crate) fn new(config: &'a ConfigurationStore, options: &'a BuildOptions) -> Self {
        Self {
            config,
            options,
            ambiguous_keys: vec![],
        }
    }

    /// Records that several properties of an entity matched a key pattern.
    pub fn report_ambiguous_key(&mut self, entity: EntityId, candidates: Vec<String>) {
        self.ambiguous_keys.push((entity, candidates));
    }

    pub(crate) fn ambiguous_key(&self, entity: EntityId) -> Option<&[String]> {
        self.ambiguous_keys
            .iter()
            .find(|(id, _)| *id == entity)
            .map(|(_, candidates)| &candidates[..])
    }
}

impl Conventions {
    /// A list without any convention.
    pub fn empty() -> Self {
        Self { items: vec![] }
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|convention| convention.name()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Appends a convention.
    pub fn add(&mut self, convention: impl Convention + 'static) -> Result<&mut Self> {
        self.check_unique(convention.name())?;
        self.items.push(Arc::new(convention));
        Ok(self)
    }

    pub fn insert_before(&mut self, name: &str, convention: impl Convention + 'static) -> Result<&mut Self> {
        let index = self.find(name)?;
        self.check_unique(convention.name())?;
        self.items.insert(index, Arc::new(convention));
        Ok(self)
    }

    pub fn insert_after(&mut self, name: &str, convention: impl Convention + 'static) -> Result<&mut Self> {
        let index = self.find(name)?;
        self.check_unique(convention.name())?;
        self.items.insert(index + 1, Arc::new(convention));
        Ok(self)
    }

    pub fn remove(&mut self, name: &str) -> Result<&mut Self> {
        let index = self.find(name)?;
        self.items.remove(index);
        Ok(self)
    }

    /// Replaces the named convention, keeping its position.
    pub fn replace(&mut self, name: &str, convention: impl Convention + 'static) -> Result<&mut Self> {
        let index = self.find(name)?;

        if convention.name() != name {
            self.check_unique(convention.name())?;
        }

        self.items[index] = Arc::new(convention);
        Ok(self)
    }

    pub(crate) fn apply(&self, phase: Phase, model: &mut app::Schema, cx: &mut ConventionContext<'_>) {
        for convention in self.items.iter().filter(|convention| convention.phase() == phase) {
            trace!(convention = convention.name(), ?phase, "applying convention");
            convention.apply(model, cx);
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|convention| convention.name() == name)
    }

    fn find(&self, name: &str) -> Result<usize> {
        self.position(name)
            .ok_or_else(|| model_err!(ConventionNotFound, name))
    }

    fn check_unique(&self, name: &str) -> Result<()> {
        if self.contains(name) {
            return Err(model_err!(DuplicateConvention, name));
        }
        Ok(())
    }
}

impl Default for Conventions {
    /// The built-in conventions, in their default order.
    fn default() -> Self {
        let items: Vec<Arc<dyn Convention>> = vec![
            Arc::new(ComplexTypeDiscovery),
            Arc::new(KeyDiscovery),
            Arc::new(NavigationInverseDiscovery),
            Arc::new(PluralizingTableName),
            Arc::new(PluralizingEntitySetName),
            Arc::new(ColumnFacets),
            Arc::new(ForeignKeyDiscovery),
            Arc::new(StoreGeneratedIdentityKey),
            Arc::new(OneToManyCascadeDelete),
            Arc::new(ManyToManyCascadeDelete),
        ];

        Self { items }
    }
}

impl fmt::Debug for Conventions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKey;

    #[derive(Debug)]
    struct Noop(&'static str);

    impl Convention for Noop {
        fn name(&self) -> &str {
            self.0
        }

        fn phase(&self) -> Phase {
            Phase::Discovery
        }

        fn apply(&self, _: &mut app::Schema, _: &mut ConventionContext<'_>) {}
    }

    #[test]
    fn insert_before_and_after() {
        let mut conventions = Conventions::default();
        conventions.insert_before("KeyDiscovery", Noop("A")).unwrap();
        conventions.insert_after("KeyDiscovery", Noop("B")).unwrap();

        let names = conventions.names();
        let key = names.iter().position(|name| *name == "KeyDiscovery").unwrap();
        assert_eq!("A", names[key - 1]);
        assert_eq!("B", names[key + 1]);
    }

    #[test]
    fn remove_and_replace() {
        let mut conventions = Conventions::default();
        conventions.remove("OneToManyCascadeDelete").unwrap();
        assert!(!conventions.contains("OneToManyCascadeDelete"));

        let len = conventions.names().len();
        conventions.replace("KeyDiscovery", Noop("MyKeys")).unwrap();
        assert_eq!(len, conventions.names().len());
        assert!(conventions.contains("MyKeys"));
        assert!(!conventions.contains("KeyDiscovery"));
    }

    #[test]
    fn unknown_and_duplicate_names() {
        let mut conventions = Conventions::default();

        let err = conventions.remove("Nope").unwrap_err();
        assert_eq!(Some(ErrorKey::ConventionNotFound), err.key());

        let err = conventions.add(Noop("KeyDiscovery")).unwrap_err();
        assert_eq!(Some(ErrorKey::DuplicateConvention), err.key());
        assert_eq!(["KeyDiscovery"], err.args());
    }
}
