use serde::Serialize;

/// Where a model value came from.
///
/// Conventions only fill slots that are empty; directives and explicit
/// configuration are never overwritten by them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Source {
    /// Set through the configuration store
    Explicit,

    /// Read from a declarative directive
    Directive,

    /// Filled in by a convention or a default
    Convention,
}

/// A value together with its [`Source`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facet<T> {
    pub value: T,
    pub source: Source,
}

impl<T> Facet<T> {
    pub fn explicit(value: T) -> Self {
        Self {
            value,
            source: Source::Explicit,
        }
    }

    pub fn directive(value: T) -> Self {
        Self {
            value,
            source: Source::Directive,
        }
    }

    pub fn convention(value: T) -> Self {
        Self {
            value,
            source: Source::Convention,
        }
    }

    /// Set by the caller, either explicitly or through a directive
    pub fn is_configured(&self) -> bool {
        self.source != Source::Convention
    }
}

pub(crate) trait FacetSlot<T> {
    /// Stores `value` unless the slot already holds one. Returns `true` when
    /// the value was stored.
    fn set_by_convention(&mut self, value: T) -> bool;

    fn value(&self) -> Option<&T>;

    fn is_configured(&self) -> bool;
}

impl<T> FacetSlot<T> for Option<Facet<T>> {
    fn set_by_convention(&mut self, value: T) -> bool {
        if self.is_some() {
            return false;
        }

        *self = Some(Facet::convention(value));
        true
    }

    fn value(&self) -> Option<&T> {
        self.as_ref().map(|facet| &facet.value)
    }

    fn is_configured(&self) -> bool {
        self.as_ref().is_some_and(Facet::is_configured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convention_does_not_overwrite() {
        let mut slot = Some(Facet::explicit(10u32));
        assert!(!slot.set_by_convention(128));
        assert_eq!(Some(&10), slot.value());
        assert!(FacetSlot::is_configured(&slot));

        let mut slot: Option<Facet<u32>> = None;
        assert!(slot.set_by_convention(128));
        assert!(!slot.set_by_convention(256));
        assert_eq!(Some(&128), slot.value());
        assert!(!FacetSlot::is_configured(&slot));
    }
}
