use crate::schema::db::StoreGenerated;
use indexmap::IndexMap;

/// Facets configured for a single property.
///
/// Unset facets fall back to directives and then to conventions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyConfiguration {
    pub(crate) required: Option<bool>,
    pub(crate) max_length: Option<u32>,
    pub(crate) fixed_length: Option<bool>,
    pub(crate) column_name: Option<String>,
    pub(crate) column_order: Option<i32>,
    pub(crate) column_type: Option<String>,
    pub(crate) precision: Option<(u8, u8)>,
    pub(crate) concurrency_token: Option<bool>,
    pub(crate) row_version: Option<bool>,
    pub(crate) store_generated: Option<StoreGenerated>,
}

impl PropertyConfiguration {
    pub fn is_required(&mut self) -> &mut Self {
        self.required = Some(true);
        self
    }

    pub fn is_optional(&mut self) -> &mut Self {
        self.required = Some(false);
        self
    }

    pub fn has_max_length(&mut self, len: u32) -> &mut Self {
        self.max_length = Some(len);
        self
    }

    pub fn is_fixed_length(&mut self) -> &mut Self {
        self.fixed_length = Some(true);
        self
    }

    pub fn has_column_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.column_name = Some(name.into());
        self
    }

    pub fn has_column_order(&mut self, order: i32) -> &mut Self {
        self.column_order = Some(order);
        self
    }

    pub fn has_column_type(&mut self, ty: impl Into<String>) -> &mut Self {
        self.column_type = Some(ty.into());
        self
    }

    pub fn has_precision(&mut self, precision: u8, scale: u8) -> &mut Self {
        self.precision = Some((precision, scale));
        self
    }

    pub fn is_concurrency_token(&mut self) -> &mut Self {
        self.concurrency_token = Some(true);
        self
    }

    pub fn is_row_version(&mut self) -> &mut Self {
        self.row_version = Some(true);
        self
    }

    pub fn has_database_generated_option(&mut self, pattern: StoreGenerated) -> &mut Self {
        self.store_generated = Some(pattern);
        self
    }

    /// Every facet that is set, rendered for comparison and error messages.
    pub(crate) fn facets(&self) -> Vec<(&'static str, String)> {
        let mut facets = vec![];

        if let Some(required) = self.required {
            facets.push(("required", required.to_string()));
        }
        if let Some(len) = self.max_length {
            facets.push(("max_length", len.to_string()));
        }
        if let Some(fixed) = self.fixed_length {
            facets.push(("fixed_length", fixed.to_string()));
        }
        if let Some(name) = &self.column_name {
            facets.push(("column_name", name.clone()));
        }
        if let Some(order) = self.column_order {
            facets.push(("column_order", order.to_string()));
        }
        if let Some(ty) = &self.column_type {
            facets.push(("column_type", ty.clone()));
        }
        if let Some((precision, scale)) = self.precision {
            facets.push(("precision", format!("{precision},{scale}")));
        }
        if let Some(token) = self.concurrency_token {
            facets.push(("concurrency_token", token.to_string()));
        }
        if let Some(row_version) = self.row_version {
            facets.push(("row_version", row_version.to_string()));
        }
        if let Some(pattern) = self.store_generated {
            facets.push(("store_generated", format!("{pattern:?}")));
        }

        facets
    }

    /// Fills every unset facet of `self` from `other`.
    pub(crate) fn or(mut self, other: &PropertyConfiguration) -> Self {
        self.required = self.required.or(other.required);
        self.max_length = self.max_length.or(other.max_length);
        self.fixed_length = self.fixed_length.or(other.fixed_length);
        self.column_name = self.column_name.or_else(|| other.column_name.clone());
        self.column_order = self.column_order.or(other.column_order);
        self.column_type = self.column_type.or_else(|| other.column_type.clone());
        self.precision = self.precision.or(other.precision);
        self.concurrency_token = self.concurrency_token.or(other.concurrency_token);
        self.row_version = self.row_version.or(other.row_version);
        self.store_generated = self.store_generated.or(other.store_generated);
        self
    }
}

/// Facets shared by every complex-type property with a given name.
#[derive(Debug, Clone, Default)]
pub struct ComplexPropertiesConfiguration {
    properties: IndexMap<String, PropertyConfiguration>,
}

impl ComplexPropertiesConfiguration {
    pub fn property(&mut self, name: &str) -> &mut PropertyConfiguration {
        self.properties.entry(name.to_string()).or_default()
    }

    pub(crate) fn get(&self, name: &str) -> Option<&PropertyConfiguration> {
        self.properties.get(name)
    }
}
