use crate::schema::db::StoreGenerated;

/// Declarative hints attached to a single property.
///
/// Directives are read as they are; explicit configuration outranks them
/// for the same slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Directives {
    /// The property is part of the key.
    pub key: bool,

    /// Ordinal of the column; orders composite keys and columns.
    pub column_order: Option<i32>,

    /// The property, or the reference navigation, is required.
    pub required: bool,

    /// On a navigation: comma separated dependent properties. On a scalar
    /// property: the navigation the property is a foreign key for.
    pub foreign_key: Option<String>,

    /// Navigation on the target type that is the inverse of this one.
    pub inverse_property: Option<String>,

    pub max_length: Option<u32>,

    pub column_name: Option<String>,

    pub column_type: Option<String>,

    pub concurrency_check: bool,

    pub timestamp: bool,

    pub not_mapped: bool,

    pub database_generated: Option<StoreGenerated>,
}

impl Directives {
    /// Splits the foreign key directive into its property names.
    pub(crate) fn foreign_key_names(&self) -> Vec<String> {
        self.foreign_key
            .as_deref()
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}
