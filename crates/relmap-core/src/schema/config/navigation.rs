use crate::schema::app::{Multiplicity, Role};
use crate::schema::TableName;

/// One configuration statement chain about a navigation.
///
/// Started by `has_required`, `has_optional` or `has_many` on the declaring
/// entity, the chain describes the association from that entity's point of
/// view: the `has_*` call sets the multiplicity of the target end, the
/// `with_*` call names the inverse navigation and sets the multiplicity of
/// the declaring entity's own end.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationConfiguration {
    pub(crate) navigation: String,
    pub(crate) target_multiplicity: Multiplicity,
    pub(crate) inverse: Option<Inverse>,
    pub(crate) source_multiplicity: Option<Multiplicity>,
    pub(crate) source_role: Option<Role>,
    pub(crate) constraint: Option<ConstraintConfiguration>,
    pub(crate) cascade_delete: Option<bool>,
}

/// The inverse side named by a `with_*` call.
#[derive(Debug, Clone, PartialEq)]
pub enum Inverse {
    /// The association is navigable from one side only.
    None,

    Navigation(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintConfiguration {
    /// Dependent properties, in principal key order
    ForeignKey(Vec<String>),

    Independent(AssociationMappingConfiguration),
}

/// Store mapping of an independent association.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssociationMappingConfiguration {
    pub(crate) key_columns: Vec<String>,
    pub(crate) table: Option<TableName>,
    pub(crate) left_keys: Vec<String>,
    pub(crate) right_keys: Vec<String>,
}

impl NavigationConfiguration {
    pub(crate) fn new(navigation: &str, target_multiplicity: Multiplicity) -> Self {
        Self {
            navigation: navigation.to_string(),
            target_multiplicity,
            inverse: None,
            source_multiplicity: None,
            source_role: None,
            constraint: None,
            cascade_delete: None,
        }
    }

    fn with(
        &mut self,
        inverse: Option<&str>,
        multiplicity: Multiplicity,
        role: Option<Role>,
    ) -> &mut Self {
        self.inverse = Some(match inverse {
            Some(name) => Inverse::Navigation(name.to_string()),
            None => Inverse::None,
        });
        self.source_multiplicity = Some(multiplicity);
        self.source_role = role;
        self
    }

    pub fn with_required<'b>(&mut self, inverse: impl Into<Option<&'b str>>) -> &mut Self {
        self.with(inverse.into(), Multiplicity::One, None)
    }

    pub fn with_required_principal<'b>(&mut self, inverse: impl Into<Option<&'b str>>) -> &mut Self {
        self.with(inverse.into(), Multiplicity::One, Some(Role::Principal))
    }

    pub fn with_required_dependent<'b>(&mut self, inverse: impl Into<Option<&'b str>>) -> &mut Self {
        self.with(inverse.into(), Multiplicity::One, Some(Role::Dependent))
    }

    pub fn with_optional<'b>(&mut self, inverse: impl Into<Option<&'b str>>) -> &mut Self {
        self.with(inverse.into(), Multiplicity::ZeroOrOne, None)
    }

    pub fn with_optional_principal<'b>(&mut self, inverse: impl Into<Option<&'b str>>) -> &mut Self {
        self.with(inverse.into(), Multiplicity::ZeroOrOne, Some(Role::Principal))
    }

    pub fn with_optional_dependent<'b>(&mut self, inverse: impl Into<Option<&'b str>>) -> &mut Self {
        self.with(inverse.into(), Multiplicity::ZeroOrOne, Some(Role::Dependent))
    }

    pub fn with_many<'b>(&mut self, inverse: impl Into<Option<&'b str>>) -> &mut Self {
        self.with(inverse.into(), Multiplicity::Many, None)
    }

    /// Names the dependent properties, in principal key order.
    pub fn has_foreign_key<S: Into<String>>(&mut self, properties: impl IntoIterator<Item = S>) -> &mut Self {
        self.constraint = Some(ConstraintConfiguration::ForeignKey(
            properties.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Maps the association as independent, optionally naming its columns
    /// or join table.
    pub fn map(&mut self, f: impl FnOnce(&mut AssociationMappingConfiguration)) -> &mut Self {
        let mut mapping = AssociationMappingConfiguration::default();
        f(&mut mapping);
        self.constraint = Some(ConstraintConfiguration::Independent(mapping));
        self
    }

    pub fn will_cascade_on_delete(&mut self, cascade: bool) -> &mut Self {
        self.cascade_delete = Some(cascade);
        self
    }

    pub(crate) fn inverse_navigation(&self) -> Option<&str> {
        match &self.inverse {
            Some(Inverse::Navigation(name)) => Some(name),
            _ => None,
        }
    }
}

impl AssociationMappingConfiguration {
    /// Names the foreign key columns in the dependent's table.
    pub fn map_key<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>) -> &mut Self {
        self.key_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Names the join table of a many-to-many association.
    pub fn to_table(&mut self, table: impl Into<TableName>) -> &mut Self {
        self.table = Some(table.into());
        self
    }

    /// Join table columns referencing the configured entity.
    pub fn map_left_key<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>) -> &mut Self {
        self.left_keys = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Join table columns referencing the other entity.
    pub fn map_right_key<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>) -> &mut Self {
        self.right_keys = columns.into_iter().map(Into::into).collect();
        self
    }
}
