use super::{EntityId, Source};
use crate::schema::TableName;
use serde::Serialize;
use std::fmt;

/// A relationship between two entity types.
#[derive(Debug, Clone, Serialize)]
pub struct Association {
    pub id: AssociationId,

    /// `{SourceType}_{SourceNavigation}`
    pub name: String,

    pub source: AssociationEnd,

    pub target: AssociationEnd,

    pub constraint: Constraint,

    /// Where the constraint came from; a `Convention` independent
    /// association may still be upgraded by foreign key discovery.
    pub constraint_source: Source,

    /// Set once the delete behavior of the principal end is decided
    pub cascade_source: Option<Source>,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize)]
pub struct AssociationId(pub usize);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociationEnd {
    /// Entity type at this end; may be a derived type
    pub entity: EntityId,

    pub multiplicity: Multiplicity,

    pub multiplicity_source: Source,

    /// Navigation declared on this end's type, pointing at the other end
    pub navigation: Option<String>,

    pub delete_behavior: DeleteBehavior,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Multiplicity {
    ZeroOrOne,
    One,
    Many,
}

/// Role of an end in a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Role {
    Principal,
    Dependent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum End {
    Source,
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeleteBehavior {
    None,
    Cascade,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Constraint {
    ForeignKey(ForeignKeyConstraint),
    Independent(IndependentConstraint),
}

/// The dependent end carries properties holding the principal's key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeignKeyConstraint {
    pub dependent: End,

    /// Dependent properties, aligned with `principal_properties`
    pub dependent_properties: Vec<String>,

    /// The principal's key properties, in key order
    pub principal_properties: Vec<String>,
}

/// No foreign key properties; the key lives in store-only columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndependentConstraint {
    /// `None` for many-to-many associations
    pub dependent: Option<End>,

    /// Explicit column names in the dependent's table
    pub key_columns: Vec<String>,

    /// Explicit join table name
    pub join_table: Option<TableName>,

    /// Explicit join table columns referencing the source end
    pub source_keys: Vec<String>,

    /// Explicit join table columns referencing the target end
    pub target_keys: Vec<String>,

    /// Join table rows are deleted with either end
    pub cascade_delete: bool,
}

impl Association {
    pub fn end(&self, end: End) -> &AssociationEnd {
        match end {
            End::Source => &self.source,
            End::Target => &self.target,
        }
    }

    pub fn end_mut(&mut self, end: End) -> &mut AssociationEnd {
        match end {
            End::Source => &mut self.source,
            End::Target => &mut self.target,
        }
    }

    pub fn ends(&self) -> [&AssociationEnd; 2] {
        [&self.source, &self.target]
    }

    pub fn is_many_to_many(&self) -> bool {
        self.source.multiplicity == Multiplicity::Many && self.target.multiplicity == Multiplicity::Many
    }

    /// The dependent end, when the association has one.
    pub fn dependent_end(&self) -> Option<End> {
        match &self.constraint {
            Constraint::ForeignKey(fk) => Some(fk.dependent),
            Constraint::Independent(ia) => ia.dependent,
        }
    }

    pub fn principal_end(&self) -> Option<End> {
        self.dependent_end().map(End::other)
    }

    pub fn dependent(&self) -> Option<&AssociationEnd> {
        self.dependent_end().map(|end| self.end(end))
    }

    pub fn principal(&self) -> Option<&AssociationEnd> {
        self.principal_end().map(|end| self.end(end))
    }

    pub fn foreign_key(&self) -> Option<&ForeignKeyConstraint> {
        match &self.constraint {
            Constraint::ForeignKey(fk) => Some(fk),
            Constraint::Independent(_) => None,
        }
    }

    pub fn independent(&self) -> Option<&IndependentConstraint> {
        match &self.constraint {
            Constraint::Independent(ia) => Some(ia),
            Constraint::ForeignKey(_) => None,
        }
    }

    pub fn is_independent(&self) -> bool {
        matches!(self.constraint, Constraint::Independent(_))
    }
}

impl End {
    pub fn other(self) -> End {
        match self {
            End::Source => End::Target,
            End::Target => End::Source,
        }
    }
}

impl Role {
    pub fn other(self) -> Role {
        match self {
            Role::Principal => Role::Dependent,
            Role::Dependent => Role::Principal,
        }
    }
}

impl Multiplicity {
    pub fn is_many(self) -> bool {
        self == Multiplicity::Many
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Multiplicity::ZeroOrOne => "0..1",
            Multiplicity::One => "1",
            Multiplicity::Many => "*",
        })
    }
}

impl fmt::Debug for AssociationId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "AssociationId({})", self.0)
    }
}
