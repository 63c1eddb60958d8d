use super::Error;

/// Symbolic identifier of a model-building failure.
///
/// Each key comes with positional arguments naming the offending types,
/// properties, tables or columns. The argument order for each key is listed
/// on the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKey {
    /// `(type a, type b)` in canonical order.
    UnableToDeterminePrincipal,
    /// `(navigation, declaring type)`
    ConflictingMultiplicities,
    /// `(navigation, declaring type)`
    ConflictingConstraint,
    /// `(navigation, declaring type)`
    ConflictingMapping,
    /// `(facet, property path, first value, second value)`
    ConflictingConfigurationValue,
    /// `(type, column order)`
    DuplicateConfiguredColumnOrder,
    /// `(table)`
    OrphanedConfiguredTableDetected,
    /// `(complex type)`
    CircularComplexTypeHierarchy,
    /// `(navigation, type)`
    NavigationPropertyNotFound,
    /// `(property, type)`
    ForeignKeyPropertyNotFound,
    /// `(type)`
    TypeNotFound,
    /// `(property, type)`
    NoSuchProperty,
    /// `(type)`
    KeyNotDefined,
    /// `(type, candidate properties)`
    MultiplePropertiesMatchedAsKeys,
    /// `(type)`
    CompositeKeyOrderMissing,
    /// `(navigation, dependent type, expected count, actual count)`
    ForeignKeyArityMismatch,
    /// `(dependent table, column, dependent type, principal table, column, principal type)`
    ForeignKeyTypeMismatch,
    /// `(table, type)`
    MissingDiscriminatorValue,
    /// `(table, value, first type, second type)`
    DuplicateDiscriminatorValue,
    /// `(table, column)`
    ColumnNameCollision,
    /// `(table)`
    TableNameCollision,
    /// `(association)`
    EntitySetNotResolvable,
    /// `(type)`
    UnsupportedTablePerConcreteMapping,
    /// `(table, first type, second type)`
    InvalidTableSplitting,
    /// `(property, type)`
    UnmappedProperty,
    /// `(convention)`
    ConventionNotFound,
    /// `(convention)`
    DuplicateConvention,
}

/// Coarse grouping of [`ErrorKey`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Two explicit statements disagree.
    ConfigurationConflict,

    /// The available information does not determine a single answer.
    AmbiguousResolution,

    /// The assembled model breaks a global invariant.
    StructuralViolation,

    /// A directive or configuration statement refers to something that does
    /// not exist or is incomplete.
    MalformedDirective,
}

/// A structured model error: a key plus its positional arguments.
#[derive(Debug)]
pub(super) struct ModelError {
    key: ErrorKey,
    args: Box<[String]>,
}

impl ErrorKey {
    pub fn category(self) -> ErrorCategory {
        use ErrorKey::*;

        match self {
            ConflictingMultiplicities
            | ConflictingConstraint
            | ConflictingMapping
            | ConflictingConfigurationValue
            | DuplicateConfiguredColumnOrder
            | ConventionNotFound
            | DuplicateConvention => ErrorCategory::ConfigurationConflict,
            UnableToDeterminePrincipal | MultiplePropertiesMatchedAsKeys => {
                ErrorCategory::AmbiguousResolution
            }
            OrphanedConfiguredTableDetected
            | CircularComplexTypeHierarchy
            | KeyNotDefined
            | ForeignKeyTypeMismatch
            | MissingDiscriminatorValue
            | DuplicateDiscriminatorValue
            | ColumnNameCollision
            | TableNameCollision
            | EntitySetNotResolvable
            | UnsupportedTablePerConcreteMapping
            | InvalidTableSplitting
            | UnmappedProperty => ErrorCategory::StructuralViolation,
            NavigationPropertyNotFound
            | ForeignKeyPropertyNotFound
            | TypeNotFound
            | NoSuchProperty
            | CompositeKeyOrderMissing
            | ForeignKeyArityMismatch => ErrorCategory::MalformedDirective,
        }
    }

    pub fn as_str(self) -> &'static str {
        use ErrorKey::*;

        match self {
            UnableToDeterminePrincipal => "UnableToDeterminePrincipal",
            ConflictingMultiplicities => "ConflictingMultiplicities",
            ConflictingConstraint => "ConflictingConstraint",
            ConflictingMapping => "ConflictingMapping",
            ConflictingConfigurationValue => "ConflictingConfigurationValue",
            DuplicateConfiguredColumnOrder => "DuplicateConfiguredColumnOrder",
            OrphanedConfiguredTableDetected => "OrphanedConfiguredTableDetected",
            CircularComplexTypeHierarchy => "CircularComplexTypeHierarchy",
            NavigationPropertyNotFound => "NavigationPropertyNotFound",
            ForeignKeyPropertyNotFound => "ForeignKeyPropertyNotFound",
            TypeNotFound => "TypeNotFound",
            NoSuchProperty => "NoSuchProperty",
            KeyNotDefined => "KeyNotDefined",
            MultiplePropertiesMatchedAsKeys => "MultiplePropertiesMatchedAsKeys",
            CompositeKeyOrderMissing => "CompositeKeyOrderMissing",
            ForeignKeyArityMismatch => "ForeignKeyArityMismatch",
            ForeignKeyTypeMismatch => "ForeignKeyTypeMismatch",
            MissingDiscriminatorValue => "MissingDiscriminatorValue",
            DuplicateDiscriminatorValue => "DuplicateDiscriminatorValue",
            ColumnNameCollision => "ColumnNameCollision",
            TableNameCollision => "TableNameCollision",
            EntitySetNotResolvable => "EntitySetNotResolvable",
            UnsupportedTablePerConcreteMapping => "UnsupportedTablePerConcreteMapping",
            InvalidTableSplitting => "InvalidTableSplitting",
            UnmappedProperty => "UnmappedProperty",
            ConventionNotFound => "ConventionNotFound",
            DuplicateConvention => "DuplicateConvention",
        }
    }
}

impl core::fmt::Display for ErrorKey {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for ModelError {}

impl core::fmt::Display for ModelError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use ErrorKey::*;

        let arg = |i: usize| self.args.get(i).map(String::as_str).unwrap_or("?");

        write!(f, "{}: ", self.key)?;

        match self.key {
            UnableToDeterminePrincipal => write!(
                f,
                "unable to determine the principal end of an association between the types '{}' and '{}'",
                arg(0),
                arg(1)
            ),
            ConflictingMultiplicities => write!(
                f,
                "conflicting multiplicities configured for the navigation '{}' on type '{}'",
                arg(0),
                arg(1)
            ),
            ConflictingConstraint => write!(
                f,
                "conflicting constraints configured for the navigation '{}' on type '{}'",
                arg(0),
                arg(1)
            ),
            ConflictingMapping => write!(
                f,
                "conflicting mapping configured for the navigation '{}' on type '{}'",
                arg(0),
                arg(1)
            ),
            ConflictingConfigurationValue => write!(
                f,
                "conflicting values for '{}' on '{}': '{}' and '{}'",
                arg(0),
                arg(1),
                arg(2),
                arg(3)
            ),
            DuplicateConfiguredColumnOrder => write!(
                f,
                "column order {} is configured more than once on type '{}'",
                arg(1),
                arg(0)
            ),
            OrphanedConfiguredTableDetected => write!(
                f,
                "the configured table '{}' has no non-key columns",
                arg(0)
            ),
            CircularComplexTypeHierarchy => {
                write!(f, "the complex type '{}' contains itself", arg(0))
            }
            NavigationPropertyNotFound => write!(
                f,
                "the navigation '{}' was not found on type '{}'",
                arg(0),
                arg(1)
            ),
            ForeignKeyPropertyNotFound => write!(
                f,
                "the foreign key property '{}' was not found on type '{}'",
                arg(0),
                arg(1)
            ),
            TypeNotFound => write!(f, "the type '{}' is not part of the model", arg(0)),
            NoSuchProperty => write!(
                f,
                "the property '{}' was not found on type '{}'",
                arg(0),
                arg(1)
            ),
            KeyNotDefined => write!(f, "the entity type '{}' has no key defined", arg(0)),
            MultiplePropertiesMatchedAsKeys => write!(
                f,
                "several properties of type '{}' match the key convention: {}",
                arg(0),
                arg(1)
            ),
            CompositeKeyOrderMissing => write!(
                f,
                "the composite key of type '{}' does not declare a column order for every property",
                arg(0)
            ),
            ForeignKeyArityMismatch => write!(
                f,
                "the foreign key for navigation '{}' on type '{}' has {} properties but the principal key has {}",
                arg(0),
                arg(1),
                arg(3),
                arg(2)
            ),
            ForeignKeyTypeMismatch => write!(
                f,
                "the column '{}.{}' of type '{}' does not match the principal column '{}.{}' of type '{}'",
                arg(0),
                arg(1),
                arg(2),
                arg(3),
                arg(4),
                arg(5)
            ),
            MissingDiscriminatorValue => write!(
                f,
                "the type '{}' stored in table '{}' has no discriminator value",
                arg(1),
                arg(0)
            ),
            DuplicateDiscriminatorValue => write!(
                f,
                "the discriminator value '{}' in table '{}' is used by both '{}' and '{}'",
                arg(1),
                arg(0),
                arg(2),
                arg(3)
            ),
            ColumnNameCollision => write!(
                f,
                "the column name '{}' is used more than once in table '{}'",
                arg(1),
                arg(0)
            ),
            TableNameCollision => write!(f, "the table name '{}' is used more than once", arg(0)),
            EntitySetNotResolvable => write!(
                f,
                "the ends of association '{}' do not resolve to entity sets",
                arg(0)
            ),
            UnsupportedTablePerConcreteMapping => write!(
                f,
                "the table-per-concrete-type mapping of type '{}' leaves it without a table or mixes it with a shared table",
                arg(0)
            ),
            InvalidTableSplitting => write!(
                f,
                "the types '{}' and '{}' share table '{}' without a required one-to-one association over their keys",
                arg(1),
                arg(2),
                arg(0)
            ),
            UnmappedProperty => write!(
                f,
                "the property '{}' on type '{}' is not mapped to any table",
                arg(0),
                arg(1)
            ),
            ConventionNotFound => write!(f, "no convention named '{}'", arg(0)),
            DuplicateConvention => write!(f, "a convention named '{}' already exists", arg(0)),
        }
    }
}

impl Error {
    /// Creates a structured model error.
    pub fn from_key<S: Into<String>>(key: ErrorKey, args: impl IntoIterator<Item = S>) -> Error {
        Error::from(super::ErrorKind::Model(ModelError {
            key,
            args: args.into_iter().map(Into::into).collect(),
        }))
    }

    /// Returns the key of this error.
    ///
    /// For an aggregate this is the key of the first collected failure.
    pub fn key(&self) -> Option<ErrorKey> {
        match self.kind() {
            super::ErrorKind::Model(err) => Some(err.key),
            super::ErrorKind::Aggregate(_) => self.errors().next().and_then(Error::key),
            _ => None,
        }
    }

    /// Returns the positional arguments of a structured model error.
    pub fn args(&self) -> &[String] {
        match self.kind() {
            super::ErrorKind::Model(err) => &err.args,
            super::ErrorKind::Aggregate(_) => self.errors().next().map(Error::args).unwrap_or(&[]),
            _ => &[],
        }
    }

    pub fn category(&self) -> Option<ErrorCategory> {
        self.key().map(ErrorKey::category)
    }

    /// Returns `true` if this error, or any error it aggregates, has the
    /// given key.
    pub fn has_key(&self, key: ErrorKey) -> bool {
        self.errors().any(|err| err.key() == Some(key))
    }
}
