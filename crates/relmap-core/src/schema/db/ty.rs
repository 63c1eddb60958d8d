use crate::schema::graph::ScalarType;
use serde::Serialize;

/// Database storage types.
///
/// Scalar property types map to a default storage type; a column type
/// facet replaces it. Foreign key columns must have the same storage type as
/// the principal key columns they reference. Lengths, precision and scale
/// are carried on the column, not on the type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Type {
    Bit,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Decimal,
    Float,
    NVarChar,
    VarChar,
    VarBinary,
    UniqueIdentifier,
    DateTime,
    RowVersion,

    /// A store type without a built-in equivalent
    Custom(String),
}

impl Type {
    pub fn from_scalar(ty: ScalarType) -> Type {
        match ty {
            ScalarType::Bool => Type::Bit,
            ScalarType::Byte => Type::TinyInt,
            ScalarType::Int16 => Type::SmallInt,
            ScalarType::Int32 => Type::Int,
            ScalarType::Int64 => Type::BigInt,
            ScalarType::Decimal => Type::Decimal,
            ScalarType::Double => Type::Float,
            ScalarType::String => Type::NVarChar,
            ScalarType::Binary => Type::VarBinary,
            ScalarType::Guid => Type::UniqueIdentifier,
            ScalarType::DateTime => Type::DateTime,
        }
    }

    /// Parses a store type name, ignoring case and any `(...)` suffix.
    pub fn parse(name: &str) -> Type {
        let base = name.split('(').next().unwrap_or(name).trim().to_lowercase();

        match &base[..] {
            "bit" => Type::Bit,
            "tinyint" => Type::TinyInt,
            "smallint" => Type::SmallInt,
            "int" => Type::Int,
            "bigint" => Type::BigInt,
            "decimal" | "numeric" => Type::Decimal,
            "float" => Type::Float,
            "nvarchar" => Type::NVarChar,
            "varchar" => Type::VarChar,
            "varbinary" => Type::VarBinary,
            "uniqueidentifier" => Type::UniqueIdentifier,
            "datetime" => Type::DateTime,
            "rowversion" | "timestamp" => Type::RowVersion,
            _ => Type::Custom(base),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Type::Bit => "bit",
            Type::TinyInt => "tinyint",
            Type::SmallInt => "smallint",
            Type::Int => "int",
            Type::BigInt => "bigint",
            Type::Decimal => "decimal",
            Type::Float => "float",
            Type::NVarChar => "nvarchar",
            Type::VarChar => "varchar",
            Type::VarBinary => "varbinary",
            Type::UniqueIdentifier => "uniqueidentifier",
            Type::DateTime => "datetime",
            Type::RowVersion => "rowversion",
            Type::Custom(name) => name,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Type::NVarChar | Type::VarChar)
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, Type::TinyInt | Type::SmallInt | Type::Int | Type::BigInt)
    }
}
