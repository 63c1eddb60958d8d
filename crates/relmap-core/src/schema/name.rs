use serde::Serialize;
use std::fmt;

/// A schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TableName {
    /// Database schema, e.g. `dbo`
    pub schema: Option<String>,

    pub name: String,
}

impl TableName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    pub fn with_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// Fills in the schema when none was given.
    pub(crate) fn or_schema(mut self, schema: &str) -> Self {
        if self.schema.is_none() {
            self.schema = Some(schema.to_string());
        }
        self
    }

    /// Case-insensitive identity used when comparing table names.
    pub(crate) fn key(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema.to_lowercase(), self.name.to_lowercase()),
            None => self.name.to_lowercase(),
        }
    }
}

impl From<&str> for TableName {
    fn from(src: &str) -> Self {
        match src.split_once('.') {
            Some((schema, name)) => TableName::with_schema(schema, name),
            None => TableName::new(src),
        }
    }
}

impl From<String> for TableName {
    fn from(src: String) -> Self {
        TableName::from(&src[..])
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}
