pub mod app;

mod builder;
pub use builder::{BuildOptions, Builder};

pub mod config;
pub use config::ConfigurationStore;

pub mod convention;
pub use convention::{Convention, ConventionContext, Conventions, Phase};

pub mod db;

pub mod graph;
pub use graph::TypeGraph;

pub mod mapping;
use mapping::{EntityMapping, Mapping};

mod name;
pub use name::TableName;

mod verify;

use crate::Result;
use app::EntityType;
use db::Table;
use serde::Serialize;

/// A built model: the conceptual layer, the store layer and the mapping
/// between them.
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    /// Conceptual schema
    pub app: app::Schema,

    /// Database-level schema
    pub db: db::Schema,

    /// Maps the conceptual schema to the db-level schema
    pub mapping: Mapping,
}

impl Schema {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn entity(&self, name: &str) -> Option<&EntityType> {
        self.app.entity_by_name(name)
    }

    pub fn mapping_for(&self, name: &str) -> Option<&EntityMapping> {
        let entity = self.entity(name)?;
        self.mapping.entities.get(&entity.id)
    }

    /// The table holding the entity's primary key.
    pub fn table_for(&self, name: &str) -> Option<&Table> {
        let fragment = self.mapping_for(name)?.fragments.first()?;
        Some(self.db.table(fragment.table))
    }

    /// Serializes all three layers. Building the same input twice yields
    /// the same text.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
