mod association;
mod discover;
mod draft;
mod inheritance;
mod table;
mod uniquify;

use super::convention::{ConventionContext, Conventions, Phase};
use super::{ConfigurationStore, Schema, TypeGraph};
use crate::Result;
use serde::Deserialize;
use tracing::debug;

/// Options that shape the generated store model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Database schema for tables named without one
    pub default_schema: String,

    /// If set, prefix all table names with this string
    pub table_name_prefix: Option<String>,

    /// Name of the synthesized discriminator column
    pub discriminator_column: String,

    /// Max length of string key and discriminator columns
    pub key_max_length: u32,

    /// Precision and scale of decimal columns
    pub decimal_precision: (u8, u8),
}

#[derive(Debug, Clone, Default)]
pub struct Builder {
    options: BuildOptions,
    conventions: Conventions,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(&mut self, options: BuildOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn table_name_prefix(&mut self, prefix: &str) -> &mut Self {
        self.options.table_name_prefix = Some(prefix.to_string());
        self
    }

    pub fn conventions(&mut self, conventions: Conventions) -> &mut Self {
        self.conventions = conventions;
        self
    }

    pub fn conventions_mut(&mut self) -> &mut Conventions {
        &mut self.conventions
    }

    /// Builds and validates the model.
    pub fn build(&self, graph: &TypeGraph, config: &ConfigurationStore) -> Result<Schema> {
        let schema = self.build_unvalidated(graph, config)?;
        schema.verify()?;
        Ok(schema)
    }

    /// Builds the model without the final validation pass, so that an
    /// invalid model can be inspected.
    pub fn build_unvalidated(&self, graph: &TypeGraph, config: &ConfigurationStore) -> Result<Schema> {
        let discovered = discover::discover(graph, config)?;
        debug!(
            entities = discovered.entities.len(),
            complex_types = discovered.complex_types.len(),
            "discovered types"
        );

        let mut app = draft::draft(config, &discovered)?;

        let mut cx = ConventionContext::new(config, &self.options);
        self.conventions.apply(Phase::Discovery, &mut app, &mut cx);
        draft::configure_complex_types(&mut app, config)?;
        draft::check_property_paths(&app, config)?;
        draft::finish_keys(&mut app, &cx)?;

        association::resolve(&mut app, config)?;
        debug!(associations = app.associations.len(), "resolved associations");

        self.conventions.apply(Phase::Association, &mut app, &mut cx);
        association::build_entity_sets(&mut app);

        let plan = inheritance::plan(&app, config, &self.options)?;
        let (mut db, mapping) = table::build(&app, config, &plan, &self.options)?;
        debug!(tables = db.tables.len(), "built store model");

        uniquify::uniquify(&mut db);

        Ok(Schema { app, db, mapping })
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            default_schema: "dbo".to_string(),
            table_name_prefix: None,
            discriminator_column: "Discriminator".to_string(),
            key_max_length: 128,
            decimal_precision: (18, 2),
        }
    }
}
