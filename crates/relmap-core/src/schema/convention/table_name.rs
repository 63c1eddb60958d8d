use super::{Convention, ConventionContext, Phase};
use crate::schema::app::{self, FacetSlot};
use crate::schema::TableName;
use std_util::str::pluralize;

/// Names tables after the pluralized type name.
#[derive(Debug)]
pub struct PluralizingTableName;

/// Names entity sets after the pluralized root type name.
#[derive(Debug)]
pub struct PluralizingEntitySetName;

impl Convention for PluralizingTableName {
    fn name(&self) -> &str {
        "PluralizingTableName"
    }

    fn phase(&self) -> Phase {
        Phase::Discovery
    }

    fn apply(&self, model: &mut app::Schema, _cx: &mut ConventionContext<'_>) {
        for entity in model.entities.values_mut() {
            let name = pluralize(&entity.name);
            entity.table.set_by_convention(TableName::new(name));
        }
    }
}

impl Convention for PluralizingEntitySetName {
    fn name(&self) -> &str {
        "PluralizingEntitySetName"
    }

    fn phase(&self) -> Phase {
        Phase::Discovery
    }

    fn apply(&self, model: &mut app::Schema, _cx: &mut ConventionContext<'_>) {
        for entity in model.entities.values_mut().filter(|entity| entity.is_root()) {
            let name = pluralize(&entity.name);
            entity.entity_set_name.set_by_convention(name);
        }
    }
}
