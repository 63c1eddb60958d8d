use super::{Convention, ConventionContext, Phase};
use crate::schema::app::{self, Facet, FacetSlot, Property};
use crate::schema::db::StoreGenerated;
use crate::schema::graph::ScalarType;

/// Default storage facets: bounded string keys, decimal precision and row
/// version columns.
#[derive(Debug)]
pub struct ColumnFacets;

impl Convention for ColumnFacets {
    fn name(&self) -> &str {
        "ColumnFacets"
    }

    fn phase(&self) -> Phase {
        Phase::Discovery
    }

    fn apply(&self, model: &mut app::Schema, cx: &mut ConventionContext<'_>) {
        let options = cx.options;

        for entity in model.entities.values_mut() {
            let key = entity.key.as_ref().map(|key| key.value.clone()).unwrap_or_default();

            for property in &mut entity.properties {
                if key.contains(&property.name) && property.scalar_ty() == Some(ScalarType::String) {
                    property.max_length.set_by_convention(options.key_max_length);
                }

                apply_defaults(property, options.decimal_precision);
            }
        }

        for complex in model.complex_types.values_mut() {
            for property in &mut complex.properties {
                apply_defaults(property, options.decimal_precision);
            }
        }
    }
}

fn apply_defaults(property: &mut Property, decimal_precision: (u8, u8)) {
    if property.scalar_ty() == Some(ScalarType::Decimal) {
        property.precision.set_by_convention(decimal_precision);
    }

    if property.row_version {
        property.column_type.set_by_convention("rowversion".to_string());
        property.store_generated.set_by_convention(StoreGenerated::Computed);
        property.concurrency_token = true;

        if !property.nullable.is_configured() {
            property.nullable = Facet::convention(false);
        }
    }
}
