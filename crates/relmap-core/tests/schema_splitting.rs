use pretty_assertions::assert_eq;
use relmap_core::schema::db::{StoreGenerated, Type};
use relmap_core::schema::graph::{PropertyDescriptor, ScalarType, TypeDescriptor};
use relmap_core::schema::{Builder, ConfigurationStore, TypeGraph};
use relmap_core::{ErrorKey, Schema};
use std_util::prelude::*;

fn build(graph: &TypeGraph, config: &ConfigurationStore) -> Schema {
    assert_ok!(Builder::new().build(graph, config))
}

#[test]
fn entity_splitting() {
    let graph = TypeGraph::new().with_type(
        TypeDescriptor::entity("Product")
            .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
            .property(PropertyDescriptor::scalar("Name", ScalarType::String))
            .property(PropertyDescriptor::scalar("Description", ScalarType::String)),
    );

    let mut config = ConfigurationStore::new();
    config
        .entity("Product")
        .map(|m| {
            m.properties(["Id", "Name"]).to_table("Products");
        })
        .map(|m| {
            m.properties(["Id", "Description"]).to_table("ProductDetails");
        });

    let schema = build(&graph, &config);

    let products = schema.db.table_by_name("Products").unwrap();
    let details = schema.db.table_by_name("ProductDetails").unwrap();

    assert_eq!(vec!["Id", "Name"], products.column_names());
    assert_eq!(vec!["Id", "Description"], details.column_names());

    assert_eq!(StoreGenerated::Identity, products.columns[0].store_generated);
    assert_eq!(StoreGenerated::None, details.columns[0].store_generated);

    assert_empty!(products.foreign_keys);
    let fk = &details.foreign_keys[0];
    assert_eq!("Product_ProductDetails", fk.name);
    assert_eq!(products.id, fk.principal_table);

    let mapping = schema.mapping_for("Product").unwrap();
    assert_eq!(2, mapping.fragments.len());
    assert_eq!(details.id, mapping.column_for(&["Description"]).unwrap().table);
}

fn order_graph() -> TypeGraph {
    TypeGraph::new()
        .with_type(
            TypeDescriptor::entity("Order")
                .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
                .property(PropertyDescriptor::scalar("Total", ScalarType::Decimal))
                .property(PropertyDescriptor::reference("Detail", "OrderDetail")),
        )
        .with_type(
            TypeDescriptor::entity("OrderDetail")
                .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
                .property(PropertyDescriptor::scalar("Notes", ScalarType::String))
                .property(PropertyDescriptor::reference("Order", "Order")),
        )
}

#[test]
fn table_splitting() {
    let mut config = ConfigurationStore::new();
    config.entity("Order").to_table("Orders");
    config.entity("OrderDetail").to_table("Orders");
    config
        .entity("OrderDetail")
        .has_required("Order")
        .with_required_dependent("Detail");

    let schema = build(&order_graph(), &config);

    assert_eq!(1, schema.db.tables.len());

    let table = &schema.db.tables[0];
    assert_eq!(vec!["Id", "Total", "Notes"], table.column_names());
    assert_empty!(table.foreign_keys);
    assert_eq!(StoreGenerated::Identity, table.columns[0].store_generated);

    let total = table.column_by_name("Total").unwrap();
    assert_eq!(Type::Decimal, total.ty);
    assert_eq!((Some(18), Some(2)), (total.precision, total.scale));

    let order = schema.mapping_for("Order").unwrap();
    let detail = schema.mapping_for("OrderDetail").unwrap();
    assert_eq!(order.column_for(&["Id"]), detail.column_for(&["Id"]));
}

#[test]
fn unrelated_types_cannot_share_a_table() {
    let graph = TypeGraph::new()
        .with_type(TypeDescriptor::entity("Order").property(PropertyDescriptor::scalar("Id", ScalarType::Int32)))
        .with_type(TypeDescriptor::entity("Invoice").property(PropertyDescriptor::scalar("Id", ScalarType::Int32)));

    let mut config = ConfigurationStore::new();
    config.entity("Order").to_table("Docs");
    config.entity("Invoice").to_table("Docs");

    let err = assert_err!(Builder::new().build(&graph, &config));

    assert_eq!(Some(ErrorKey::InvalidTableSplitting), err.key());
    assert_eq!(["dbo.Docs", "Invoice", "Order"], err.args());
}

fn customer_graph() -> TypeGraph {
    TypeGraph::new()
        .with_type(
            TypeDescriptor::entity("Customer")
                .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
                .property(PropertyDescriptor::scalar("Name", ScalarType::String))
                .property(PropertyDescriptor::complex("Address", "Address")),
        )
        .with_type(
            TypeDescriptor::complex("Address")
                .property(PropertyDescriptor::scalar("Street", ScalarType::String))
                .property(PropertyDescriptor::scalar("City", ScalarType::String))
                .property(PropertyDescriptor::complex("Geo", "Geo")),
        )
        .with_type(
            TypeDescriptor::complex("Geo")
                .property(PropertyDescriptor::scalar("Lat", ScalarType::Double))
                .property(PropertyDescriptor::scalar("Lng", ScalarType::Double)),
        )
}

#[test]
fn complex_properties_are_flattened() {
    let schema = build(&customer_graph(), &ConfigurationStore::new());

    let table = schema.table_for("Customer").unwrap();
    assert_eq!(
        vec!["Id", "Name", "Address_Street", "Address_City", "Address_Geo_Lat", "Address_Geo_Lng"],
        table.column_names()
    );

    assert!(table.column_by_name("Address_Street").unwrap().nullable);
    assert!(!table.column_by_name("Address_Geo_Lat").unwrap().nullable);
    assert_eq!(Type::Float, table.column_by_name("Address_Geo_Lat").unwrap().ty);

    let mapping = schema.mapping_for("Customer").unwrap();
    let lat = mapping.column_for(&["Address", "Geo", "Lat"]).unwrap();
    assert_eq!("Address_Geo_Lat", schema.db.column(lat).name);

    assert_eq!(2, schema.app.complex_types.len());
}

#[test]
fn complex_property_configuration() {
    let mut config = ConfigurationStore::new();
    config.complex_properties().property("City").has_max_length(60);
    config
        .entity("Customer")
        .property("Address.Street")
        .has_column_name("Street");

    let schema = build(&customer_graph(), &config);

    let table = schema.table_for("Customer").unwrap();
    assert_eq!(
        vec!["Id", "Name", "Street", "Address_City", "Address_Geo_Lat", "Address_Geo_Lng"],
        table.column_names()
    );
    assert_eq!(Some(60), table.column_by_name("Address_City").unwrap().max_length);
}

fn discovered_address_graph() -> TypeGraph {
    TypeGraph::new()
        .with_type(
            TypeDescriptor::entity("Customer")
                .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
                .property(PropertyDescriptor::reference("Address", "Address")),
        )
        .with_type(
            TypeDescriptor::entity("Address")
                .property(PropertyDescriptor::scalar("Street", ScalarType::String))
                .property(PropertyDescriptor::scalar("City", ScalarType::String)),
        )
        .with_root("Customer")
}

#[test]
fn discovered_complex_type_takes_global_configuration() {
    let mut config = ConfigurationStore::new();
    config.complex_properties().property("City").has_max_length(60);

    let schema = build(&discovered_address_graph(), &config);

    let table = schema.table_for("Customer").unwrap();
    assert_eq!(Some(60), table.column_by_name("Address_City").unwrap().max_length);
    assert_eq!(None, table.column_by_name("Address_Street").unwrap().max_length);
}

#[test]
fn discovered_complex_type_takes_path_configuration() {
    let mut config = ConfigurationStore::new();
    config
        .entity("Customer")
        .property("Address.Street")
        .has_column_name("Street");

    let schema = build(&discovered_address_graph(), &config);

    assert!(schema.app.complex_type_by_name("Address").is_some());

    let table = schema.table_for("Customer").unwrap();
    assert_eq!(vec!["Id", "Street", "Address_City"], table.column_names());
}

#[test]
fn path_through_an_entity_navigation() {
    let graph = TypeGraph::new()
        .with_type(
            TypeDescriptor::entity("Customer")
                .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
                .property(PropertyDescriptor::reference("Address", "Address")),
        )
        .with_type(
            TypeDescriptor::entity("Address")
                .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
                .property(PropertyDescriptor::scalar("Street", ScalarType::String)),
        );

    let mut config = ConfigurationStore::new();
    config
        .entity("Customer")
        .property("Address.Street")
        .has_column_name("Street");

    let err = assert_err!(Builder::new().build(&graph, &config));

    assert_eq!(Some(ErrorKey::NoSuchProperty), err.key());
    assert_eq!(["Address", "Customer"], err.args());
}

#[test]
fn conflicting_facets_on_a_path() {
    let mut config = ConfigurationStore::new();
    config.complex_type("Address").property("Street").has_max_length(100);
    config
        .entity("Customer")
        .property("Address.Street")
        .has_max_length(50);

    let err = assert_err!(Builder::new().build(&customer_graph(), &config));

    assert_eq!(Some(ErrorKey::ConflictingConfigurationValue), err.key());
    assert_eq!(["max_length", "Customer.Address.Street", "50", "100"], err.args());
}

#[test]
fn conflicting_facets_on_a_complex_type() {
    let mut config = ConfigurationStore::new();
    config.complex_type("Address").property("City").has_max_length(10);
    config.complex_properties().property("City").has_max_length(60);

    let err = assert_err!(Builder::new().build(&customer_graph(), &config));

    assert_eq!(Some(ErrorKey::ConflictingConfigurationValue), err.key());
    assert_eq!(["max_length", "Address.City", "10", "60"], err.args());
}

#[test]
fn complex_type_containing_itself() {
    let graph = TypeGraph::new()
        .with_type(
            TypeDescriptor::entity("Tree")
                .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
                .property(PropertyDescriptor::complex("Root", "Node")),
        )
        .with_type(
            TypeDescriptor::complex("Node")
                .property(PropertyDescriptor::scalar("Value", ScalarType::Int32))
                .property(PropertyDescriptor::complex("Next", "Node")),
        );

    let err = assert_err!(Builder::new().build_unvalidated(&graph, &ConfigurationStore::new()));

    assert_eq!(Some(ErrorKey::CircularComplexTypeHierarchy), err.key());
    assert_eq!(["Node"], err.args());
}
