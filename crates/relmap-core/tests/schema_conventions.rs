use pretty_assertions::assert_eq;
use relmap_core::schema::app::{self, Facet};
use relmap_core::schema::db::{StoreGenerated, Type};
use relmap_core::schema::graph::{PropertyDescriptor, ScalarType, TypeDescriptor};
use relmap_core::schema::{
    Builder, ConfigurationStore, Convention, ConventionContext, Conventions, Phase, TableName, TypeGraph,
};
use relmap_core::{ErrorKey, Schema};
use std_util::prelude::*;

fn build(graph: &TypeGraph, config: &ConfigurationStore) -> Schema {
    assert_ok!(Builder::new().build(graph, config))
}

fn single(ty: TypeDescriptor) -> TypeGraph {
    TypeGraph::new().with_type(ty)
}

#[derive(Debug)]
struct UpperCaseTableName;

impl Convention for UpperCaseTableName {
    fn name(&self) -> &str {
        "UpperCaseTableName"
    }

    fn phase(&self) -> Phase {
        Phase::Discovery
    }

    fn apply(&self, model: &mut app::Schema, _cx: &mut ConventionContext<'_>) {
        for entity in model.entities.values_mut() {
            if entity.table.is_none() {
                entity.table = Some(Facet::convention(TableName::new(entity.name.to_uppercase())));
            }
        }
    }
}

#[test]
fn default_conventions() {
    assert_eq!(
        vec![
            "ComplexTypeDiscovery",
            "KeyDiscovery",
            "NavigationInverseDiscovery",
            "PluralizingTableName",
            "PluralizingEntitySetName",
            "ColumnFacets",
            "ForeignKeyDiscovery",
            "StoreGeneratedIdentityKey",
            "OneToManyCascadeDelete",
            "ManyToManyCascadeDelete",
        ],
        Conventions::default().names()
    );
}

#[test]
fn key_by_name() {
    let graph = TypeGraph::new()
        .with_type(TypeDescriptor::entity("Blog").property(PropertyDescriptor::scalar("BlogId", ScalarType::Int32)))
        .with_type(TypeDescriptor::entity("Post").property(PropertyDescriptor::scalar("id", ScalarType::Int64)));

    let schema = build(&graph, &ConfigurationStore::new());

    let blogs = schema.table_for("Blog").unwrap();
    assert_eq!(vec!["BlogId"], blogs.column_names());
    assert_eq!(StoreGenerated::Identity, blogs.columns[0].store_generated);

    let posts = schema.table_for("Post").unwrap();
    assert_eq!(Type::BigInt, posts.columns[0].ty);
    assert!(posts.columns[0].primary_key);
}

#[test]
fn key_not_defined() {
    let graph = single(TypeDescriptor::entity("Thing").property(PropertyDescriptor::scalar("Name", ScalarType::String)));

    let err = assert_err!(Builder::new().build(&graph, &ConfigurationStore::new()));

    assert_eq!(Some(ErrorKey::KeyNotDefined), err.key());
    assert_eq!(["Thing"], err.args());
}

#[test]
fn ambiguous_key() {
    let graph = single(
        TypeDescriptor::entity("Thing")
            .property(PropertyDescriptor::scalar("ID", ScalarType::Int32))
            .property(PropertyDescriptor::scalar("Id", ScalarType::Int32)),
    );

    let err = assert_err!(Builder::new().build(&graph, &ConfigurationStore::new()));

    assert_eq!(Some(ErrorKey::MultiplePropertiesMatchedAsKeys), err.key());
    assert_eq!(["Thing", "ID, Id"], err.args());
}

#[test]
fn composite_key_needs_an_order() {
    let graph = single(
        TypeDescriptor::entity("Thing")
            .property(PropertyDescriptor::scalar("A", ScalarType::Int32).key())
            .property(PropertyDescriptor::scalar("B", ScalarType::Int32).key()),
    );

    let err = assert_err!(Builder::new().build(&graph, &ConfigurationStore::new()));

    assert_eq!(Some(ErrorKey::CompositeKeyOrderMissing), err.key());
    assert_eq!(["Thing"], err.args());
}

#[test]
fn configured_key_needs_no_order() {
    let graph = single(
        TypeDescriptor::entity("Thing")
            .property(PropertyDescriptor::scalar("A", ScalarType::Int32))
            .property(PropertyDescriptor::scalar("B", ScalarType::Int32)),
    );

    let mut config = ConfigurationStore::new();
    config.entity("Thing").has_key(["B", "A"]);

    let schema = build(&graph, &config);

    let table = schema.table_for("Thing").unwrap();
    let key: Vec<_> = table.primary_key_columns().map(|column| column.name.as_str()).collect();
    assert_eq!(vec!["B", "A"], key);
    assert!(table.columns.iter().all(|column| column.store_generated == StoreGenerated::None));
}

#[test]
fn duplicate_column_order() {
    let graph = single(
        TypeDescriptor::entity("Thing")
            .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
            .property(PropertyDescriptor::scalar("A", ScalarType::Int32).column_order(1))
            .property(PropertyDescriptor::scalar("B", ScalarType::Int32).column_order(1)),
    );

    let err = assert_err!(Builder::new().build(&graph, &ConfigurationStore::new()));

    assert_eq!(Some(ErrorKey::DuplicateConfiguredColumnOrder), err.key());
    assert_eq!(["Thing", "1"], err.args());
}

#[test]
fn column_facets() {
    let graph = TypeGraph::new()
        .with_type(
            TypeDescriptor::entity("Blog")
                .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
                .property(PropertyDescriptor::scalar("Title", ScalarType::String).max_length(200))
                .property(PropertyDescriptor::scalar("Rating", ScalarType::Decimal))
                .property(PropertyDescriptor::scalar("Version", ScalarType::Binary).timestamp())
                .property(PropertyDescriptor::scalar("Draft", ScalarType::String).not_mapped()),
        )
        .with_type(TypeDescriptor::entity("Tag").property(PropertyDescriptor::scalar("Name", ScalarType::String).key()));

    let schema = build(&graph, &ConfigurationStore::new());

    let blogs = schema.table_for("Blog").unwrap();
    assert_eq!(vec!["Id", "Title", "Rating", "Version"], blogs.column_names());

    let title = blogs.column_by_name("Title").unwrap();
    assert_eq!((Type::NVarChar, Some(200)), (title.ty.clone(), title.max_length));

    let rating = blogs.column_by_name("Rating").unwrap();
    assert_eq!((Some(18), Some(2)), (rating.precision, rating.scale));

    let version = blogs.column_by_name("Version").unwrap();
    assert_eq!(Type::RowVersion, version.ty);
    assert_eq!(StoreGenerated::Computed, version.store_generated);
    assert!(version.concurrency_token);
    assert!(!version.nullable);

    let name = &schema.table_for("Tag").unwrap().columns[0];
    assert_eq!(Some(128), name.max_length);
    assert!(!name.nullable);
    assert_eq!(StoreGenerated::None, name.store_generated);
}

#[test]
fn configuration_overrides_directives() {
    let graph = single(
        TypeDescriptor::entity("Blog")
            .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
            .property(PropertyDescriptor::scalar("Title", ScalarType::String).max_length(200))
            .property(PropertyDescriptor::scalar("Secret", ScalarType::String)),
    );

    let mut config = ConfigurationStore::new();
    config.entity("Blog").ignore("Secret");
    config
        .entity("Blog")
        .property("Title")
        .has_max_length(50)
        .is_required()
        .has_column_name("Heading");

    let schema = build(&graph, &config);

    let blogs = schema.table_for("Blog").unwrap();
    assert_eq!(vec!["Id", "Heading"], blogs.column_names());

    let heading = &blogs.columns[1];
    assert_eq!(Some(50), heading.max_length);
    assert!(!heading.nullable);
}

#[test]
fn complex_type_discovered_from_usage() {
    let graph = TypeGraph::new()
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
        .with_root("Customer");

    let schema = build(&graph, &ConfigurationStore::new());

    assert!(schema.entity("Address").is_none());
    assert!(schema.app.complex_type_by_name("Address").is_some());
    assert!(schema.app.associations.is_empty());

    let table = schema.table_for("Customer").unwrap();
    assert_eq!(vec!["Id", "Address_Street", "Address_City"], table.column_names());
}

#[test]
fn declared_roots_stay_entities() {
    let graph = TypeGraph::new()
        .with_type(
            TypeDescriptor::entity("Customer")
                .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
                .property(PropertyDescriptor::reference("Address", "Address")),
        )
        .with_type(
            TypeDescriptor::entity("Address")
                .property(PropertyDescriptor::scalar("Street", ScalarType::String)),
        );

    let err = assert_err!(Builder::new().build(&graph, &ConfigurationStore::new()));

    assert_eq!(Some(ErrorKey::KeyNotDefined), err.key());
    assert_eq!(["Address"], err.args());
}

#[test]
fn removing_a_convention() {
    let graph = single(TypeDescriptor::entity("Blog").property(PropertyDescriptor::scalar("Id", ScalarType::Int32)));

    let mut builder = Builder::new();
    assert_ok!(builder.conventions_mut().remove("KeyDiscovery"));

    let err = assert_err!(builder.build(&graph, &ConfigurationStore::new()));
    assert_eq!(Some(ErrorKey::KeyNotDefined), err.key());
}

#[test]
fn custom_convention() {
    let graph = single(TypeDescriptor::entity("Blog").property(PropertyDescriptor::scalar("Id", ScalarType::Int32)));

    let mut builder = Builder::new();
    assert_ok!(builder
        .conventions_mut()
        .insert_before("PluralizingTableName", UpperCaseTableName));

    let schema = assert_ok!(builder.build(&graph, &ConfigurationStore::new()));

    assert_eq!("dbo.BLOG", schema.table_for("Blog").unwrap().name.to_string());
}

#[test]
fn convention_list_errors() {
    let mut conventions = Conventions::default();

    let err = assert_err!(conventions.add(UpperCaseTableName).and_then(|c| c.add(UpperCaseTableName)));
    assert_eq!(Some(ErrorKey::DuplicateConvention), err.key());
    assert_eq!(["UpperCaseTableName"], err.args());

    let err = assert_err!(conventions.remove("Nope"));
    assert_eq!(Some(ErrorKey::ConventionNotFound), err.key());
    assert_eq!(["Nope"], err.args());
}

#[test]
fn table_name_prefix() {
    let graph = TypeGraph::new()
        .with_type(TypeDescriptor::entity("Blog").property(PropertyDescriptor::scalar("Id", ScalarType::Int32)))
        .with_type(TypeDescriptor::entity("Post").property(PropertyDescriptor::scalar("Id", ScalarType::Int32)));

    let mut config = ConfigurationStore::new();
    config.entity("Post").to_table("Posts");

    let mut builder = Builder::new();
    builder.table_name_prefix("app_");

    let schema = assert_ok!(builder.build(&graph, &config));

    assert_eq!("dbo.app_Blogs", schema.table_for("Blog").unwrap().name.to_string());
    assert_eq!("dbo.Posts", schema.table_for("Post").unwrap().name.to_string());
}

#[test]
fn entity_sets() {
    let graph = TypeGraph::new()
        .with_type(TypeDescriptor::entity("Animal").property(PropertyDescriptor::scalar("Id", ScalarType::Int32)))
        .with_type(TypeDescriptor::entity("Cat").base("Animal"));

    let mut config = ConfigurationStore::new();
    config.entity("Animal").has_entity_set_name("Zoo");

    let schema = build(&graph, &config);

    assert_eq!(1, schema.app.entity_sets.len());
    assert_eq!("Zoo", schema.app.entity_sets[0].name);
    assert_eq!(schema.entity("Animal").unwrap().id, schema.app.entity_sets[0].root);
}
