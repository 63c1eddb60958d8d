use pretty_assertions::assert_eq;
use relmap_core::schema::app::{Constraint, DeleteBehavior, End, Multiplicity};
use relmap_core::schema::graph::{PropertyDescriptor, ScalarType, TypeDescriptor};
use relmap_core::schema::{Builder, ConfigurationStore, TypeGraph};
use relmap_core::{ErrorKey, Schema};
use std_util::prelude::*;

fn build(graph: &TypeGraph, config: &ConfigurationStore) -> Schema {
    assert_ok!(Builder::new().build(graph, config))
}

fn column_names(schema: &Schema, columns: &[relmap_core::schema::db::ColumnId]) -> Vec<String> {
    columns
        .iter()
        .map(|column| schema.db.column(*column).name.clone())
        .collect()
}

fn cd_graph(fk_type: ScalarType) -> TypeGraph {
    TypeGraph::new()
        .with_type(
            TypeDescriptor::entity("CDPrin")
                .property(PropertyDescriptor::scalar("CDPrinId", ScalarType::Int32))
                .property(PropertyDescriptor::collection("CDDeps", "CDDep")),
        )
        .with_type(
            TypeDescriptor::entity("CDDep")
                .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
                .property(PropertyDescriptor::scalar("CDPrinId", fk_type))
                .property(PropertyDescriptor::reference("CDPrin", "CDPrin")),
        )
}

fn item_graph() -> TypeGraph {
    TypeGraph::new()
        .with_type(
            TypeDescriptor::entity("SomeItem")
                .property(PropertyDescriptor::scalar("SomeItemId", ScalarType::Int32))
                .property(PropertyDescriptor::reference("Detail", "SomeItemDetail")),
        )
        .with_type(
            TypeDescriptor::entity("SomeItemDetail")
                .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
                .property(PropertyDescriptor::reference("Item", "SomeItem")),
        )
}

fn product_graph() -> TypeGraph {
    TypeGraph::new()
        .with_type(
            TypeDescriptor::entity("ProductA")
                .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
                .property(PropertyDescriptor::collection("Tags", "Tag")),
        )
        .with_type(
            TypeDescriptor::entity("Tag")
                .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
                .property(PropertyDescriptor::collection("Products", "ProductA")),
        )
}

#[test]
fn required_many_without_cascade() {
    let mut config = ConfigurationStore::new();
    config
        .entity("CDPrin")
        .has_many("CDDeps")
        .with_required("CDPrin")
        .will_cascade_on_delete(false);

    let schema = build(&cd_graph(ScalarType::Int32), &config);

    assert_eq!(1, schema.app.associations.len());

    let association = schema.app.association_for("CDPrin", "CDDeps").unwrap();
    let fk = association.foreign_key().unwrap();

    assert_eq!(End::Source, fk.dependent);
    assert_eq!(vec!["CDPrinId"], fk.dependent_properties);
    assert_eq!(Multiplicity::Many, association.source.multiplicity);
    assert_eq!(Multiplicity::One, association.target.multiplicity);
    assert_eq!(DeleteBehavior::None, association.source.delete_behavior);
    assert_eq!(DeleteBehavior::None, association.target.delete_behavior);

    let table = schema.table_for("CDDep").unwrap();
    assert_eq!(vec!["Id", "CDPrinId"], table.column_names());
    assert_eq!(1, table.foreign_keys.len());

    let constraint = &table.foreign_keys[0];
    assert_eq!("CDDep_CDPrin", constraint.name);
    assert!(!constraint.cascade_delete);
    assert_eq!(vec!["CDPrinId"], column_names(&schema, &constraint.columns));
    assert!(!table.column_by_name("CDPrinId").unwrap().nullable);
}

#[test]
fn required_foreign_key_cascades_by_default() {
    let schema = build(&cd_graph(ScalarType::Int32), &ConfigurationStore::new());

    let association = schema.app.association_for("CDDep", "CDPrin").unwrap();
    assert_eq!(Some("CDDeps"), association.target.navigation.as_deref());
    assert_eq!(Multiplicity::One, association.target.multiplicity);
    assert_eq!(DeleteBehavior::Cascade, association.target.delete_behavior);

    let table = schema.table_for("CDDep").unwrap();
    assert!(table.foreign_keys[0].cascade_delete);
}

#[test]
fn optional_foreign_key_makes_principal_optional() {
    let mut graph = cd_graph(ScalarType::Int32);
    graph.add_type(
        TypeDescriptor::entity("CDDep")
            .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
            .property(PropertyDescriptor::scalar("CDPrinId", ScalarType::Int32).nullable(true))
            .property(PropertyDescriptor::reference("CDPrin", "CDPrin")),
    );

    let schema = build(&graph, &ConfigurationStore::new());

    let association = schema.app.association_for("CDDep", "CDPrin").unwrap();
    assert_eq!(Multiplicity::ZeroOrOne, association.target.multiplicity);
    assert_eq!(DeleteBehavior::None, association.target.delete_behavior);

    let table = schema.table_for("CDDep").unwrap();
    assert!(table.column_by_name("CDPrinId").unwrap().nullable);
}

#[test]
fn optional_dependent_is_independent() {
    let mut config = ConfigurationStore::new();
    config
        .entity("SomeItemDetail")
        .has_optional("Item")
        .with_optional_dependent("Detail");

    let schema = build(&item_graph(), &config);

    let association = schema.app.association_for("SomeItemDetail", "Item").unwrap();
    assert_eq!(Multiplicity::ZeroOrOne, association.source.multiplicity);
    assert_eq!(Multiplicity::ZeroOrOne, association.target.multiplicity);

    let Constraint::Independent(ia) = &association.constraint else {
        panic!("expected an independent association; actual={:?}", association.constraint);
    };
    assert_eq!(Some(End::Target), ia.dependent);

    let table = schema.table_for("SomeItemDetail").unwrap();
    assert_eq!(vec!["Id", "Item_SomeItemId"], table.column_names());
    assert!(table.column_by_name("Item_SomeItemId").unwrap().nullable);

    let set = schema.mapping.association(association.id).unwrap();
    assert_eq!(table.id, set.table);
    assert_eq!(vec!["Item_SomeItemId"], column_names(&schema, &set.source_columns));
    assert_eq!(vec!["Id"], column_names(&schema, &set.target_columns));
}

#[test]
fn independent_key_column_can_be_named() {
    let mut config = ConfigurationStore::new();
    config
        .entity("SomeItemDetail")
        .has_optional("Item")
        .with_optional_dependent("Detail")
        .map(|m| {
            m.map_key(["ItemKey"]);
        });

    let schema = build(&item_graph(), &config);

    let table = schema.table_for("SomeItemDetail").unwrap();
    assert_eq!(vec!["Id", "ItemKey"], table.column_names());
}

#[test]
fn required_dependent_shares_the_key() {
    let mut config = ConfigurationStore::new();
    config
        .entity("SomeItemDetail")
        .has_required("Item")
        .with_required_dependent("Detail");

    let schema = build(&item_graph(), &config);

    let association = schema.app.association_for("SomeItem", "Detail").unwrap();
    assert_eq!(Multiplicity::One, association.source.multiplicity);
    assert_eq!(Multiplicity::One, association.target.multiplicity);

    let fk = association.foreign_key().unwrap();
    assert_eq!(End::Target, fk.dependent);
    assert_eq!(vec!["Id"], fk.dependent_properties);
    assert_eq!(vec!["SomeItemId"], fk.principal_properties);

    let table = schema.table_for("SomeItemDetail").unwrap();
    assert_eq!(vec!["Id"], table.column_names());
    assert_eq!(table.primary_key, table.foreign_keys[0].columns);
    assert!(!table.column_by_name("Id").unwrap().nullable);
}

#[test]
fn multiplicity_table() {
    // Required/Optional
    let mut config = ConfigurationStore::new();
    config.entity("SomeItemDetail").has_required("Item").with_optional("Detail");

    let schema = build(&item_graph(), &config);
    let association = schema.app.association_for("SomeItem", "Detail").unwrap();
    let fk = association.foreign_key().unwrap();

    assert_eq!(Multiplicity::One, association.source.multiplicity);
    assert_eq!(Multiplicity::ZeroOrOne, association.target.multiplicity);
    assert_eq!(vec!["Id"], fk.dependent_properties);

    let table = schema.table_for("SomeItemDetail").unwrap();
    let column = schema.db.column(table.foreign_keys[0].columns[0]);
    assert!(!column.nullable);

    // Optional/Optional
    let mut config = ConfigurationStore::new();
    config
        .entity("SomeItemDetail")
        .has_optional("Item")
        .with_optional_dependent("Detail");

    let schema = build(&item_graph(), &config);
    let association = schema.app.association_for("SomeItem", "Detail").unwrap();
    let ia = association.independent().unwrap();

    assert!(association.foreign_key().is_none());
    assert!(ia.key_columns.is_empty());
    assert_eq!(2, schema.table_for("SomeItemDetail").unwrap().columns.len());

    // Optional/Required
    let mut config = ConfigurationStore::new();
    config.entity("SomeItemDetail").has_optional("Item").with_required("Detail");

    let schema = build(&item_graph(), &config);
    let association = schema.app.association_for("SomeItem", "Detail").unwrap();
    let fk = association.foreign_key().unwrap();

    assert_eq!(Multiplicity::ZeroOrOne, association.source.multiplicity);
    assert_eq!(Multiplicity::One, association.target.multiplicity);
    assert_eq!(End::Source, fk.dependent);
    assert_eq!(vec!["SomeItemId"], fk.dependent_properties);

    let items = schema.table_for("SomeItem").unwrap();
    let details = schema.table_for("SomeItemDetail").unwrap();
    assert_eq!(details.id, items.foreign_keys[0].principal_table);
    assert_eq!(items.primary_key, items.foreign_keys[0].columns);
}

#[test]
fn required_ends_follow_the_designated_principal() {
    let mut from_detail = ConfigurationStore::new();
    from_detail
        .entity("SomeItemDetail")
        .has_required("Item")
        .with_required_principal("Detail");

    let mut from_item = ConfigurationStore::new();
    from_item
        .entity("SomeItem")
        .has_required("Detail")
        .with_required_principal("Item");

    for (config, dependent, properties, dependent_type) in [
        (from_detail, End::Source, vec!["SomeItemId"], "SomeItem"),
        (from_item, End::Target, vec!["Id"], "SomeItemDetail"),
    ] {
        let schema = build(&item_graph(), &config);
        let association = schema.app.association_for("SomeItem", "Detail").unwrap();
        let fk = association.foreign_key().unwrap();

        assert_eq!(Multiplicity::One, association.source.multiplicity);
        assert_eq!(Multiplicity::One, association.target.multiplicity);
        assert_eq!(dependent, fk.dependent);
        assert_eq!(properties, fk.dependent_properties);

        let table = schema.table_for(dependent_type).unwrap();
        assert_eq!(table.primary_key, table.foreign_keys[0].columns);
    }
}

#[test]
fn explicit_key_column_must_not_reuse_a_property_column() {
    let graph = TypeGraph::new()
        .with_type(
            TypeDescriptor::entity("CDPrin")
                .property(PropertyDescriptor::scalar("CDPrinId", ScalarType::Int32))
                .property(PropertyDescriptor::collection("CDDeps", "CDDep")),
        )
        .with_type(
            TypeDescriptor::entity("CDDep")
                .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
                .property(PropertyDescriptor::scalar("Code", ScalarType::String))
                .property(PropertyDescriptor::reference("CDPrin", "CDPrin")),
        );

    let mut config = ConfigurationStore::new();
    config
        .entity("CDPrin")
        .has_many("CDDeps")
        .with_required("CDPrin")
        .map(|m| {
            m.map_key(["Code"]);
        });

    let builder = Builder::new();
    let schema = assert_ok!(builder.build_unvalidated(&graph, &config));
    assert_eq!(vec!["Id", "Code", "Code"], schema.table_for("CDDep").unwrap().column_names());

    let err = assert_err!(builder.build(&graph, &config));
    assert_eq!(Some(ErrorKey::ColumnNameCollision), err.key());
    assert_eq!(["dbo.CDDeps", "Code"], err.args());
}

#[test]
fn one_to_one_without_principal() {
    let err = assert_err!(Builder::new().build(&item_graph(), &ConfigurationStore::new()));

    assert_eq!(Some(ErrorKey::UnableToDeterminePrincipal), err.key());
    assert_eq!(["SomeItem", "SomeItemDetail"], err.args());
}

#[test]
fn composite_foreign_keys_follow_their_directive() {
    let graph = TypeGraph::new()
        .with_type(
            TypeDescriptor::entity("Principal")
                .property(PropertyDescriptor::scalar("Id1", ScalarType::Int32).key().column_order(1))
                .property(PropertyDescriptor::scalar("Id2", ScalarType::Int32).key().column_order(2)),
        )
        .with_type(
            TypeDescriptor::entity("FirstDep")
                .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
                .property(PropertyDescriptor::scalar("Fk1", ScalarType::Int32))
                .property(PropertyDescriptor::scalar("Fk2", ScalarType::Int32))
                .property(PropertyDescriptor::reference("Principal", "Principal").foreign_key("Fk2,Fk1")),
        )
        .with_type(
            TypeDescriptor::entity("SecondDep")
                .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
                .property(PropertyDescriptor::scalar("Fk1", ScalarType::Int32))
                .property(PropertyDescriptor::scalar("Fk2", ScalarType::Int32))
                .property(PropertyDescriptor::reference("Principal", "Principal").foreign_key("Fk1,Fk2")),
        );

    let schema = build(&graph, &ConfigurationStore::new());

    for (entity, expected) in [("FirstDep", vec!["Fk2", "Fk1"]), ("SecondDep", vec!["Fk1", "Fk2"])] {
        let fk = schema.app.association_for(entity, "Principal").unwrap().foreign_key().unwrap();
        assert_eq!(expected, fk.dependent_properties);
        assert_eq!(vec!["Id1", "Id2"], fk.principal_properties);

        let constraint = &schema.table_for(entity).unwrap().foreign_keys[0];
        assert_eq!(expected, column_names(&schema, &constraint.columns));
        assert_eq!(vec!["Id1", "Id2"], column_names(&schema, &constraint.principal_columns));
    }
}

#[test]
fn foreign_key_arity_must_match() {
    let mut config = ConfigurationStore::new();
    config
        .entity("CDPrin")
        .has_many("CDDeps")
        .with_required("CDPrin")
        .has_foreign_key(["CDPrinId", "Id"]);

    let err = assert_err!(Builder::new().build(&cd_graph(ScalarType::Int32), &config));

    assert_eq!(Some(ErrorKey::ForeignKeyArityMismatch), err.key());
    assert_eq!(["CDPrin", "CDDep", "1", "2"], err.args());
}

#[test]
fn missing_foreign_key_property() {
    let mut config = ConfigurationStore::new();
    config
        .entity("CDPrin")
        .has_many("CDDeps")
        .with_required("CDPrin")
        .has_foreign_key(["Missing"]);

    let err = assert_err!(Builder::new().build(&cd_graph(ScalarType::Int32), &config));

    assert_eq!(Some(ErrorKey::ForeignKeyPropertyNotFound), err.key());
    assert_eq!(["Missing", "CDDep"], err.args());
}

#[test]
fn unknown_navigation() {
    let mut config = ConfigurationStore::new();
    config.entity("CDPrin").has_many("Nope");

    let err = assert_err!(Builder::new().build(&cd_graph(ScalarType::Int32), &config));

    assert_eq!(Some(ErrorKey::NavigationPropertyNotFound), err.key());
    assert_eq!(["Nope", "CDPrin"], err.args());
}

#[test]
fn conflicting_multiplicities() {
    let mut config = ConfigurationStore::new();
    config.entity("CDPrin").has_many("CDDeps").with_required("CDPrin");
    config.entity("CDDep").has_optional("CDPrin").with_many("CDDeps");

    let err = assert_err!(Builder::new().build(&cd_graph(ScalarType::Int32), &config));

    assert_eq!(Some(ErrorKey::ConflictingMultiplicities), err.key());
    assert_eq!(["CDDeps", "CDPrin"], err.args());
}

#[test]
fn many_to_many_join_table() {
    let schema = build(&product_graph(), &ConfigurationStore::new());

    let association = schema.app.association_for("ProductA", "Tags").unwrap();
    assert!(association.is_many_to_many());

    let set = schema.mapping.association(association.id).unwrap();
    let table = schema.db.table(set.table);

    assert_eq!("ProductATags", table.name.name);
    assert_eq!(vec!["ProductA_Id", "Tag_Id"], table.column_names());
    assert_eq!(2, table.primary_key.len());
    assert_eq!(2, table.foreign_keys.len());
    assert!(table.foreign_keys.iter().all(|fk| fk.cascade_delete));
    assert_eq!("ProductA_Tags_Source", table.foreign_keys[0].name);
}

#[test]
fn many_to_many_configured_join_table() {
    let mut config = ConfigurationStore::new();
    config
        .entity("ProductA")
        .has_many("Tags")
        .with_many("Products")
        .map(|m| {
            m.to_table("ProductTagLinks")
                .map_left_key(["ProductId"])
                .map_right_key(["TagId"]);
        });

    let schema = build(&product_graph(), &config);

    let table = schema.db.table_by_name("ProductTagLinks").unwrap();
    assert_eq!(vec!["ProductId", "TagId"], table.column_names());
    assert_eq!("dbo.ProductTagLinks", table.name.to_string());
}

#[test]
fn conflicting_join_tables() {
    let mut config = ConfigurationStore::new();
    config
        .entity("ProductA")
        .has_many("Tags")
        .with_many("Products")
        .map(|m| {
            m.to_table("ProductTags");
        });
    config
        .entity("Tag")
        .has_many("Products")
        .with_many("Tags")
        .map(|m| {
            m.to_table("TagProducts");
        });

    let err = assert_err!(Builder::new().build(&product_graph(), &config));

    assert_eq!(Some(ErrorKey::ConflictingMapping), err.key());
    assert_eq!(["Products", "Tag"], err.args());
}

#[test]
fn join_table_named_like_an_entity_table() {
    let graph = TypeGraph::new()
        .with_type(
            TypeDescriptor::entity("Supplier")
                .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
                .property(PropertyDescriptor::collection("Products", "Product")),
        )
        .with_type(
            TypeDescriptor::entity("Product")
                .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
                .property(PropertyDescriptor::collection("Suppliers", "Supplier")),
        );

    let mut config = ConfigurationStore::new();
    config.entity("Supplier").to_table("Foo");
    config
        .entity("Supplier")
        .has_many("Products")
        .with_many("Suppliers")
        .map(|m| {
            m.to_table("Foo");
        });

    let builder = Builder::new();
    let schema = assert_ok!(builder.build_unvalidated(&graph, &config));
    let foo = schema.db.tables.iter().filter(|table| table.name.name == "Foo").count();
    assert_eq!(2, foo);

    let err = assert_err!(builder.build(&graph, &config));
    assert_eq!(Some(ErrorKey::TableNameCollision), err.key());
    assert_eq!(["dbo.Foo"], err.args());
}

#[test]
fn join_table_stated_from_both_sides() {
    let mut config = ConfigurationStore::new();
    config
        .entity("ProductA")
        .has_many("Tags")
        .with_many("Products")
        .map(|m| {
            m.to_table("ProductTags").map_left_key(["ProductId"]);
        });
    config
        .entity("Tag")
        .has_many("Products")
        .with_many("Tags")
        .map(|m| {
            m.to_table("producttags").map_right_key(["ProductId"]);
        });

    let schema = build(&product_graph(), &config);

    let table = schema.db.table_by_name("ProductTags").unwrap();
    assert_eq!(vec!["ProductId", "Tag_Id"], table.column_names());
}

#[test]
fn conflicts_are_reported_together() {
    let mut graph = product_graph();
    graph.add_type(
        TypeDescriptor::entity("CDPrin")
            .property(PropertyDescriptor::scalar("CDPrinId", ScalarType::Int32))
            .property(PropertyDescriptor::collection("CDDeps", "CDDep")),
    );
    graph.add_type(
        TypeDescriptor::entity("CDDep")
            .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
            .property(PropertyDescriptor::scalar("CDPrinId", ScalarType::Int32))
            .property(PropertyDescriptor::reference("CDPrin", "CDPrin")),
    );

    let mut config = ConfigurationStore::new();
    config.entity("CDPrin").has_many("CDDeps").with_required("CDPrin");
    config.entity("CDDep").has_optional("CDPrin").with_many("CDDeps");
    config
        .entity("ProductA")
        .has_many("Tags")
        .with_many("Products")
        .map(|m| {
            m.to_table("ProductTags");
        });
    config
        .entity("Tag")
        .has_many("Products")
        .with_many("Tags")
        .map(|m| {
            m.to_table("TagProducts");
        });

    let err = assert_err!(Builder::new().build(&graph, &config));

    assert!(err.is_aggregate());
    assert_eq!(2, err.errors().count());
    assert!(err.has_key(ErrorKey::ConflictingMultiplicities));
    assert!(err.has_key(ErrorKey::ConflictingMapping));
}
