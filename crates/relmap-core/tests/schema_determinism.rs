use pretty_assertions::assert_eq;
use relmap_core::schema::graph::{PropertyDescriptor, ScalarType, TypeDescriptor};
use relmap_core::schema::{Builder, ConfigurationStore, TypeGraph};
use relmap_core::Schema;
use std_util::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn types() -> Vec<TypeDescriptor> {
    vec![
        TypeDescriptor::entity("Blog")
            .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
            .property(PropertyDescriptor::scalar("Title", ScalarType::String).required())
            .property(PropertyDescriptor::collection("Posts", "Post"))
            .property(PropertyDescriptor::collection("Tags", "Tag")),
        TypeDescriptor::entity("Post")
            .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
            .property(PropertyDescriptor::scalar("BlogId", ScalarType::Int32))
            .property(PropertyDescriptor::scalar("Body", ScalarType::String))
            .property(PropertyDescriptor::reference("Blog", "Blog")),
        TypeDescriptor::entity("FeaturedPost")
            .base("Post")
            .property(PropertyDescriptor::scalar("Rank", ScalarType::Int32)),
        TypeDescriptor::entity("Tag")
            .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
            .property(PropertyDescriptor::collection("Blogs", "Blog")),
        TypeDescriptor::entity("Author")
            .property(PropertyDescriptor::scalar("Id", ScalarType::Int32))
            .property(PropertyDescriptor::complex("Contact", "Contact")),
        TypeDescriptor::complex("Contact")
            .property(PropertyDescriptor::scalar("Email", ScalarType::String))
            .property(PropertyDescriptor::scalar("Phone", ScalarType::String)),
    ]
}

fn graph(reversed: bool) -> TypeGraph {
    let mut types = types();

    if reversed {
        types.reverse();
    }

    types.into_iter().fold(TypeGraph::new(), TypeGraph::with_type)
}

fn config(reversed: bool) -> ConfigurationStore {
    let mut config = ConfigurationStore::new();

    let statements: [fn(&mut ConfigurationStore); 2] = [
        |config| {
            config.entity("Blog").has_many("Tags").with_many("Blogs").map(|m| {
                m.to_table("BlogTags");
            });
        },
        |config| {
            config.entity("Author").property("Contact.Email").has_max_length(256);
        },
    ];

    if reversed {
        statements.iter().rev().for_each(|statement| statement(&mut config));
    } else {
        statements.iter().for_each(|statement| statement(&mut config));
    }

    config
}

fn build(reversed: bool) -> Schema {
    assert_ok!(Builder::new().build(&graph(reversed), &config(reversed)))
}

#[test]
fn building_twice_yields_the_same_model() {
    init_tracing();

    let first = assert_ok!(build(false).to_json());
    let second = assert_ok!(build(false).to_json());

    assert_eq!(first, second);
}

#[test]
fn declaration_order_does_not_matter() {
    init_tracing();

    let forward = assert_ok!(build(false).to_json());
    let reversed = assert_ok!(build(true).to_json());

    assert_eq!(forward, reversed);
}

#[test]
fn json_contains_all_layers() {
    let schema = build(false);
    let json: serde_json::Value = assert_ok!(serde_json::from_str(&assert_ok!(schema.to_json())));

    assert!(json["app"]["entities"].is_object());
    assert_eq!(schema.db.tables.len(), json["db"]["tables"].as_array().unwrap().len());
    assert!(json["mapping"]["entities"].is_object());
}

#[test]
fn table_names_are_unique() {
    let schema = build(false);
    let names: Vec<String> = schema.db.tables.iter().map(|table| table.name.to_string()).collect();

    assert_unique!(names);
}
