//! End-to-end generation over a small catalog API.
//!
//! Each test builds a registry in memory, runs [`grpc_openapi::generate`]
//! and inspects the serialized document.

use std::collections::BTreeSet;

use indoc::indoc;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use grpc_openapi::descriptor::{
    Binding, Enum, EnumValue, Field, FieldKind, Message, Method, Registry, Service,
};
use grpc_openapi::options::{self, Annotation, Slot, VisibilityRule};
use grpc_openapi::{generate, AnnotationError, Error, GeneratorConfig, NamingStrategy};

fn internal_only() -> Annotation {
    Annotation::new(Slot::Visibility, &VisibilityRule::restricted_to("INTERNAL"))
}

fn messages() -> Vec<Message> {
    let foo = Message::new("lib.v1.Foo").field(Field::new("label", FieldKind::String));
    let attrs_entry = Message::map_entry(
        "lib.v1.Item.AttrsEntry",
        FieldKind::String,
        Field::message("value", "lib.v1.Foo"),
    );
    let item = Message::new("lib.v1.Item")
        .field(Field::new("id", FieldKind::Uint32))
        .field(Field::new("tags", FieldKind::String).repeated())
        .field(Field::message("attrs", "lib.v1.Item.AttrsEntry").repeated())
        .field(Field::new("count", FieldKind::Int64))
        .field(Field::new("size", FieldKind::Uint64))
        .field(Field::enumeration("color", "lib.v1.Color"))
        .field(Field::new("note", FieldKind::String).annotate(internal_only()));
    let choice = Message::new("lib.v1.M")
        .oneof("choice")
        .field(Field::new("a", FieldKind::String).in_oneof(0))
        .field(Field::new("b", FieldKind::Int32).in_oneof(0));
    let holder = Message::new("lib.v1.Holder").field(Field::message("m", "lib.v1.M"));
    let big = Message::new("lib.v1.Big")
        .oneof("color")
        .oneof("size")
        .oneof("fabric")
        .field(Field::new("red", FieldKind::Bool).in_oneof(0))
        .field(Field::new("green", FieldKind::Bool).in_oneof(0))
        .field(Field::new("blue", FieldKind::Bool).in_oneof(0))
        .field(Field::new("black", FieldKind::Bool).in_oneof(0))
        .field(Field::new("small", FieldKind::Bool).in_oneof(1))
        .field(Field::new("large", FieldKind::Bool).in_oneof(1))
        .field(Field::new("cotton", FieldKind::Bool).in_oneof(2))
        .field(Field::new("wool", FieldKind::Bool).in_oneof(2))
        .field(Field::new("silk", FieldKind::Bool).in_oneof(2));
    let get = Message::new("lib.v1.GetItemRequest").field(Field::new("name", FieldKind::String));
    let create = Message::new("lib.v1.CreateItemRequest")
        .field(Field::new("parent", FieldKind::String))
        .field(Field::message("item", "lib.v1.Item"));
    let purge = Message::new("lib.v1.PurgeRequest").field(Field::new("force", FieldKind::Bool));
    vec![
        foo,
        attrs_entry,
        item,
        choice,
        holder,
        big,
        get,
        create,
        purge,
    ]
}

fn enums() -> Vec<Enum> {
    vec![Enum::new("lib.v1.Color")
        .value(EnumValue::new("COLOR_UNSPECIFIED", 0))
        .value(EnumValue::new("RED", 1))
        .value(EnumValue::new("ULTRAVIOLET", 2).annotate(internal_only()))]
}

fn catalog() -> Service {
    let purge = Method::new("PurgeItems", "lib.v1.PurgeRequest", "google.protobuf.Empty")
        .binding(Binding::new("POST", "/v1/items:purge").body("*"))
        .annotate(internal_only());
    Service::new("lib.v1.Catalog")
        .method(
            Method::new("GetItem", "lib.v1.GetItemRequest", "lib.v1.Item")
                .binding(Binding::new("GET", "/v1/{name}").path_param("name")),
        )
        .method(
            Method::new("CreateItem", "lib.v1.CreateItemRequest", "lib.v1.Item")
                .binding(
                    Binding::new("POST", "/v1/{parent}/items")
                        .path_param("parent")
                        .body("item"),
                )
                .binding(Binding::new("PUT", "/v1/items").body("*")),
        )
        .method(purge)
}

fn tagged(fqn: &str, tag: &str, description: &str) -> Service {
    Service::new(fqn)
        .annotate(Annotation::new(
            Slot::Tag,
            &options::Tag {
                name: tag.to_string(),
                description: description.to_string(),
                external_docs: None,
            },
        ))
        .method(
            Method::new("GetHolder", "lib.v1.GetItemRequest", "lib.v1.Holder")
                .binding(Binding::new("GET", format!("/{fqn}/{{name}}")).path_param("name")),
        )
}

fn registry() -> Registry {
    let services = vec![
        catalog(),
        tagged("lib.v1.Admin", "Administration", "Operator endpoints."),
        tagged("lib.v1.Audit", "Administration", "Shadowed description."),
    ];
    Registry::new(messages(), enums(), services).unwrap()
}

fn simple() -> GeneratorConfig {
    GeneratorConfig::default().naming_strategy(NamingStrategy::Simple)
}

fn render(config: &GeneratorConfig) -> Value {
    let document = generate(&registry(), config).unwrap();
    serde_json::to_value(&document).unwrap()
}

fn schema<'a>(doc: &'a Value, name: &str) -> &'a Value {
    &doc["components"]["schemas"][name]
}

#[test]
fn scalar_field_mapping() {
    let doc = render(&simple());
    let item = &schema(&doc, "Item")["properties"];

    assert_eq!(
        item["id"],
        json!({"type": "integer", "format": "int64", "minimum": 0})
    );
    assert_eq!(
        item["tags"],
        json!({"type": "array", "items": {"type": "string"}})
    );
    assert_eq!(
        item["attrs"],
        json!({"type": "object", "additionalProperties": {"$ref": "#/components/schemas/Foo"}})
    );
    assert_eq!(item["count"], json!({"type": "integer", "format": "int64"}));
    assert_eq!(item["size"]["type"], "string");
    assert_eq!(item["size"]["format"], "int64");
    assert_eq!(item["color"], json!({"$ref": "#/components/schemas/Color"}));
}

#[test]
fn map_entries_get_no_component() {
    let doc = render(&GeneratorConfig::default());
    let schemas = doc["components"]["schemas"].as_object().unwrap();
    assert!(schemas.contains_key("lib.v1.Item"));
    assert!(!schemas.keys().any(|k| k.contains("AttrsEntry")));
}

#[test]
fn oneof_message_references_combinations() {
    let doc = render(&simple());

    assert_eq!(
        *schema(&doc, "M"),
        json!({"oneOf": [
            {"$ref": "#/components/schemas/M_a"},
            {"$ref": "#/components/schemas/M_b"}
        ]})
    );
    assert_eq!(
        *schema(&doc, "M_a"),
        json!({"type": "object", "properties": {"a": {"type": "string"}}})
    );
    assert_eq!(
        schema(&doc, "Holder")["properties"]["m"],
        json!({"$ref": "#/components/schemas/M"})
    );
}

#[test]
fn three_groups_yield_every_combination() {
    let doc = render(&simple());
    let combos: BTreeSet<&String> = doc["components"]["schemas"]
        .as_object()
        .unwrap()
        .keys()
        .filter(|k| k.starts_with("Big_"))
        .collect();

    assert_eq!(combos.len(), 24);
    assert!(combos.contains(&"Big_red_cotton_small".to_string()));
    assert!(combos.contains(&"Big_black_silk_large".to_string()));
    assert_eq!(schema(&doc, "Big")["oneOf"].as_array().unwrap().len(), 24);
}

#[test]
fn restricted_method_is_hidden() {
    let public = simple().visibility_selector("PUBLIC");
    let doc = render(&public);
    assert!(doc["paths"].get("/v1/items:purge").is_none());
    assert!(doc["paths"].get("/v1/{name}").is_some());

    let internal = simple().visibility_selector("INTERNAL");
    let doc = render(&internal);
    assert!(doc["paths"]["/v1/items:purge"]["post"].is_object());
}

#[test]
fn restricted_fields_and_values_are_hidden() {
    let doc = render(&simple());
    assert!(schema(&doc, "Item")["properties"].get("note").is_none());
    assert_eq!(
        schema(&doc, "Color")["enum"],
        json!(["COLOR_UNSPECIFIED", "RED"])
    );

    let doc = render(&simple().visibility_selector("INTERNAL"));
    assert!(schema(&doc, "Item")["properties"].get("note").is_some());
    assert_eq!(schema(&doc, "Color")["enum"].as_array().unwrap().len(), 3);
}

#[test]
fn output_is_byte_identical_across_runs() {
    let config = simple().visibility_selector("INTERNAL");
    let first = serde_yaml_ng::to_string(&generate(&registry(), &config).unwrap()).unwrap();
    let second = serde_yaml_ng::to_string(&generate(&registry(), &config).unwrap()).unwrap();
    assert_eq!(first, second);

    let fqn_first = serde_json::to_string(&generate(&registry(), &GeneratorConfig::default()).unwrap()).unwrap();
    let fqn_second = serde_json::to_string(&generate(&registry(), &GeneratorConfig::default()).unwrap()).unwrap();
    assert_eq!(fqn_first, fqn_second);
}

#[test]
fn create_item_bindings() {
    let doc = render(&simple());

    let primary = &doc["paths"]["/v1/{parent}/items"]["post"];
    assert_eq!(primary["operationId"], "Catalog_CreateItem");
    assert_eq!(
        primary["parameters"],
        json!([{"name": "parent", "in": "path", "required": true, "schema": {"type": "string"}}])
    );
    assert_eq!(
        primary["requestBody"],
        json!({
            "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Item"}}},
            "required": true
        })
    );

    let additional = &doc["paths"]["/v1/items"]["put"];
    assert_eq!(additional["operationId"], "Catalog_CreateItem_1");
    assert!(additional.get("parameters").is_none());
    assert_eq!(
        additional["requestBody"]["content"]["application/json"]["schema"],
        json!({"$ref": "#/components/schemas/CreateItemRequest"})
    );
}

#[test]
fn ignore_additional_bindings_keeps_primary_only() {
    let doc = render(&simple().ignore_additional_bindings(true));
    assert!(doc["paths"].get("/v1/items").is_none());
    assert!(doc["paths"]["/v1/{parent}/items"]["post"].is_object());
}

#[test]
fn get_operation_shape() {
    let doc = render(&simple());
    assert_eq!(
        doc["paths"]["/v1/{name}"]["get"],
        json!({
            "tags": ["Catalog"],
            "summary": "GetItem",
            "operationId": "Catalog_GetItem",
            "parameters": [
                {"name": "name", "in": "path", "required": true, "schema": {"type": "string"}}
            ],
            "responses": {
                "200": {
                    "description": "A successful response.",
                    "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Item"}}}
                },
                "default": {
                    "description": "An unexpected error response.",
                    "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Status"}}}
                }
            }
        })
    );
}

#[test]
fn error_components_are_always_present() {
    let doc = render(&simple());
    let status = schema(&doc, "Status")["properties"].as_object().unwrap();
    assert_eq!(
        status.keys().collect::<Vec<_>>(),
        vec!["code", "details", "message"]
    );
    let codes = schema(&doc, "Code")["enum"].as_array().unwrap();
    assert_eq!(codes.len(), 17);
    assert_eq!(codes[5], "NOT_FOUND");
}

#[test]
fn default_error_can_be_disabled() {
    let doc = render(&simple().disable_default_errors(true));
    let responses = doc["paths"]["/v1/{name}"]["get"]["responses"]
        .as_object()
        .unwrap();
    assert_eq!(responses.keys().collect::<Vec<_>>(), vec!["200"]);
}

#[test]
fn first_tag_declaration_wins() {
    let doc = render(&simple());
    assert_eq!(
        doc["tags"],
        json!([{"name": "Administration", "description": "Operator endpoints."}])
    );
    assert_eq!(
        doc["paths"]["/lib.v1.Audit/{name}"]["get"]["tags"],
        json!(["Administration"])
    );
}

#[test]
fn simple_names_disambiguate_collisions() {
    let local_status = Message::new("lib.v1.Status").field(Field::new("ok", FieldKind::Bool));
    let registry = Registry::new(vec![local_status], vec![], vec![]).unwrap();
    let doc = serde_json::to_value(generate(&registry, &simple()).unwrap()).unwrap();

    let schemas = doc["components"]["schemas"].as_object().unwrap();
    assert!(schemas.contains_key("v1.Status"));
    assert!(schemas.contains_key("rpc.Status"));
    assert!(!schemas.contains_key("Status"));
}

#[test]
fn mismatched_annotation_is_rejected() {
    let message = Message::new("lib.v1.Bad").field(
        Field::new("x", FieldKind::String).annotate(Annotation::new(
            Slot::Field,
            &VisibilityRule::restricted_to("INTERNAL"),
        )),
    );
    let err = Registry::new(vec![message], vec![], vec![]).unwrap_err();
    assert!(matches!(err, AnnotationError::WrongType { .. }), "{err}");
    assert!(err.to_string().contains("lib.v1.Bad.x"));
}

#[test]
fn invalid_example_fails_generation() {
    let facets = options::JsonSchema {
        example: "twelve".to_string(),
        ..Default::default()
    };
    let message = Message::new("lib.v1.Counter").field(
        Field::new("value", FieldKind::Int32).annotate(Annotation::new(Slot::Field, &facets)),
    );
    let registry = Registry::new(vec![message], vec![], vec![]).unwrap();
    let err = generate(&registry, &simple()).unwrap_err();
    assert!(
        matches!(&err, Error::InvalidExample { element, .. } if element == "lib.v1.Counter.value"),
        "{err}"
    );
}

#[test]
fn yaml_config_drives_generation() {
    let config: GeneratorConfig = serde_yaml_ng::from_str(indoc! {"
        naming_strategy: simple
        visibility_selectors: [INTERNAL]
        ignore_additional_bindings: true
        version: 2.0.0
        title: Catalog API
    "})
    .unwrap();
    let doc = render(&config);

    assert_eq!(doc["openapi"], "3.0.0");
    assert_eq!(doc["info"], json!({"title": "Catalog API", "version": "2.0.0"}));
    assert!(doc["paths"].get("/v1/items:purge").is_some());
    assert!(doc["paths"].get("/v1/items").is_none());
}
