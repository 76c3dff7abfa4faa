//! Message, field and enum schema synthesis.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use grpc_openapi_core::descriptor::{Enum, Field, FieldKind, Message, Registry};
use grpc_openapi_core::options::{JsonSchema, VisibilityRule};
use tracing::warn;

use crate::casing::lower_camel;
use crate::document::{non_empty, ExternalDocs};
use crate::error::{Error, Result};
use crate::example::coerce_example;
use crate::naming::ResolvedNames;
use crate::oneof::combinations;
use crate::schema::{Components, Schema, SchemaType};
use crate::visibility::Visibility;
use crate::wkt::{is_well_known, well_known_schema};

/// Error payload message, always present as a component.
pub(crate) const STATUS: &str = ".google.rpc.Status";
/// Canonical status code enum, always present as a component.
pub(crate) const CODE: &str = ".google.rpc.Code";

const INTERNAL_PACKAGES: &[&str] = &[
    ".google.api.",
    ".google.rpc.",
    ".grpc.gateway.protoc_gen_openapiv3.",
];

const CODES: &[&str] = &[
    "OK",
    "CANCELLED",
    "UNKNOWN",
    "INVALID_ARGUMENT",
    "DEADLINE_EXCEEDED",
    "NOT_FOUND",
    "ALREADY_EXISTS",
    "PERMISSION_DENIED",
    "UNAUTHENTICATED",
    "RESOURCE_EXHAUSTED",
    "FAILED_PRECONDITION",
    "ABORTED",
    "OUT_OF_RANGE",
    "UNIMPLEMENTED",
    "INTERNAL",
    "UNAVAILABLE",
    "DATA_LOSS",
];

/// Fully-qualified names of every type that gets a component schema.
pub(crate) fn component_types(registry: &Registry) -> BTreeSet<String> {
    let eligible = |fqn: &str| {
        !is_well_known(fqn) && !INTERNAL_PACKAGES.iter().any(|p| fqn.starts_with(p))
    };
    let mut fqns: BTreeSet<String> = registry
        .messages()
        .iter()
        .filter(|m| !m.map_entry && eligible(&m.fqn))
        .map(|m| m.fqn.clone())
        .chain(
            registry
                .enums()
                .iter()
                .filter(|e| eligible(&e.fqn))
                .map(|e| e.fqn.clone()),
        )
        .collect();
    fqns.insert(STATUS.to_string());
    fqns.insert(CODE.to_string());
    fqns
}

/// Recursive schema builder over one registry.
pub(crate) struct SchemaBuilder<'a> {
    registry: &'a Registry,
    names: &'a ResolvedNames,
    visibility: &'a Visibility,
}

impl<'a> SchemaBuilder<'a> {
    pub(crate) fn new(
        registry: &'a Registry,
        names: &'a ResolvedNames,
        visibility: &'a Visibility,
    ) -> Self {
        Self {
            registry,
            names,
            visibility,
        }
    }

    pub(crate) fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub(crate) fn names(&self) -> &'a ResolvedNames {
        self.names
    }

    pub(crate) fn is_visible(&self, rule: Option<&VisibilityRule>) -> bool {
        self.visibility.allows(rule)
    }

    pub(crate) fn is_visible_field(&self, field: &Field) -> bool {
        self.is_visible(field.options().visibility.as_ref())
    }

    /// Every canonical component: messages (plus their oneof combinations),
    /// enums, and the built-in error types.
    pub(crate) fn components(&self) -> Result<Components> {
        let mut components = Components::new();
        for message in self.registry.messages() {
            let Some(name) = self.names.get(&message.fqn) else {
                continue;
            };
            if components.contains_key(name) {
                continue;
            }
            let (schema, combos) = self.message_schema(message)?;
            components.extend(combos);
            components.insert(name.to_string(), schema);
        }
        for en in self.registry.enums() {
            let Some(name) = self.names.get(&en.fqn) else {
                continue;
            };
            if !components.contains_key(name) {
                components.insert(name.to_string(), self.enum_schema(en)?);
            }
        }
        if let Some(name) = self.names.get(STATUS) {
            components
                .entry(name.to_string())
                .or_insert_with(status_fallback);
        }
        if let Some(name) = self.names.get(CODE) {
            components
                .entry(name.to_string())
                .or_insert_with(code_schema);
        }
        Ok(components)
    }

    /// Schema of a message plus the combination components it references.
    ///
    /// Without oneof groups of two or more visible members the result is a
    /// single object. Otherwise every combination becomes a component and the
    /// result is a `oneOf` over references to them.
    pub(crate) fn message_schema(&self, message: &Message) -> Result<(Schema, Components)> {
        let visible: Vec<&Field> = message
            .fields
            .iter()
            .filter(|f| self.is_visible_field(f))
            .collect();

        let mut groups: BTreeMap<String, Vec<&Field>> = BTreeMap::new();
        for field in &visible {
            if let Some(index) = field.oneof_index {
                let group = message
                    .oneofs
                    .get(index)
                    .cloned()
                    .unwrap_or_else(|| format!("oneof_{index}"));
                groups.entry(group).or_default().push(field);
            }
        }
        groups.retain(|_, members| members.len() > 1);

        let grouped: HashSet<&str> = groups
            .values()
            .flatten()
            .map(|f| f.name.as_str())
            .collect();
        if grouped.is_empty() {
            return Ok((self.object_schema(message, &visible)?, Components::new()));
        }

        let owner = self
            .names
            .get(&message.fqn)
            .map_or_else(|| message.full_name().replace('.', "_"), str::to_string);
        let combos = combinations(&owner, &groups);

        let mut components = Components::new();
        let mut alternatives = Vec::with_capacity(combos.len());
        for combo in combos {
            let selected: HashSet<&str> = combo.fields.iter().map(|f| f.name.as_str()).collect();
            let fields: Vec<&Field> = visible
                .iter()
                .filter(|f| !grouped.contains(f.name.as_str()) || selected.contains(f.name.as_str()))
                .copied()
                .collect();
            let schema = self.object_schema(message, &fields)?;
            let name = self.combination_name(combo.name);
            alternatives.push(Schema::reference(&name));
            components.insert(name, schema);
        }
        Ok((Schema::one_of(alternatives), components))
    }

    /// `name`, or `name_<n>` when a message or enum already resolved to it.
    fn combination_name(&self, name: String) -> String {
        if !self.names.is_taken(&name) {
            return name;
        }
        let Some(renamed) = (2..)
            .map(|n: u32| format!("{name}_{n}"))
            .find(|candidate| !self.names.is_taken(candidate))
        else {
            return name;
        };
        warn!(
            combination = name.as_str(),
            renamed = renamed.as_str(),
            "oneof combination name is taken by a type, renaming the combination"
        );
        renamed
    }

    fn object_schema(&self, message: &Message, fields: &[&Field]) -> Result<Schema> {
        let mut schema = Schema::typed(SchemaType::Object);
        for field in fields {
            schema
                .properties
                .insert(field.name.clone(), self.field_schema(message, field)?);
        }

        let Some(options) = &message.options().schema else {
            return Ok(schema);
        };
        if let Some(facets) = &options.json_schema {
            overlay(&mut schema, facets, message.full_name())?;
            schema.required = fields
                .iter()
                .map(|f| f.name.as_str())
                .filter(|name| {
                    facets
                        .required
                        .iter()
                        .any(|r| r == *name || *r == lower_camel(name))
                })
                .map(str::to_string)
                .collect();
        }
        schema.external_docs = options
            .external_docs
            .as_ref()
            .and_then(ExternalDocs::from_annotation);
        Ok(schema)
    }

    /// Schema of one (visible) field, including repetition and annotations.
    pub(crate) fn field_schema(&self, owner: &Message, field: &Field) -> Result<Schema> {
        let element = format!("{}.{}", owner.full_name(), field.name);
        let facets = field.options().schema.as_ref();

        if let Some(entry) = self.map_entry(field) {
            let mut schema = self.map_schema(entry, &element)?;
            if let Some(facets) = facets {
                overlay(&mut schema, facets, &element)?;
            }
            return Ok(schema);
        }

        let mut schema = self.element_schema(field, &element);
        if schema.reference.is_none() {
            if let Some(facets) = facets {
                overlay(&mut schema, facets, &element)?;
            }
            if field.deprecated {
                schema.deprecated = true;
            }
            if matches!(
                field.kind,
                FieldKind::Uint32 | FieldKind::Fixed32 | FieldKind::Uint64 | FieldKind::Fixed64
            ) {
                schema.minimum = Some(schema.minimum.map_or(0.0, |min| min.max(0.0)));
            }
        }

        if field.is_repeated() {
            schema = Schema::array(schema);
        }
        Ok(schema)
    }

    fn map_entry(&self, field: &Field) -> Option<&'a Message> {
        if field.kind != FieldKind::Message {
            return None;
        }
        self.registry
            .lookup_message(field.type_name.as_deref()?)
            .filter(|m| m.map_entry)
    }

    fn map_schema(&self, entry: &Message, element: &str) -> Result<Schema> {
        let [_, value] = entry.fields.as_slice() else {
            warn!(
                field = element,
                entry = entry.full_name(),
                fields = entry.fields.len(),
                "map entry does not have exactly two fields, using a bare object"
            );
            return Ok(Schema::typed(SchemaType::Object));
        };
        Ok(Schema::map(self.field_schema(entry, value)?))
    }

    /// Unrepeated, unannotated schema of a field's kind.
    fn element_schema(&self, field: &Field, element: &str) -> Schema {
        use SchemaType as T;

        match field.kind {
            FieldKind::Bool => Schema::typed(T::Boolean),
            FieldKind::Double => Schema::formatted(T::Number, "double"),
            FieldKind::Float => Schema::formatted(T::Number, "float"),
            FieldKind::Int32 | FieldKind::Sint32 | FieldKind::Sfixed32 => {
                Schema::formatted(T::Integer, "int32")
            }
            FieldKind::Int64 | FieldKind::Sint64 | FieldKind::Sfixed64 => {
                Schema::formatted(T::Integer, "int64")
            }
            FieldKind::Uint32 | FieldKind::Fixed32 => Schema::formatted(T::Integer, "int64"),
            FieldKind::Uint64 | FieldKind::Fixed64 => Schema::formatted(T::String, "int64"),
            FieldKind::String => Schema::typed(T::String),
            FieldKind::Bytes => Schema::formatted(T::String, "byte"),
            FieldKind::Enum => self.type_reference(field, element, T::String),
            FieldKind::Message => self.type_reference(field, element, T::Object),
        }
    }

    fn type_reference(&self, field: &Field, element: &str, fallback: SchemaType) -> Schema {
        let Some(type_name) = field.type_name.as_deref() else {
            warn!(field = element, "field has no type reference, using a bare schema");
            return Schema::typed(fallback);
        };
        if let Some(schema) = well_known_schema(type_name) {
            return schema;
        }
        if let Some(name) = self.names.get(type_name) {
            return Schema::reference(name);
        }
        warn!(
            field = element,
            type_name, "referenced type has no component schema, using a bare schema"
        );
        Schema::typed(fallback)
    }

    /// String enum over the visible value names.
    pub(crate) fn enum_schema(&self, en: &Enum) -> Result<Schema> {
        let mut schema = Schema::typed(SchemaType::String);
        schema.enum_values = en
            .values
            .iter()
            .filter(|v| self.is_visible(v.options().visibility.as_ref()))
            .map(|v| v.name.clone())
            .collect();

        let Some(options) = &en.options().schema else {
            return Ok(schema);
        };
        let element = en.fqn.trim_start_matches('.');
        schema.title = non_empty(&options.title);
        schema.description = non_empty(&options.description);
        if !options.default.is_empty() {
            schema.default = Some(serde_json::Value::String(options.default.clone()));
        }
        schema.read_only = options.read_only;
        if !options.example.is_empty() {
            schema.example = Some(
                coerce_example(&options.example, Some(SchemaType::String)).map_err(|source| {
                    Error::InvalidExample {
                        element: element.to_string(),
                        source,
                    }
                })?,
            );
        }
        schema.extensions.extend(
            options
                .extensions
                .iter()
                .map(|(k, v)| (k.clone(), extension_value(v))),
        );
        Ok(schema)
    }
}

/// Apply annotation facets onto a derived schema.
pub(crate) fn overlay(schema: &mut Schema, facets: &JsonSchema, element: &str) -> Result<()> {
    let coerce = |literal: &str| {
        coerce_example(literal, schema.schema_type).map_err(|source| Error::InvalidExample {
            element: element.to_string(),
            source,
        })
    };
    let default = (!facets.default.is_empty())
        .then(|| coerce(&facets.default))
        .transpose()?;
    let example = (!facets.example.is_empty())
        .then(|| coerce(&facets.example))
        .transpose()?;

    if !facets.title.is_empty() {
        schema.title = Some(facets.title.clone());
    }
    if !facets.description.is_empty() {
        schema.description = Some(facets.description.clone());
    }
    if default.is_some() {
        schema.default = default;
    }
    if example.is_some() {
        schema.example = example;
    }
    schema.read_only |= facets.read_only;
    schema.deprecated |= facets.deprecated;
    if facets.multiple_of.is_some() {
        schema.multiple_of = facets.multiple_of;
    }
    if facets.maximum.is_some() {
        schema.maximum = facets.maximum;
    }
    if facets.minimum.is_some() {
        schema.minimum = facets.minimum;
    }
    schema.exclusive_maximum |= facets.exclusive_maximum;
    schema.exclusive_minimum |= facets.exclusive_minimum;
    if facets.max_length.is_some() {
        schema.max_length = facets.max_length;
    }
    if facets.min_length.is_some() {
        schema.min_length = facets.min_length;
    }
    if !facets.pattern.is_empty() {
        schema.pattern = Some(facets.pattern.clone());
    }
    schema.extensions.extend(
        facets
            .extensions
            .iter()
            .map(|(k, v)| (k.clone(), extension_value(v))),
    );
    Ok(())
}

/// Convert a `google.protobuf.Value` vendor extension to JSON.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn extension_value(value: &prost_types::Value) -> serde_json::Value {
    use prost_types::value::Kind;
    use serde_json::Value;

    match &value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::NumberValue(n)) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
            Value::from(*n as i64)
        }
        Some(Kind::NumberValue(n)) => {
            serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number)
        }
        Some(Kind::StringValue(s)) => Value::String(s.clone()),
        Some(Kind::BoolValue(b)) => Value::Bool(*b),
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .iter()
                .map(|(k, v)| (k.clone(), extension_value(v)))
                .collect(),
        ),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.iter().map(extension_value).collect())
        }
    }
}

fn status_fallback() -> Schema {
    let mut schema = Schema::typed(SchemaType::Object);
    schema.properties.insert(
        "code".to_string(),
        Schema::formatted(SchemaType::Integer, "int32"),
    );
    schema
        .properties
        .insert("message".to_string(), Schema::typed(SchemaType::String));
    schema.properties.insert(
        "details".to_string(),
        Schema::array(Schema::typed(SchemaType::Object)),
    );
    schema
}

fn code_schema() -> Schema {
    Schema {
        enum_values: CODES.iter().map(|c| (*c).to_string()).collect(),
        ..Schema::typed(SchemaType::String)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use grpc_openapi_core::descriptor::{EnumValue, Message};
    use grpc_openapi_core::options::{Annotation, EnumSchema, Schema as SchemaOptions, Slot};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::config::NamingStrategy;

    struct Fixture {
        registry: Registry,
        names: ResolvedNames,
        visibility: Visibility,
    }

    impl Fixture {
        fn new(messages: Vec<Message>, enums: Vec<Enum>) -> Self {
            Self::with_selectors(messages, enums, &[])
        }

        fn with_selectors(messages: Vec<Message>, enums: Vec<Enum>, selectors: &[&str]) -> Self {
            let registry = Registry::new(messages, enums, vec![]).unwrap();
            let names = ResolvedNames::resolve(component_types(&registry), NamingStrategy::Simple);
            let selectors: BTreeSet<String> = selectors.iter().map(|s| (*s).to_string()).collect();
            Self {
                registry,
                names,
                visibility: Visibility::new(&selectors),
            }
        }

        fn builder(&self) -> SchemaBuilder<'_> {
            SchemaBuilder::new(&self.registry, &self.names, &self.visibility)
        }

        fn field(&self, message: &str, field: &str) -> serde_json::Value {
            let msg = self.registry.lookup_message(message).unwrap();
            let f = msg.field_named(field).unwrap();
            serde_json::to_value(self.builder().field_schema(msg, f).unwrap()).unwrap()
        }

        fn components(&self) -> serde_json::Value {
            serde_json::to_value(self.builder().components().unwrap()).unwrap()
        }
    }

    fn annotated(field: Field, facets: &JsonSchema) -> Field {
        field.annotate(Annotation::new(Slot::Field, facets))
    }

    #[test]
    fn scalar_kinds() {
        let msg = Message::new("t.M")
            .field(Field::new("flag", FieldKind::Bool))
            .field(Field::new("ratio", FieldKind::Double))
            .field(Field::new("small", FieldKind::Sint32))
            .field(Field::new("big", FieldKind::Int64))
            .field(Field::new("blob", FieldKind::Bytes));
        let fx = Fixture::new(vec![msg], vec![]);

        assert_eq!(fx.field("t.M", "flag"), json!({"type": "boolean"}));
        assert_eq!(fx.field("t.M", "ratio"), json!({"type": "number", "format": "double"}));
        assert_eq!(fx.field("t.M", "small"), json!({"type": "integer", "format": "int32"}));
        assert_eq!(fx.field("t.M", "big"), json!({"type": "integer", "format": "int64"}));
        assert_eq!(fx.field("t.M", "blob"), json!({"type": "string", "format": "byte"}));
    }

    #[test]
    fn uint32_without_annotation() {
        let fx = Fixture::new(
            vec![Message::new("t.M").field(Field::new("id", FieldKind::Uint32))],
            vec![],
        );
        assert_eq!(
            fx.field("t.M", "id"),
            json!({"type": "integer", "format": "int64", "minimum": 0})
        );
    }

    #[test]
    fn unsigned_minimum_is_clamped() {
        let facets = JsonSchema {
            minimum: Some(-10.0),
            maximum: Some(100.0),
            ..Default::default()
        };
        let msg = Message::new("t.M")
            .field(annotated(Field::new("count", FieldKind::Uint32), &facets))
            .field(annotated(Field::new("total", FieldKind::Uint64), &facets));
        let fx = Fixture::new(vec![msg], vec![]);

        assert_eq!(
            fx.field("t.M", "count"),
            json!({"type": "integer", "format": "int64", "maximum": 100, "minimum": 0})
        );
        let total = fx.field("t.M", "total");
        assert_eq!(total["type"], "string");
        assert_eq!(total["format"], "int64");
        assert_eq!(total["minimum"], 0);
    }

    #[test]
    fn repeated_string() {
        let fx = Fixture::new(
            vec![Message::new("t.M").field(Field::new("tags", FieldKind::String).repeated())],
            vec![],
        );
        assert_eq!(
            fx.field("t.M", "tags"),
            json!({"type": "array", "items": {"type": "string"}})
        );
    }

    #[test]
    fn map_field_uses_additional_properties() {
        let foo = Message::new("t.Foo").field(Field::new("x", FieldKind::Int32));
        let entry = Message::map_entry(
            "t.M.AttrsEntry",
            FieldKind::String,
            Field::message("value", "t.Foo"),
        );
        let msg = Message::new("t.M").field(Field::message("attrs", "t.M.AttrsEntry").repeated());
        let fx = Fixture::new(vec![foo, entry, msg], vec![]);

        assert_eq!(
            fx.field("t.M", "attrs"),
            json!({"type": "object", "additionalProperties": {"$ref": "#/components/schemas/Foo"}})
        );
        assert!(fx.components().get("AttrsEntry").is_none());
    }

    #[test]
    fn malformed_map_entry_falls_back_to_object() {
        let mut entry = Message::new("t.M.BadEntry").field(Field::new("key", FieldKind::String));
        entry.map_entry = true;
        let msg = Message::new("t.M").field(Field::message("bad", "t.M.BadEntry").repeated());
        let fx = Fixture::new(vec![entry, msg], vec![]);
        assert_eq!(fx.field("t.M", "bad"), json!({"type": "object"}));
    }

    #[test]
    fn well_known_type_copies_and_overlays() {
        let facets = JsonSchema {
            description: "Creation time".to_string(),
            ..Default::default()
        };
        let msg = Message::new("t.M").field(annotated(
            Field::message("created", "google.protobuf.Timestamp"),
            &facets,
        ));
        let fx = Fixture::new(vec![msg], vec![]);
        assert_eq!(
            fx.field("t.M", "created"),
            json!({"type": "string", "format": "date-time", "description": "Creation time"})
        );
    }

    #[test]
    fn dangling_reference_falls_back() {
        let msg = Message::new("t.M")
            .field(Field::message("ghost", "t.Missing"))
            .field(Field::enumeration("mood", "t.MissingEnum"));
        let fx = Fixture::new(vec![msg], vec![]);
        assert_eq!(fx.field("t.M", "ghost"), json!({"type": "object"}));
        assert_eq!(fx.field("t.M", "mood"), json!({"type": "string"}));
    }

    #[test]
    fn single_member_oneof_is_plain() {
        let grouped = Message::new("t.G")
            .oneof("only")
            .field(Field::new("a", FieldKind::String).in_oneof(0));
        let plain = Message::new("t.P").field(Field::new("a", FieldKind::String));
        let fx = Fixture::new(vec![grouped, plain], vec![]);
        let components = fx.components();
        assert_eq!(components["G"], components["P"]);
        assert!(components.get("G_a").is_none());
    }

    #[test]
    fn oneof_members_become_combination_components() {
        let msg = Message::new("t.M")
            .oneof("choice")
            .field(Field::new("id", FieldKind::Int32))
            .field(Field::new("a", FieldKind::String).in_oneof(0))
            .field(Field::new("b", FieldKind::Bool).in_oneof(0));
        let fx = Fixture::new(vec![msg], vec![]);
        let components = fx.components();

        assert_eq!(
            components["M"],
            json!({"oneOf": [
                {"$ref": "#/components/schemas/M_a"},
                {"$ref": "#/components/schemas/M_b"}
            ]})
        );
        assert_eq!(
            components["M_a"],
            json!({"type": "object", "properties": {
                "id": {"type": "integer", "format": "int32"},
                "a": {"type": "string"}
            }})
        );
        assert_eq!(
            components["M_b"]["properties"]["b"],
            json!({"type": "boolean"})
        );
        assert!(components["M_b"]["properties"].get("a").is_none());
    }

    #[test]
    fn combination_yields_to_message_of_same_name() {
        let pet = Message::new("zoo.Pet")
            .oneof("kind")
            .field(Field::new("cat", FieldKind::String).in_oneof(0))
            .field(Field::new("dog", FieldKind::String).in_oneof(0));
        let pet_cat = Message::new("zoo.Pet_cat").field(Field::new("whiskers", FieldKind::Int32));
        let holder = Message::new("zoo.Holder").field(Field::message("c", "zoo.Pet_cat"));
        let fx = Fixture::new(vec![pet, pet_cat, holder], vec![]);
        let components = fx.components();

        assert_eq!(
            components["Pet_cat"],
            json!({"type": "object", "properties": {"whiskers": {"type": "integer", "format": "int32"}}})
        );
        assert_eq!(
            components["Holder"]["properties"]["c"],
            json!({"$ref": "#/components/schemas/Pet_cat"})
        );
        assert_eq!(
            components["Pet"],
            json!({"oneOf": [
                {"$ref": "#/components/schemas/Pet_cat_2"},
                {"$ref": "#/components/schemas/Pet_dog"}
            ]})
        );
        assert_eq!(
            components["Pet_cat_2"],
            json!({"type": "object", "properties": {"cat": {"type": "string"}}})
        );
    }

    #[test]
    fn invisible_member_collapses_group() {
        let hidden = Annotation::new(
            Slot::Visibility,
            &VisibilityRule::restricted_to("INTERNAL"),
        );
        let msg = Message::new("t.M")
            .oneof("choice")
            .field(Field::new("a", FieldKind::String).in_oneof(0))
            .field(Field::new("b", FieldKind::String).in_oneof(0).annotate(hidden));

        let public = Fixture::new(vec![msg.clone()], vec![]).components();
        assert_eq!(
            public["M"],
            json!({"type": "object", "properties": {"a": {"type": "string"}}})
        );

        let internal = Fixture::with_selectors(vec![msg], vec![], &["INTERNAL"]).components();
        assert_eq!(internal["M"]["oneOf"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn message_annotation_sets_required_and_docs() {
        let options = SchemaOptions {
            json_schema: Some(JsonSchema {
                title: "Book".to_string(),
                required: vec!["display_name".to_string(), "missing".to_string()],
                ..Default::default()
            }),
            external_docs: Some(grpc_openapi_core::options::ExternalDocs {
                description: String::new(),
                url: "https://example.com/books".to_string(),
            }),
        };
        let msg = Message::new("t.Book")
            .field(Field::new("display_name", FieldKind::String))
            .annotate(Annotation::new(Slot::Schema, &options));
        let fx = Fixture::new(vec![msg], vec![]);
        assert_eq!(
            fx.components()["Book"],
            json!({
                "type": "object",
                "title": "Book",
                "externalDocs": {"url": "https://example.com/books"},
                "properties": {"display_name": {"type": "string"}},
                "required": ["display_name"]
            })
        );
    }

    #[test]
    fn hidden_field_is_dropped_from_required() {
        let options = SchemaOptions {
            json_schema: Some(JsonSchema {
                required: vec!["name".to_string(), "secret".to_string()],
                ..Default::default()
            }),
            external_docs: None,
        };
        let msg = Message::new("t.Account")
            .field(Field::new("name", FieldKind::String))
            .field(Field::new("secret", FieldKind::String).annotate(Annotation::new(
                Slot::Visibility,
                &VisibilityRule::restricted_to("INTERNAL"),
            )))
            .annotate(Annotation::new(Slot::Schema, &options));

        let public = Fixture::new(vec![msg.clone()], vec![]).components();
        assert_eq!(public["Account"]["required"], json!(["name"]));
        assert!(public["Account"]["properties"].get("secret").is_none());

        let internal = Fixture::with_selectors(vec![msg], vec![], &["INTERNAL"]).components();
        assert_eq!(internal["Account"]["required"], json!(["name", "secret"]));
    }

    #[test]
    fn enum_schema_filters_hidden_values() {
        let en = Enum::new("t.Color")
            .value(EnumValue::new("RED", 0))
            .value(EnumValue::new("INFRARED", 1).annotate(Annotation::new(
                Slot::Visibility,
                &VisibilityRule::restricted_to("LAB"),
            )))
            .annotate(Annotation::new(
                Slot::Enum,
                &EnumSchema {
                    description: "Paint color".to_string(),
                    example: "RED".to_string(),
                    ..Default::default()
                },
            ));
        let msg = Message::new("t.M").field(Field::enumeration("color", "t.Color"));
        let fx = Fixture::new(vec![msg], vec![en]);

        assert_eq!(
            fx.components()["Color"],
            json!({"type": "string", "description": "Paint color", "enum": ["RED"], "example": "RED"})
        );
        assert_eq!(
            fx.field("t.M", "color"),
            json!({"$ref": "#/components/schemas/Color"})
        );
    }

    #[test]
    fn builtin_error_components() {
        let fx = Fixture::new(vec![], vec![]);
        let components = fx.components();
        assert_eq!(
            components["Status"]["properties"]["code"],
            json!({"type": "integer", "format": "int32"})
        );
        assert_eq!(components["Code"]["enum"].as_array().unwrap().len(), 17);
    }

    #[test]
    fn invalid_example_is_an_error() {
        let facets = JsonSchema {
            example: "1.5".to_string(),
            ..Default::default()
        };
        let msg = Message::new("t.M").field(annotated(Field::new("n", FieldKind::Int32), &facets));
        let fx = Fixture::new(vec![msg], vec![]);
        let err = fx.builder().components().unwrap_err();
        assert!(
            matches!(&err, Error::InvalidExample { element, .. } if element == "t.M.n"),
            "{err}"
        );
    }

    #[test]
    fn extension_values_convert_to_json() {
        use prost_types::value::Kind;

        let list = prost_types::Value {
            kind: Some(Kind::ListValue(prost_types::ListValue {
                values: vec![
                    prost_types::Value {
                        kind: Some(Kind::NumberValue(3.0)),
                    },
                    prost_types::Value {
                        kind: Some(Kind::StringValue("x".to_string())),
                    },
                ],
            })),
        };
        assert_eq!(extension_value(&list), json!([3, "x"]));
    }
}
