//! Typed annotation payloads and the closed slot registry.
//!
//! The generator understands exactly six annotation slots. Each slot carries
//! one prost message type from the `grpc.gateway.protoc_gen_openapiv3.options`
//! package (or `google.api` for visibility rules), transported as a
//! [`prost_types::Any`] so the descriptor resolver never needs to know the
//! concrete types.

use std::collections::BTreeMap;
use std::fmt;

use prost::{Message, Name};

use crate::AnnotationError;

#[allow(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
mod types {
    use std::collections::BTreeMap;

    use prost::Message;

    /// Per-method operation overrides.
    #[derive(Clone, PartialEq, Message)]
    pub struct Operation {
        #[prost(string, repeated, tag = "1")]
        pub tags: Vec<String>,
        #[prost(string, tag = "2")]
        pub summary: String,
        #[prost(string, tag = "3")]
        pub description: String,
        #[prost(message, optional, tag = "4")]
        pub external_docs: Option<ExternalDocs>,
        #[prost(string, tag = "5")]
        pub operation_id: String,
        /// Declared responses keyed by status code.
        #[prost(btree_map = "string, message", tag = "9")]
        pub responses: BTreeMap<String, Response>,
        #[prost(bool, tag = "11")]
        pub deprecated: bool,
        /// Vendor extensions, keys should start with `x-`.
        #[prost(btree_map = "string, message", tag = "13")]
        pub extensions: BTreeMap<String, prost_types::Value>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct Response {
        #[prost(string, tag = "1")]
        pub description: String,
        /// Component name of the response payload, without the `#/components/schemas/` prefix.
        #[prost(string, tag = "2")]
        pub schema_ref: String,
        #[prost(btree_map = "string, message", tag = "3")]
        pub headers: BTreeMap<String, Header>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct Header {
        #[prost(string, tag = "1")]
        pub description: String,
        /// JSON type of the header value (`string`, `integer`, ...).
        #[prost(string, tag = "2")]
        pub r#type: String,
    }

    /// Message-level schema overrides.
    #[derive(Clone, PartialEq, Message)]
    pub struct Schema {
        #[prost(message, optional, tag = "1")]
        pub json_schema: Option<JsonSchema>,
        #[prost(message, optional, tag = "5")]
        pub external_docs: Option<ExternalDocs>,
    }

    /// Field-level (and message-level, via [`Schema`]) JSON schema facets.
    #[derive(Clone, PartialEq, Message)]
    pub struct JsonSchema {
        #[prost(string, tag = "5")]
        pub title: String,
        #[prost(string, tag = "6")]
        pub description: String,
        #[prost(string, tag = "7")]
        pub default: String,
        #[prost(bool, tag = "8")]
        pub read_only: bool,
        /// Example literal, coerced against the field's JSON type.
        #[prost(string, tag = "9")]
        pub example: String,
        #[prost(double, optional, tag = "10")]
        pub multiple_of: Option<f64>,
        #[prost(double, optional, tag = "11")]
        pub maximum: Option<f64>,
        #[prost(bool, tag = "12")]
        pub exclusive_maximum: bool,
        #[prost(double, optional, tag = "13")]
        pub minimum: Option<f64>,
        #[prost(bool, tag = "14")]
        pub exclusive_minimum: bool,
        #[prost(uint64, optional, tag = "15")]
        pub max_length: Option<u64>,
        #[prost(uint64, optional, tag = "16")]
        pub min_length: Option<u64>,
        #[prost(string, tag = "17")]
        pub pattern: String,
        #[prost(bool, tag = "18")]
        pub deprecated: bool,
        /// Required property names (message-level only).
        #[prost(string, repeated, tag = "26")]
        pub required: Vec<String>,
        #[prost(btree_map = "string, message", tag = "48")]
        pub extensions: BTreeMap<String, prost_types::Value>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct EnumSchema {
        #[prost(string, tag = "1")]
        pub description: String,
        #[prost(string, tag = "2")]
        pub default: String,
        #[prost(string, tag = "3")]
        pub title: String,
        #[prost(bool, tag = "5")]
        pub read_only: bool,
        #[prost(string, tag = "9")]
        pub example: String,
        #[prost(btree_map = "string, message", tag = "10")]
        pub extensions: BTreeMap<String, prost_types::Value>,
    }

    /// Service-level tag declaration.
    #[derive(Clone, PartialEq, Message)]
    pub struct Tag {
        #[prost(string, tag = "1")]
        pub name: String,
        #[prost(string, tag = "2")]
        pub description: String,
        #[prost(message, optional, tag = "3")]
        pub external_docs: Option<ExternalDocs>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct ExternalDocs {
        #[prost(string, tag = "1")]
        pub description: String,
        #[prost(string, tag = "2")]
        pub url: String,
    }

    /// [`google.api.VisibilityRule`]: comma-separated restriction labels.
    #[derive(Clone, PartialEq, Message)]
    pub struct VisibilityRule {
        #[prost(string, tag = "1")]
        pub selector: String,
        #[prost(string, tag = "2")]
        pub restriction: String,
    }
}

pub use types::*;

const OPENAPI_PACKAGE: &str = "grpc.gateway.protoc_gen_openapiv3.options";

macro_rules! impl_name {
    ($package:expr => $($ty:ident),+ $(,)?) => {
        $(
            impl Name for $ty {
                const NAME: &'static str = stringify!($ty);
                const PACKAGE: &'static str = $package;
            }
        )+
    };
}

impl_name!(OPENAPI_PACKAGE => Operation, Response, Header, Schema, JsonSchema, EnumSchema, Tag, ExternalDocs);
impl_name!("google.api" => VisibilityRule);

impl VisibilityRule {
    /// Rule restricting an element to the given comma-separated labels.
    #[must_use]
    pub fn restricted_to(restriction: impl Into<String>) -> Self {
        Self {
            selector: String::new(),
            restriction: restriction.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// Extension slot an annotation is attached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    /// `openapiv3_operation` on a method.
    Operation,
    /// `openapiv3_schema` on a message.
    Schema,
    /// `openapiv3_field` on a field.
    Field,
    /// `openapiv3_enum` on an enum.
    Enum,
    /// `openapiv3_tag` on a service.
    Tag,
    /// `google.api.*_visibility` on a field, enum value, service or method.
    Visibility,
}

impl Slot {
    /// Type URL of the only message type this slot accepts.
    #[must_use]
    pub fn expected_type_url(self) -> String {
        match self {
            Self::Operation => Operation::type_url(),
            Self::Schema => Schema::type_url(),
            Self::Field => JsonSchema::type_url(),
            Self::Enum => EnumSchema::type_url(),
            Self::Tag => Tag::type_url(),
            Self::Visibility => VisibilityRule::type_url(),
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Operation => "openapiv3_operation",
            Self::Schema => "openapiv3_schema",
            Self::Field => "openapiv3_field",
            Self::Enum => "openapiv3_enum",
            Self::Tag => "openapiv3_tag",
            Self::Visibility => "visibility",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw annotation as delivered by the descriptor resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Slot the payload was attached through.
    pub slot: Slot,
    /// Encoded payload and its type URL.
    pub payload: prost_types::Any,
}

impl Annotation {
    /// Encode `msg` into a payload for `slot`.
    ///
    /// No slot check happens here; mismatches surface in
    /// [`Registry::new`](crate::descriptor::Registry::new).
    #[must_use]
    pub fn new<M: Name>(slot: Slot, msg: &M) -> Self {
        Self {
            slot,
            payload: prost_types::Any {
                type_url: M::type_url(),
                value: msg.encode_to_vec(),
            },
        }
    }

    fn decode<M: Name + Default>(&self, element: &str) -> Result<M, AnnotationError> {
        let expected = self.slot.expected_type_url();
        if self.payload.type_url != expected {
            return Err(AnnotationError::WrongType {
                element: element.to_string(),
                slot: self.slot,
                expected,
                found: self.payload.type_url.clone(),
            });
        }
        M::decode(self.payload.value.as_slice()).map_err(|source| AnnotationError::Decode {
            element: element.to_string(),
            slot: self.slot,
            source,
        })
    }
}

/// Index raw annotations by slot, rejecting unknown and repeated slots.
fn by_slot<'a>(
    element: &str,
    kind: &'static str,
    allowed: &[Slot],
    raw: &'a [Annotation],
) -> Result<BTreeMap<Slot, &'a Annotation>, AnnotationError> {
    let mut slots = BTreeMap::new();
    for annotation in raw {
        if !allowed.contains(&annotation.slot) {
            return Err(AnnotationError::UnsupportedSlot {
                element: element.to_string(),
                slot: annotation.slot,
                kind,
            });
        }
        if slots.insert(annotation.slot, annotation).is_some() {
            return Err(AnnotationError::Duplicate {
                element: element.to_string(),
                slot: annotation.slot,
            });
        }
    }
    Ok(slots)
}

fn take<M: Name + Default>(
    slots: &BTreeMap<Slot, &Annotation>,
    slot: Slot,
    element: &str,
) -> Result<Option<M>, AnnotationError> {
    slots.get(&slot).map(|a| a.decode(element)).transpose()
}

// ---------------------------------------------------------------------------
// Decoded per-element options
// ---------------------------------------------------------------------------

/// Decoded message annotations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageOptions {
    /// `openapiv3_schema`.
    pub schema: Option<Schema>,
}

/// Decoded field annotations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOptions {
    /// `openapiv3_field`.
    pub schema: Option<JsonSchema>,
    /// Field visibility rule.
    pub visibility: Option<VisibilityRule>,
}

/// Decoded enum annotations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumOptions {
    /// `openapiv3_enum`.
    pub schema: Option<EnumSchema>,
}

/// Decoded enum value annotations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumValueOptions {
    /// Value visibility rule.
    pub visibility: Option<VisibilityRule>,
}

/// Decoded service annotations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceOptions {
    /// `openapiv3_tag`.
    pub tag: Option<Tag>,
    /// Service visibility rule.
    pub visibility: Option<VisibilityRule>,
}

/// Decoded method annotations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodOptions {
    /// `openapiv3_operation`.
    pub operation: Option<Operation>,
    /// Method visibility rule.
    pub visibility: Option<VisibilityRule>,
}

impl MessageOptions {
    pub(crate) fn decode(element: &str, raw: &[Annotation]) -> Result<Self, AnnotationError> {
        let slots = by_slot(element, "message", &[Slot::Schema], raw)?;
        Ok(Self {
            schema: take(&slots, Slot::Schema, element)?,
        })
    }
}

impl FieldOptions {
    pub(crate) fn decode(element: &str, raw: &[Annotation]) -> Result<Self, AnnotationError> {
        let slots = by_slot(element, "field", &[Slot::Field, Slot::Visibility], raw)?;
        Ok(Self {
            schema: take(&slots, Slot::Field, element)?,
            visibility: take(&slots, Slot::Visibility, element)?,
        })
    }
}

impl EnumOptions {
    pub(crate) fn decode(element: &str, raw: &[Annotation]) -> Result<Self, AnnotationError> {
        let slots = by_slot(element, "enum", &[Slot::Enum], raw)?;
        Ok(Self {
            schema: take(&slots, Slot::Enum, element)?,
        })
    }
}

impl EnumValueOptions {
    pub(crate) fn decode(element: &str, raw: &[Annotation]) -> Result<Self, AnnotationError> {
        let slots = by_slot(element, "enum value", &[Slot::Visibility], raw)?;
        Ok(Self {
            visibility: take(&slots, Slot::Visibility, element)?,
        })
    }
}

impl ServiceOptions {
    pub(crate) fn decode(element: &str, raw: &[Annotation]) -> Result<Self, AnnotationError> {
        let slots = by_slot(element, "service", &[Slot::Tag, Slot::Visibility], raw)?;
        Ok(Self {
            tag: take(&slots, Slot::Tag, element)?,
            visibility: take(&slots, Slot::Visibility, element)?,
        })
    }
}

impl MethodOptions {
    pub(crate) fn decode(element: &str, raw: &[Annotation]) -> Result<Self, AnnotationError> {
        let slots = by_slot(element, "method", &[Slot::Operation, Slot::Visibility], raw)?;
        Ok(Self {
            operation: take(&slots, Slot::Operation, element)?,
            visibility: take(&slots, Slot::Visibility, element)?,
        })
    }
}
