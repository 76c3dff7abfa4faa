//! `OpenAPI` 3.0 document model.
//!
//! Plain data with `Serialize`; rendering to YAML or JSON is left to the
//! caller (`serde_json::to_string_pretty`, `serde_yaml_ng::to_string`).

use std::collections::BTreeMap;

use serde::Serialize;

use crate::schema::{Components, Schema};

/// Root document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Always `3.0.0`.
    pub openapi: String,
    /// API metadata.
    pub info: Info,
    /// Path templates to path items.
    pub paths: BTreeMap<String, PathItem>,
    /// Reusable schemas.
    pub components: ComponentSet,
    /// Service tags in first-declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// `info` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct Info {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub version: String,
}

/// `components` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComponentSet {
    /// Component schemas keyed by resolved name.
    pub schemas: Components,
}

/// Operations of one path template, one slot per HTTP method.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
}

impl PathItem {
    /// Operation slot for an HTTP verb (case-insensitive); `None` for unknown verbs.
    pub fn slot_mut(&mut self, http_method: &str) -> Option<&mut Option<Operation>> {
        Some(match http_method.to_ascii_uppercase().as_str() {
            "GET" => &mut self.get,
            "PUT" => &mut self.put,
            "POST" => &mut self.post,
            "DELETE" => &mut self.delete,
            "OPTIONS" => &mut self.options,
            "HEAD" => &mut self.head,
            "PATCH" => &mut self.patch,
            "TRACE" => &mut self.trace,
            _ => return None,
        })
    }

    /// Operation for an HTTP verb, if present.
    #[must_use]
    pub fn operation(&self, http_method: &str) -> Option<&Operation> {
        match http_method.to_ascii_uppercase().as_str() {
            "GET" => self.get.as_ref(),
            "PUT" => self.put.as_ref(),
            "POST" => self.post.as_ref(),
            "DELETE" => self.delete.as_ref(),
            "OPTIONS" => self.options.as_ref(),
            "HEAD" => self.head.as_ref(),
            "PATCH" => self.patch.as_ref(),
            "TRACE" => self.trace.as_ref(),
            _ => None,
        }
    }
}

/// One operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct Operation {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    pub operation_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: BTreeMap<String, Response>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Vendor extensions (`x-*`), serialized inline.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

/// Where a parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum ParameterLocation {
    Path,
    Query,
}

/// A path or query parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: Schema,
}

/// Request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct RequestBody {
    pub content: BTreeMap<String, MediaType>,
    pub required: bool,
}

impl RequestBody {
    /// Required `application/json` body.
    #[must_use]
    pub fn json(schema: Schema) -> Self {
        Self {
            content: json_content(schema),
            required: true,
        }
    }

    /// Schema of the `application/json` entry.
    #[must_use]
    pub fn schema(&self) -> Option<&Schema> {
        self.content.get(JSON).map(|m| &m.schema)
    }
}

/// One response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Header>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, MediaType>,
}

impl Response {
    /// Response with an `application/json` schema.
    #[must_use]
    pub fn json(description: impl Into<String>, schema: Schema) -> Self {
        Self {
            description: description.into(),
            headers: BTreeMap::new(),
            content: json_content(schema),
        }
    }

    /// Schema of the `application/json` entry.
    #[must_use]
    pub fn schema(&self) -> Option<&Schema> {
        self.content.get(JSON).map(|m| &m.schema)
    }
}

/// Media type entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct MediaType {
    pub schema: Schema,
}

/// Response header.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct Header {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub style: String,
    pub schema: Schema,
}

/// Top-level tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
}

/// External documentation link.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct ExternalDocs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
}

impl ExternalDocs {
    /// Convert an annotation, dropping it when the URL is empty.
    pub(crate) fn from_annotation(
        docs: &grpc_openapi_core::options::ExternalDocs,
    ) -> Option<Self> {
        if docs.url.is_empty() {
            return None;
        }
        Some(Self {
            description: non_empty(&docs.description),
            url: docs.url.clone(),
        })
    }
}

const JSON: &str = "application/json";

fn json_content(schema: Schema) -> BTreeMap<String, MediaType> {
    BTreeMap::from([(JSON.to_string(), MediaType { schema })])
}

pub(crate) fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}
