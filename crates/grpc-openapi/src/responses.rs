//! Success, declared and default error responses of one operation.

use std::collections::BTreeMap;

use grpc_openapi_core::descriptor::FieldPath;
use grpc_openapi_core::options;
use tracing::{debug, warn};

use crate::builder::{SchemaBuilder, STATUS};
use crate::document::{non_empty, Header, Response};
use crate::error::Result;
use crate::schema::{Components, Schema, SchemaType, REF_PREFIX};
use crate::wkt::well_known_schema;

/// Status code of the computed success response.
pub(crate) const SUCCESS: &str = "200";
/// Key of the catch-all error response.
pub(crate) const DEFAULT: &str = "default";

const SUCCESS_DESCRIPTION: &str = "A successful response.";
const ERROR_DESCRIPTION: &str = "An unexpected error response.";

pub(crate) struct Responder<'a> {
    builder: &'a SchemaBuilder<'a>,
    components: &'a Components,
    default_errors: bool,
}

impl<'a> Responder<'a> {
    pub(crate) fn new(
        builder: &'a SchemaBuilder<'a>,
        components: &'a Components,
        default_errors: bool,
    ) -> Self {
        Self {
            builder,
            components,
            default_errors,
        }
    }

    /// The `200` response for a method returning `output`.
    ///
    /// A response selector narrows the payload to one field of the message.
    pub(crate) fn success(&self, output: &str, selector: Option<&FieldPath>) -> Result<Response> {
        let Some(selector) = selector.filter(|s| !s.is_whole_message()) else {
            return Ok(Response::json(SUCCESS_DESCRIPTION, self.whole_message(output)));
        };

        let registry = self.builder.registry();
        let hops = registry
            .lookup_message(output)
            .and_then(|message| registry.resolve_path(message, selector));
        let leaf = hops
            .as_deref()
            .filter(|hops| hops.iter().all(|(_, f)| self.builder.is_visible_field(f)))
            .and_then(<[_]>::last);
        let Some(&(owner, field)) = leaf else {
            warn!(
                message = output.trim_start_matches('.'),
                selector = %selector,
                "response selector does not resolve to a visible field, omitting the payload"
            );
            return Ok(Response {
                description: SUCCESS_DESCRIPTION.to_string(),
                headers: BTreeMap::new(),
                content: BTreeMap::new(),
            });
        };
        Ok(Response::json(
            SUCCESS_DESCRIPTION,
            self.builder.field_schema(owner, field)?,
        ))
    }

    fn whole_message(&self, output: &str) -> Schema {
        if let Some(schema) = well_known_schema(output) {
            return schema;
        }
        if let Some(name) = self.builder.names().get(output) {
            return Schema::reference(name);
        }
        warn!(
            message = output.trim_start_matches('.'),
            "response message has no component schema, using a bare object"
        );
        Schema::typed(SchemaType::Object)
    }

    /// Responses declared on the operation annotation, except `200`.
    pub(crate) fn declared(&self, operation: &options::Operation) -> BTreeMap<String, Response> {
        let mut responses = BTreeMap::new();
        for (code, declared) in &operation.responses {
            if code == SUCCESS {
                debug!(code, "declared success response ignored, the computed one is used");
                continue;
            }
            let headers = declared
                .headers
                .iter()
                .map(|(name, header)| (name.clone(), self.header(name, header)))
                .collect();
            let content = if declared.schema_ref.is_empty() {
                BTreeMap::new()
            } else {
                let name = declared
                    .schema_ref
                    .strip_prefix(REF_PREFIX)
                    .unwrap_or(&declared.schema_ref);
                if !self.components.contains_key(name) {
                    warn!(
                        code,
                        reference = name,
                        "declared response references an unknown component"
                    );
                }
                Response::json(String::new(), Schema::reference(name)).content
            };
            responses.insert(
                code.clone(),
                Response {
                    description: declared.description.clone(),
                    headers,
                    content,
                },
            );
        }
        responses
    }

    fn header(&self, name: &str, header: &options::Header) -> Header {
        let schema = match SchemaType::parse(&header.r#type) {
            Some(ty) => Schema::typed(ty),
            None => {
                if !header.r#type.is_empty() {
                    warn!(
                        header = name,
                        kind = %header.r#type,
                        "unknown header type, leaving the header schema untyped"
                    );
                }
                Schema::default()
            }
        };
        Header {
            description: non_empty(&header.description),
            style: "simple".to_string(),
            schema,
        }
    }

    /// Catch-all error response referencing the status component.
    pub(crate) fn default_error(&self) -> Option<Response> {
        if !self.default_errors {
            return None;
        }
        let status = self.builder.names().get(STATUS)?;
        Some(Response::json(ERROR_DESCRIPTION, Schema::reference(status)))
    }
}
