//! Split of a request message across path parameters, query parameters and
//! the request body of one HTTP binding.

use grpc_openapi_core::descriptor::{Binding, Field, FieldKind, FieldPath, Message};
use tracing::{debug, warn};

use crate::builder::SchemaBuilder;
use crate::document::{Parameter, ParameterLocation};
use crate::error::Result;
use crate::prune::Pruner;
use crate::schema::{Components, Schema};
use crate::wkt::is_well_known;

/// Request side of one operation.
#[derive(Debug, Default)]
pub(crate) struct Request {
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) body: Option<Schema>,
    /// Binding-scoped body variants that differ from their canonical component.
    pub(crate) components: Components,
}

pub(crate) struct Composer<'a> {
    builder: &'a SchemaBuilder<'a>,
    components: &'a Components,
    pruner: Pruner<'a>,
}

impl<'a> Composer<'a> {
    pub(crate) fn new(builder: &'a SchemaBuilder<'a>, components: &'a Components) -> Self {
        Self {
            builder,
            components,
            pruner: Pruner::new(components),
        }
    }

    /// Compose parameters and body for `binding` of a method taking `input`.
    ///
    /// `operation_id` is binding-scoped and prefixes the names of pruned body
    /// variants.
    pub(crate) fn compose(
        &self,
        input: &Message,
        binding: &Binding,
        operation_id: &str,
    ) -> Result<Request> {
        let mut request = Request::default();
        for path in &binding.path_params {
            if let Some(parameter) = self.path_parameter(input, path)? {
                request.parameters.push(parameter);
            }
        }
        request.body = self.request_body(input, binding, operation_id, &mut request.components)?;
        request
            .parameters
            .extend(self.query_parameters(input, binding)?);
        Ok(request)
    }

    fn path_parameter(&self, input: &Message, path: &FieldPath) -> Result<Option<Parameter>> {
        let Some(hops) = self.builder.registry().resolve_path(input, path) else {
            warn!(
                message = input.full_name(),
                path = %path,
                "path parameter does not resolve to a field, omitting it"
            );
            return Ok(None);
        };
        if hops.iter().any(|(_, f)| !self.builder.is_visible_field(f)) {
            debug!(message = input.full_name(), path = %path, "path parameter field is hidden");
            return Ok(None);
        }
        let Some(&(owner, leaf)) = hops.last() else {
            warn!(message = input.full_name(), "empty path parameter, omitting it");
            return Ok(None);
        };
        if leaf.is_repeated() || is_nested_message(leaf) {
            warn!(
                message = input.full_name(),
                path = %path,
                "path parameter must be a scalar, enum or well-known type, omitting it"
            );
            return Ok(None);
        }
        Ok(Some(Parameter {
            name: path.to_string(),
            location: ParameterLocation::Path,
            required: true,
            schema: self.builder.field_schema(owner, leaf)?,
        }))
    }

    fn request_body(
        &self,
        input: &Message,
        binding: &Binding,
        operation_id: &str,
        variants: &mut Components,
    ) -> Result<Option<Schema>> {
        let Some(body) = &binding.body else {
            return Ok(None);
        };
        if body.is_whole_message() {
            let consumed = binding.path_params.clone();
            return self.message_body(input, &consumed, operation_id, variants);
        }

        let registry = self.builder.registry();
        let Some(hops) = registry.resolve_path(input, body) else {
            warn!(
                message = input.full_name(),
                body = %body,
                "body selector does not resolve to a field, omitting the request body"
            );
            return Ok(None);
        };
        if hops.iter().any(|(_, f)| !self.builder.is_visible_field(f)) {
            debug!(message = input.full_name(), body = %body, "body field is hidden");
            return Ok(None);
        }
        let Some(&(owner, leaf)) = hops.last() else {
            return Ok(None);
        };

        if !leaf.is_repeated() && is_nested_message(leaf) {
            let target = leaf
                .type_name
                .as_deref()
                .and_then(|t| registry.lookup_message(t))
                .filter(|m| !m.map_entry);
            if let Some(target) = target {
                let consumed: Vec<FieldPath> = binding
                    .path_params
                    .iter()
                    .filter_map(|p| p.strip_prefix(body))
                    .filter(|rest| !rest.is_whole_message())
                    .collect();
                return self.message_body(target, &consumed, operation_id, variants);
            }
        }

        // Scalar, enum, repeated, map or well-known body: the field's own schema.
        if binding.path_params.iter().any(|p| p == body) {
            debug!(
                message = input.full_name(),
                body = %body,
                "body field is bound to a path parameter, omitting the request body"
            );
            return Ok(None);
        }
        Ok(Some(self.builder.field_schema(owner, leaf)?))
    }

    /// Body built from a whole message, with `consumed` paths pruned out.
    fn message_body(
        &self,
        target: &Message,
        consumed: &[FieldPath],
        operation_id: &str,
        variants: &mut Components,
    ) -> Result<Option<Schema>> {
        let name = self.builder.names().get(&target.fqn);
        let canonical = match name.and_then(|n| self.components.get(n)) {
            Some(schema) => schema.clone(),
            None => {
                let (schema, combos) = self.builder.message_schema(target)?;
                variants.extend(combos);
                schema
            }
        };
        let as_reference = || name.map_or_else(|| canonical.clone(), Schema::reference);

        if consumed.is_empty() {
            return Ok(Some(as_reference()));
        }

        if canonical.one_of.is_empty() {
            return Ok(match self.pruner.prune_all(&canonical, consumed) {
                None => {
                    debug!(message = target.full_name(), "request body is empty after pruning");
                    None
                }
                Some(pruned) if pruned == canonical => Some(as_reference()),
                Some(pruned) => Some(pruned),
            });
        }

        let mut kept: Vec<(Schema, Option<Schema>)> = Vec::new();
        for alternative in &canonical.one_of {
            match self.pruner.prune_all(alternative, consumed) {
                None => {}
                Some(pruned) if pruned == *alternative => kept.push((alternative.clone(), None)),
                Some(pruned) => kept.push((alternative.clone(), Some(pruned))),
            }
        }

        Ok(match kept.len() {
            0 => {
                debug!(message = target.full_name(), "every body combination is empty after pruning");
                None
            }
            1 => kept.pop().map(|(original, pruned)| pruned.unwrap_or(original)),
            _ => {
                let refs = kept
                    .into_iter()
                    .map(|(original, pruned)| match (pruned, original.ref_name()) {
                        (Some(pruned), Some(combo)) => {
                            let variant = format!("{operation_id}_{combo}");
                            variants.insert(variant.clone(), pruned);
                            Schema::reference(&variant)
                        }
                        (Some(pruned), None) => pruned,
                        (None, _) => original,
                    })
                    .collect();
                Some(Schema::one_of(refs))
            }
        })
    }

    fn query_parameters(&self, input: &Message, binding: &Binding) -> Result<Vec<Parameter>> {
        if binding.body.as_ref().is_some_and(FieldPath::is_whole_message) {
            return Ok(Vec::new());
        }
        let consumed: Vec<&FieldPath> = binding
            .path_params
            .iter()
            .chain(binding.body.as_ref())
            .collect();

        let mut parameters = Vec::new();
        for field in &input.fields {
            if !self.builder.is_visible_field(field) {
                continue;
            }
            let own = FieldPath::parse(&field.name);
            if consumed.iter().any(|c| **c == own) {
                continue;
            }

            let mut schema = self.builder.field_schema(input, field)?;
            let nested: Vec<FieldPath> = consumed
                .iter()
                .filter_map(|c| c.strip_prefix(&own))
                .filter(|rest| !rest.is_whole_message())
                .collect();
            if field.kind != FieldKind::Enum && !nested.is_empty() {
                let Some(pruned) = self.pruner.prune_all(&schema, &nested) else {
                    debug!(
                        message = input.full_name(),
                        field = %field.name,
                        "query parameter is empty after pruning"
                    );
                    continue;
                };
                schema = pruned;
            }

            parameters.push(Parameter {
                name: field.name.clone(),
                location: ParameterLocation::Query,
                required: false,
                schema,
            });
        }
        Ok(parameters)
    }
}

/// A message-typed field that is not a well-known type alias.
fn is_nested_message(field: &Field) -> bool {
    field.kind == FieldKind::Message
        && !field.type_name.as_deref().is_some_and(is_well_known)
}
