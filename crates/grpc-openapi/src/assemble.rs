//! Document assembly: services, methods and bindings into paths.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use grpc_openapi_core::descriptor::{Binding, FieldPath, Method, Registry, Service};
use tracing::{debug, warn};

use crate::builder::{component_types, extension_value, SchemaBuilder};
use crate::casing::json_names;
use crate::config::GeneratorConfig;
use crate::document::{
    non_empty, ComponentSet, Document, ExternalDocs, Info, Operation, PathItem, RequestBody, Tag,
};
use crate::error::Result;
use crate::naming::ResolvedNames;
use crate::params::{Composer, Request};
use crate::responses::{Responder, DEFAULT, SUCCESS};
use crate::schema::Components;
use crate::visibility::Visibility;
use crate::wkt::well_known_schema;

const OPENAPI_VERSION: &str = "3.0.0";

/// Generate the `OpenAPI` document for every visible service in `registry`.
///
/// The output is a pure function of `registry` and `config`: two runs over
/// the same input serialize to identical bytes.
///
/// # Errors
///
/// Returns [`Error::InvalidExample`](crate::Error::InvalidExample) when an
/// annotated example literal does not fit its field type. Dangling
/// references, malformed map entries and unresolvable field paths are
/// logged and replaced by fallbacks instead.
pub fn generate(registry: &Registry, config: &GeneratorConfig) -> Result<Document> {
    let visibility = Visibility::new(&config.visibility_selectors);
    let names = ResolvedNames::resolve(component_types(registry), config.naming_strategy);
    let builder = SchemaBuilder::new(registry, &names, &visibility);
    let canonical = builder.components()?;
    debug!(
        components = canonical.len(),
        services = registry.services().len(),
        "component schemas built"
    );

    let mut assembler = Assembler {
        config,
        builder: &builder,
        composer: Composer::new(&builder, &canonical),
        responder: Responder::new(&builder, &canonical, !config.disable_default_errors),
        paths: BTreeMap::new(),
        variants: Components::new(),
        tags: Vec::new(),
    };
    for service in registry.services() {
        assembler.service(service)?;
    }
    let Assembler {
        mut paths,
        variants,
        tags,
        ..
    } = assembler;

    let mut schemas = canonical;
    for (name, variant) in variants {
        match schemas.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(variant);
            }
            Entry::Occupied(slot) => {
                warn!(
                    component = slot.key().as_str(),
                    "request body variant collides with an existing component, keeping the existing one"
                );
            }
        }
    }
    paths.retain(|_, item| *item != PathItem::default());

    if config.json_names {
        schemas.values_mut().for_each(json_names);
        paths
            .values_mut()
            .flat_map(operations_mut)
            .for_each(rename_bodies);
    }

    Ok(Document {
        openapi: OPENAPI_VERSION.to_string(),
        info: Info {
            title: config.title.clone(),
            version: config.version.clone(),
        },
        paths,
        components: ComponentSet { schemas },
        tags,
    })
}

struct Assembler<'a> {
    config: &'a GeneratorConfig,
    builder: &'a SchemaBuilder<'a>,
    composer: Composer<'a>,
    responder: Responder<'a>,
    paths: BTreeMap<String, PathItem>,
    variants: Components,
    tags: Vec<Tag>,
}

impl Assembler<'_> {
    fn service(&mut self, service: &Service) -> Result<()> {
        let options = service.options();
        if !self.builder.is_visible(options.visibility.as_ref()) {
            debug!(service = service.fqn.trim_start_matches('.'), "service is hidden");
            return Ok(());
        }
        let tag_name = options.tag.as_ref().map(|tag| {
            if tag.name.is_empty() {
                service.name.clone()
            } else {
                tag.name.clone()
            }
        });
        if let (Some(tag), Some(name)) = (&options.tag, &tag_name) {
            self.declare_tag(service, name, tag);
        }
        let default_tag = tag_name.unwrap_or_else(|| service.name.clone());

        for method in &service.methods {
            if !self.builder.is_visible(method.options().visibility.as_ref()) {
                debug!(
                    service = service.name.as_str(),
                    method = method.name.as_str(),
                    "method is hidden"
                );
                continue;
            }
            let primary_only = self.config.ignore_additional_bindings;
            for binding in method
                .bindings
                .iter()
                .filter(|b| !primary_only || b.index == 0)
            {
                self.binding(service, method, binding, &default_tag)?;
            }
        }
        Ok(())
    }

    fn declare_tag(
        &mut self,
        service: &Service,
        name: &str,
        tag: &grpc_openapi_core::options::Tag,
    ) {
        if self.tags.iter().any(|t| t.name == name) {
            warn!(
                tag = name,
                service = service.fqn.trim_start_matches('.'),
                "tag already declared by an earlier service, ignoring this declaration"
            );
            return;
        }
        self.tags.push(Tag {
            name: name.to_string(),
            description: non_empty(&tag.description),
            external_docs: tag
                .external_docs
                .as_ref()
                .and_then(ExternalDocs::from_annotation),
        });
    }

    fn binding(
        &mut self,
        service: &Service,
        method: &Method,
        binding: &Binding,
        default_tag: &str,
    ) -> Result<()> {
        if PathItem::default().slot_mut(&binding.http_method).is_none() {
            warn!(
                method = method.name.as_str(),
                http_method = binding.http_method.as_str(),
                "unsupported HTTP method, skipping binding"
            );
            return Ok(());
        }

        let operation = self.operation(service, method, binding, default_tag)?;
        let item = self.paths.entry(binding.path_template.clone()).or_default();
        if let Some(existing) = item.slot_mut(&binding.http_method) {
            if let Some(previous) = existing.as_ref() {
                warn!(
                    path = binding.path_template.as_str(),
                    http_method = binding.http_method.as_str(),
                    replaced = previous.operation_id.as_str(),
                    "path and method already bound, replacing the earlier operation"
                );
            }
            *existing = Some(operation);
        }
        Ok(())
    }

    fn operation(
        &mut self,
        service: &Service,
        method: &Method,
        binding: &Binding,
        default_tag: &str,
    ) -> Result<Operation> {
        let declared = method.options().operation.as_ref();
        let base_id = declared
            .and_then(|op| non_empty(&op.operation_id))
            .unwrap_or_else(|| format!("{}_{}", service.name, method.name));
        let operation_id = if binding.index == 0 {
            base_id
        } else {
            format!("{base_id}_{}", binding.index)
        };

        let request = self.request(method, binding, &operation_id)?;
        self.variants.extend(request.components);

        let mut responses = declared
            .map(|op| self.responder.declared(op))
            .unwrap_or_default();
        responses.insert(
            SUCCESS.to_string(),
            self.responder
                .success(&method.output_type, binding.response_body.as_ref())?,
        );
        if let Some(error) = self.responder.default_error() {
            responses.entry(DEFAULT.to_string()).or_insert(error);
        }

        let tags = match declared {
            Some(op) if !op.tags.is_empty() => op.tags.clone(),
            _ => vec![default_tag.to_string()],
        };
        Ok(Operation {
            tags,
            summary: declared
                .and_then(|op| non_empty(&op.summary))
                .unwrap_or_else(|| method.name.clone()),
            description: declared.and_then(|op| non_empty(&op.description)),
            external_docs: declared
                .and_then(|op| op.external_docs.as_ref())
                .filter(|docs| !docs.description.is_empty())
                .and_then(ExternalDocs::from_annotation),
            operation_id,
            parameters: request.parameters,
            request_body: request.body.map(RequestBody::json),
            responses,
            deprecated: declared.is_some_and(|op| op.deprecated),
            extensions: declared
                .map(|op| {
                    op.extensions
                        .iter()
                        .map(|(key, value)| (key.clone(), extension_value(value)))
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    fn request(&self, method: &Method, binding: &Binding, operation_id: &str) -> Result<Request> {
        let registry: &Registry = self.builder.registry();
        if let Some(input) = registry.lookup_message(&method.input_type) {
            return self.composer.compose(input, binding, operation_id);
        }
        let mut request = Request::default();
        match well_known_schema(&method.input_type) {
            Some(schema) => {
                if binding.body.as_ref().is_some_and(FieldPath::is_whole_message) {
                    request.body = Some(schema);
                }
            }
            None => warn!(
                method = method.name.as_str(),
                input = method.input_type.trim_start_matches('.'),
                "request message not found, emitting the operation without parameters"
            ),
        }
        Ok(request)
    }
}

fn operations_mut(item: &mut PathItem) -> impl Iterator<Item = &mut Operation> {
    [
        &mut item.get,
        &mut item.put,
        &mut item.post,
        &mut item.delete,
        &mut item.options,
        &mut item.head,
        &mut item.patch,
        &mut item.trace,
    ]
    .into_iter()
    .filter_map(Option::as_mut)
}

fn rename_bodies(operation: &mut Operation) {
    let bodies = operation
        .request_body
        .iter_mut()
        .flat_map(|body| body.content.values_mut());
    let responses = operation
        .responses
        .values_mut()
        .flat_map(|response| response.content.values_mut());
    for media in bodies.chain(responses) {
        json_names(&mut media.schema);
    }
    for parameter in &mut operation.parameters {
        json_names(&mut parameter.schema);
    }
}
