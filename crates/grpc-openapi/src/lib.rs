//! `OpenAPI` 3.0 document generation for gRPC services with HTTP bindings.
//!
//! The generator takes a resolved descriptor graph (a
//! [`Registry`](descriptor::Registry) of services, methods, bindings,
//! messages and enums with their `openapiv3` annotations) and produces one
//! [`Document`]: a path item per binding, a component schema per message and
//! enum, and a tag per annotated service.
//!
//! Generation is synchronous and deterministic. The same registry and
//! [`GeneratorConfig`] always serialize to the same bytes.
//!
//! # Example
//!
//! ```
//! use grpc_openapi::descriptor::{Binding, Field, FieldKind, Message, Method, Registry, Service};
//! use grpc_openapi::{generate, GeneratorConfig, NamingStrategy};
//!
//! let book = Message::new("library.v1.Book").field(Field::new("name", FieldKind::String));
//! let get = Message::new("library.v1.GetBookRequest").field(Field::new("name", FieldKind::String));
//! let service = Service::new("library.v1.Library").method(
//!     Method::new("GetBook", "library.v1.GetBookRequest", "library.v1.Book")
//!         .binding(Binding::new("GET", "/v1/{name}").path_param("name")),
//! );
//!
//! let registry = Registry::new(vec![book, get], vec![], vec![service])?;
//! let config = GeneratorConfig::default().naming_strategy(NamingStrategy::Simple);
//! let document = generate(&registry, &config)?;
//!
//! assert!(document.components.schemas.contains_key("Book"));
//! println!("{}", serde_json::to_string_pretty(&document)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Failure model
//!
//! Dangling type references, malformed map entries and field paths that do
//! not resolve are logged through `tracing` and replaced by a minimal
//! fallback. Annotations of the wrong type are rejected when the registry is
//! built, and example literals that do not fit their field type fail the
//! whole run with [`Error::InvalidExample`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assemble;
mod builder;
mod casing;
mod config;
pub mod document;
mod error;
mod example;
mod naming;
mod oneof;
mod params;
mod prune;
mod responses;
pub mod schema;
mod visibility;
mod wkt;

pub use assemble::generate;
pub use config::{GeneratorConfig, NamingStrategy};
pub use document::Document;
pub use error::{Error, Result};
pub use example::{coerce_example, ExampleError};
pub use grpc_openapi_core::{descriptor, options, AnnotationError};

/// Internal building blocks for advanced use and testing.
///
/// **Not covered by semver guarantees.** These re-exports are `#[doc(hidden)]`
/// and may change in any release.
#[doc(hidden)]
pub mod internal {
    pub use crate::naming::ResolvedNames;
    pub use crate::oneof::{combinations, Combination};
    pub use crate::prune::Pruner;
    pub use crate::visibility::Visibility;
    pub use crate::wkt::{is_well_known, well_known_schema};
}
