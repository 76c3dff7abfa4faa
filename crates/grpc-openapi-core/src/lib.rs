//! Resolved protobuf descriptor graph for the grpc-openapi generator.
//!
//! This crate holds the input contract of the generator: services, methods,
//! HTTP bindings, messages, fields and enums as produced by an upstream
//! descriptor resolver, plus the typed `openapiv3` and `google.api.visibility`
//! annotations attached to them.
//!
//! Annotations arrive as prost-encoded payloads tagged with an extension
//! [`Slot`](options::Slot). They are decoded exactly once, in
//! [`Registry::new`](descriptor::Registry::new); a payload that does not match
//! its slot is rejected there with an [`AnnotationError`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod descriptor;
mod error;
pub mod options;

pub use error::AnnotationError;
