//! Resolved descriptor graph: services, methods, HTTP bindings, messages,
//! fields and enums.
//!
//! The graph is produced by an external resolver (proto parsing and HTTP
//! template resolution happen upstream). Elements are plain data with
//! `#[must_use]` builder helpers; [`Registry::new`] turns them into an
//! immutable, indexed graph and decodes every attached annotation.

use std::collections::HashMap;
use std::fmt;

use crate::options::{
    Annotation, EnumOptions, EnumValueOptions, FieldOptions, MessageOptions, MethodOptions,
    ServiceOptions,
};
use crate::AnnotationError;

/// Proto field type constants (from `google.protobuf.FieldDescriptorProto.Type`).
pub mod field_type {
    /// `TYPE_DOUBLE = 1`
    pub const DOUBLE: i32 = 1;
    /// `TYPE_FLOAT = 2`
    pub const FLOAT: i32 = 2;
    /// `TYPE_INT64 = 3`
    pub const INT64: i32 = 3;
    /// `TYPE_UINT64 = 4`
    pub const UINT64: i32 = 4;
    /// `TYPE_INT32 = 5`
    pub const INT32: i32 = 5;
    /// `TYPE_FIXED64 = 6`
    pub const FIXED64: i32 = 6;
    /// `TYPE_FIXED32 = 7`
    pub const FIXED32: i32 = 7;
    /// `TYPE_BOOL = 8`
    pub const BOOL: i32 = 8;
    /// `TYPE_STRING = 9`
    pub const STRING: i32 = 9;
    /// `TYPE_GROUP = 10` (unsupported)
    pub const GROUP: i32 = 10;
    /// `TYPE_MESSAGE = 11`
    pub const MESSAGE: i32 = 11;
    /// `TYPE_BYTES = 12`
    pub const BYTES: i32 = 12;
    /// `TYPE_UINT32 = 13`
    pub const UINT32: i32 = 13;
    /// `TYPE_ENUM = 14`
    pub const ENUM: i32 = 14;
    /// `TYPE_SFIXED32 = 15`
    pub const SFIXED32: i32 = 15;
    /// `TYPE_SFIXED64 = 16`
    pub const SFIXED64: i32 = 16;
    /// `TYPE_SINT32 = 17`
    pub const SINT32: i32 = 17;
    /// `TYPE_SINT64 = 18`
    pub const SINT64: i32 = 18;
}

/// Declared kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum FieldKind {
    Double,
    Float,
    Int64,
    Uint64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    String,
    Message,
    Bytes,
    Uint32,
    Enum,
    Sfixed32,
    Sfixed64,
    Sint32,
    Sint64,
}

impl FieldKind {
    /// Map a `FieldDescriptorProto.Type` number. Groups and unknown numbers yield `None`.
    #[must_use]
    pub const fn from_proto(ty: i32) -> Option<Self> {
        Some(match ty {
            field_type::DOUBLE => Self::Double,
            field_type::FLOAT => Self::Float,
            field_type::INT64 => Self::Int64,
            field_type::UINT64 => Self::Uint64,
            field_type::INT32 => Self::Int32,
            field_type::FIXED64 => Self::Fixed64,
            field_type::FIXED32 => Self::Fixed32,
            field_type::BOOL => Self::Bool,
            field_type::STRING => Self::String,
            field_type::MESSAGE => Self::Message,
            field_type::BYTES => Self::Bytes,
            field_type::UINT32 => Self::Uint32,
            field_type::ENUM => Self::Enum,
            field_type::SFIXED32 => Self::Sfixed32,
            field_type::SFIXED64 => Self::Sfixed64,
            field_type::SINT32 => Self::Sint32,
            field_type::SINT64 => Self::Sint64,
            _ => return None,
        })
    }

    /// `true` for kinds that reference another type by name.
    #[must_use]
    pub const fn is_reference(self) -> bool {
        matches!(self, Self::Message | Self::Enum)
    }
}

/// Repetition label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Label {
    /// Optional or required scalar/message.
    #[default]
    Singular,
    /// `repeated` (also used for map fields).
    Repeated,
}

// ---------------------------------------------------------------------------
// Field paths
// ---------------------------------------------------------------------------

/// Dotted proto field path, e.g. `book.author.name`.
///
/// The empty path selects the whole message (`body: "*"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Parse a dotted path. `"*"` and `""` both denote the whole message.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        if path.is_empty() || path == "*" {
            return Self::default();
        }
        Self(path.split('.').map(str::to_string).collect())
    }

    /// Path segments, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// `true` when the path selects the whole message.
    #[must_use]
    pub fn is_whole_message(&self) -> bool {
        self.0.is_empty()
    }

    /// `true` when `self` equals `other` or is a proper prefix of it.
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        other.0.starts_with(&self.0)
    }

    /// The remainder of `self` after stripping `prefix`, if `prefix` matches.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &Self) -> Option<Self> {
        self.0
            .strip_prefix(prefix.0.as_slice())
            .map(|rest| Self(rest.to_vec()))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("*");
        }
        f.write_str(&self.0.join("."))
    }
}

// ---------------------------------------------------------------------------
// Elements
// ---------------------------------------------------------------------------

/// A message field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Proto field name (`snake_case`).
    pub name: String,
    /// Declared kind.
    pub kind: FieldKind,
    /// Repetition label.
    pub label: Label,
    /// Fully-qualified referenced type for message and enum kinds.
    pub type_name: Option<String>,
    /// Index into the owning message's `oneofs`.
    pub oneof_index: Option<usize>,
    /// `deprecated = true` field option.
    pub deprecated: bool,
    /// Raw annotations as attached by the resolver.
    pub annotations: Vec<Annotation>,
    options: FieldOptions,
}

impl Field {
    /// Singular field of the given kind.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            label: Label::Singular,
            type_name: None,
            oneof_index: None,
            deprecated: false,
            annotations: Vec::new(),
            options: FieldOptions::default(),
        }
    }

    /// Singular message field referencing `type_name`.
    #[must_use]
    pub fn message(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Message).type_name(type_name)
    }

    /// Singular enum field referencing `type_name`.
    #[must_use]
    pub fn enumeration(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Enum).type_name(type_name)
    }

    /// Set the referenced type (leading dot added when missing).
    #[must_use]
    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(normalize_fqn(type_name.into()));
        self
    }

    /// Mark the field `repeated`.
    #[must_use]
    pub fn repeated(mut self) -> Self {
        self.label = Label::Repeated;
        self
    }

    /// Place the field in oneof group `index`.
    #[must_use]
    pub fn in_oneof(mut self, index: usize) -> Self {
        self.oneof_index = Some(index);
        self
    }

    /// Mark the field deprecated.
    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Attach a raw annotation.
    #[must_use]
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Decoded annotations. Empty until the field is registered.
    #[must_use]
    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    /// `true` for `repeated` fields.
    #[must_use]
    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }
}

/// A message type.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Fully-qualified name with leading dot (`.pkg.Outer.Inner`).
    pub fqn: String,
    /// Unqualified name.
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<Field>,
    /// Oneof group names, indexed by [`Field::oneof_index`].
    pub oneofs: Vec<String>,
    /// Compiler-synthesized map entry.
    pub map_entry: bool,
    /// Raw annotations as attached by the resolver.
    pub annotations: Vec<Annotation>,
    options: MessageOptions,
}

impl Message {
    /// Empty message named by its fully-qualified name.
    #[must_use]
    pub fn new(fqn: impl Into<String>) -> Self {
        let fqn = normalize_fqn(fqn.into());
        Self {
            name: last_segment(&fqn).to_string(),
            fqn,
            fields: Vec::new(),
            oneofs: Vec::new(),
            map_entry: false,
            annotations: Vec::new(),
            options: MessageOptions::default(),
        }
    }

    /// Synthesized map entry with `key` and `value` fields.
    #[must_use]
    pub fn map_entry(fqn: impl Into<String>, key: FieldKind, value: Field) -> Self {
        let mut entry = Self::new(fqn)
            .field(Field::new("key", key))
            .field(Field { name: "value".to_string(), ..value });
        entry.map_entry = true;
        entry
    }

    /// Append a field.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare a oneof group; fields join it via [`Field::in_oneof`].
    #[must_use]
    pub fn oneof(mut self, name: impl Into<String>) -> Self {
        self.oneofs.push(name.into());
        self
    }

    /// Attach a raw annotation.
    #[must_use]
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Decoded annotations. Empty until the message is registered.
    #[must_use]
    pub fn options(&self) -> &MessageOptions {
        &self.options
    }

    /// Field by proto name.
    #[must_use]
    pub fn field_named(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fully-qualified name without the leading dot.
    #[must_use]
    pub fn full_name(&self) -> &str {
        self.fqn.trim_start_matches('.')
    }
}

/// An enum value.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    /// Value name (`SCREAMING_CASE`).
    pub name: String,
    /// Wire number.
    pub number: i32,
    /// Raw annotations as attached by the resolver.
    pub annotations: Vec<Annotation>,
    options: EnumValueOptions,
}

impl EnumValue {
    /// Value without annotations.
    #[must_use]
    pub fn new(name: impl Into<String>, number: i32) -> Self {
        Self {
            name: name.into(),
            number,
            annotations: Vec::new(),
            options: EnumValueOptions::default(),
        }
    }

    /// Attach a raw annotation.
    #[must_use]
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Decoded annotations. Empty until the enum is registered.
    #[must_use]
    pub fn options(&self) -> &EnumValueOptions {
        &self.options
    }
}

/// An enum type.
#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    /// Fully-qualified name with leading dot.
    pub fqn: String,
    /// Unqualified name.
    pub name: String,
    /// Values in declaration order.
    pub values: Vec<EnumValue>,
    /// Raw annotations as attached by the resolver.
    pub annotations: Vec<Annotation>,
    options: EnumOptions,
}

impl Enum {
    /// Empty enum named by its fully-qualified name.
    #[must_use]
    pub fn new(fqn: impl Into<String>) -> Self {
        let fqn = normalize_fqn(fqn.into());
        Self {
            name: last_segment(&fqn).to_string(),
            fqn,
            values: Vec::new(),
            annotations: Vec::new(),
            options: EnumOptions::default(),
        }
    }

    /// Append a value.
    #[must_use]
    pub fn value(mut self, value: EnumValue) -> Self {
        self.values.push(value);
        self
    }

    /// Attach a raw annotation.
    #[must_use]
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Decoded annotations. Empty until the enum is registered.
    #[must_use]
    pub fn options(&self) -> &EnumOptions {
        &self.options
    }
}

/// One HTTP mapping of an RPC method, already resolved from its template.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// Position among the method's bindings; `0` is the primary rule.
    pub index: usize,
    /// Upper-case HTTP verb (`GET`, `POST`, ...).
    pub http_method: String,
    /// Path template as it should appear in the document (`/v1/items/{id}`).
    pub path_template: String,
    /// Path variables in template order.
    pub path_params: Vec<FieldPath>,
    /// Request body selector; `None` means no body.
    pub body: Option<FieldPath>,
    /// Response body selector; `None` means the whole response message.
    pub response_body: Option<FieldPath>,
}

impl Binding {
    /// Binding without path variables or body.
    #[must_use]
    pub fn new(http_method: impl Into<String>, path_template: impl Into<String>) -> Self {
        Self {
            index: 0,
            http_method: http_method.into(),
            path_template: path_template.into(),
            path_params: Vec::new(),
            body: None,
            response_body: None,
        }
    }

    /// Set the binding index.
    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Append a path variable bound to the dotted field path.
    #[must_use]
    pub fn path_param(mut self, path: &str) -> Self {
        self.path_params.push(FieldPath::parse(path));
        self
    }

    /// Set the body selector (`"*"` for the whole message).
    #[must_use]
    pub fn body(mut self, path: &str) -> Self {
        self.body = Some(FieldPath::parse(path));
        self
    }

    /// Set the response body selector.
    #[must_use]
    pub fn response_body(mut self, path: &str) -> Self {
        self.response_body = Some(FieldPath::parse(path));
        self
    }
}

/// An RPC method.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    /// Method name.
    pub name: String,
    /// Fully-qualified request message.
    pub input_type: String,
    /// Fully-qualified response message.
    pub output_type: String,
    /// HTTP bindings, primary first.
    pub bindings: Vec<Binding>,
    /// Raw annotations as attached by the resolver.
    pub annotations: Vec<Annotation>,
    options: MethodOptions,
}

impl Method {
    /// Method without bindings.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        input_type: impl Into<String>,
        output_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            input_type: normalize_fqn(input_type.into()),
            output_type: normalize_fqn(output_type.into()),
            bindings: Vec::new(),
            annotations: Vec::new(),
            options: MethodOptions::default(),
        }
    }

    /// Append a binding; its index is set to its position.
    #[must_use]
    pub fn binding(mut self, binding: Binding) -> Self {
        let index = self.bindings.len();
        self.bindings.push(binding.index(index));
        self
    }

    /// Attach a raw annotation.
    #[must_use]
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Decoded annotations. Empty until the service is registered.
    #[must_use]
    pub fn options(&self) -> &MethodOptions {
        &self.options
    }
}

/// An RPC service.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    /// Fully-qualified name with leading dot.
    pub fqn: String,
    /// Unqualified name.
    pub name: String,
    /// Methods in declaration order.
    pub methods: Vec<Method>,
    /// Raw annotations as attached by the resolver.
    pub annotations: Vec<Annotation>,
    options: ServiceOptions,
}

impl Service {
    /// Service without methods.
    #[must_use]
    pub fn new(fqn: impl Into<String>) -> Self {
        let fqn = normalize_fqn(fqn.into());
        Self {
            name: last_segment(&fqn).to_string(),
            fqn,
            methods: Vec::new(),
            annotations: Vec::new(),
            options: ServiceOptions::default(),
        }
    }

    /// Append a method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    /// Attach a raw annotation.
    #[must_use]
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Decoded annotations. Empty until the service is registered.
    #[must_use]
    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable, indexed descriptor graph with decoded annotations.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    messages: Vec<Message>,
    enums: Vec<Enum>,
    services: Vec<Service>,
    message_index: HashMap<String, usize>,
    enum_index: HashMap<String, usize>,
}

impl Registry {
    /// Index the graph and decode every annotation.
    ///
    /// When two types share a fully-qualified name the first one wins.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationError`] for the first annotation whose payload
    /// does not fit its slot or its element.
    pub fn new(
        mut messages: Vec<Message>,
        mut enums: Vec<Enum>,
        mut services: Vec<Service>,
    ) -> Result<Self, AnnotationError> {
        for message in &mut messages {
            message.options = MessageOptions::decode(message.full_name(), &message.annotations)?;
            for field in &mut message.fields {
                let element = format!("{}.{}", message.fqn.trim_start_matches('.'), field.name);
                field.options = FieldOptions::decode(&element, &field.annotations)?;
            }
        }

        for en in &mut enums {
            let name = en.fqn.trim_start_matches('.').to_string();
            en.options = EnumOptions::decode(&name, &en.annotations)?;
            for value in &mut en.values {
                let element = format!("{name}.{}", value.name);
                value.options = EnumValueOptions::decode(&element, &value.annotations)?;
            }
        }

        for service in &mut services {
            let name = service.fqn.trim_start_matches('.').to_string();
            service.options = ServiceOptions::decode(&name, &service.annotations)?;
            for method in &mut service.methods {
                let element = format!("{name}.{}", method.name);
                method.options = MethodOptions::decode(&element, &method.annotations)?;
            }
        }

        let mut message_index = HashMap::with_capacity(messages.len());
        for (i, message) in messages.iter().enumerate() {
            message_index.entry(message.fqn.clone()).or_insert(i);
        }
        let mut enum_index = HashMap::with_capacity(enums.len());
        for (i, en) in enums.iter().enumerate() {
            enum_index.entry(en.fqn.clone()).or_insert(i);
        }

        Ok(Self {
            messages,
            enums,
            services,
            message_index,
            enum_index,
        })
    }

    /// All messages in registration order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// All enums in registration order.
    #[must_use]
    pub fn enums(&self) -> &[Enum] {
        &self.enums
    }

    /// All services in registration order.
    #[must_use]
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Message by fully-qualified name (leading dot optional).
    #[must_use]
    pub fn lookup_message(&self, fqn: &str) -> Option<&Message> {
        self.message_index
            .get(&*dotted(fqn))
            .map(|&i| &self.messages[i])
    }

    /// Enum by fully-qualified name (leading dot optional).
    #[must_use]
    pub fn lookup_enum(&self, fqn: &str) -> Option<&Enum> {
        self.enum_index
            .get(&*dotted(fqn))
            .map(|&i| &self.enums[i])
    }

    /// Walk `path` from `root`, returning each `(owner, field)` hop.
    ///
    /// Returns `None` when a segment names no field, or when an intermediate
    /// hop is not a resolvable message field. The whole-message path yields
    /// an empty walk.
    #[must_use]
    pub fn resolve_path<'a>(
        &'a self,
        root: &'a Message,
        path: &FieldPath,
    ) -> Option<Vec<(&'a Message, &'a Field)>> {
        let mut hops = Vec::with_capacity(path.segments().len());
        let mut owner = root;
        let mut segments = path.segments().iter().peekable();
        while let Some(segment) = segments.next() {
            let field = owner.field_named(segment)?;
            hops.push((owner, field));
            if segments.peek().is_some() {
                if field.kind != FieldKind::Message || field.is_repeated() {
                    return None;
                }
                owner = self.lookup_message(field.type_name.as_deref()?)?;
            }
        }
        Some(hops)
    }
}

fn normalize_fqn(fqn: String) -> String {
    if fqn.starts_with('.') {
        fqn
    } else {
        format!(".{fqn}")
    }
}

fn dotted(fqn: &str) -> std::borrow::Cow<'_, str> {
    if fqn.starts_with('.') {
        std::borrow::Cow::Borrowed(fqn)
    } else {
        std::borrow::Cow::Owned(format!(".{fqn}"))
    }
}

fn last_segment(fqn: &str) -> &str {
    fqn.rsplit('.').next().unwrap_or(fqn)
}
