//! Fixed schemas for `google.protobuf` well-known types.

use crate::schema::{Schema, SchemaType};

/// Schema a well-known type aliases to, or `None` for ordinary types.
///
/// Accepts names with or without the leading dot.
#[must_use]
pub fn well_known_schema(fqn: &str) -> Option<Schema> {
    use SchemaType as T;

    let name = fqn.trim_start_matches('.').strip_prefix("google.protobuf.")?;
    Some(match name {
        "FieldMask" | "Duration" | "StringValue" | "NullValue" => Schema::typed(T::String),
        "Timestamp" => Schema::formatted(T::String, "date-time"),
        "BytesValue" => Schema::formatted(T::String, "byte"),
        "Int32Value" => Schema::formatted(T::Integer, "int32"),
        "UInt32Value" => Schema::formatted(T::Integer, "int64"),
        "Int64Value" => Schema::formatted(T::String, "int64"),
        "UInt64Value" => Schema::formatted(T::String, "uint64"),
        "FloatValue" => Schema::formatted(T::Number, "float"),
        "DoubleValue" => Schema::formatted(T::Number, "double"),
        "BoolValue" => Schema::typed(T::Boolean),
        "Empty" | "Struct" | "Any" => Schema::typed(T::Object),
        "Value" => Schema::default(),
        "ListValue" => Schema::array(Schema::typed(T::Object)),
        _ => return None,
    })
}

/// `true` for names listed in the well-known type table.
#[must_use]
pub fn is_well_known(fqn: &str) -> bool {
    well_known_schema(fqn).is_some()
}
