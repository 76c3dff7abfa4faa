//! Proto `snake_case` to JSON `lowerCamelCase` conversion.

use std::collections::BTreeMap;

use crate::schema::Schema;

/// Convert a `snake_case` proto name to `lowerCamelCase`.
pub(crate) fn lower_camel(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }
    result
}

/// Rewrite property keys and `required` entries to JSON names, recursively.
pub(crate) fn json_names(schema: &mut Schema) {
    if !schema.properties.is_empty() {
        let properties = std::mem::take(&mut schema.properties);
        schema.properties = properties
            .into_iter()
            .map(|(name, mut property)| {
                json_names(&mut property);
                (lower_camel(&name), property)
            })
            .collect::<BTreeMap<_, _>>();
    }
    for name in &mut schema.required {
        *name = lower_camel(name);
    }
    for child in [&mut schema.items, &mut schema.additional_properties]
        .into_iter()
        .flatten()
    {
        json_names(child);
    }
    for alternative in &mut schema.one_of {
        json_names(alternative);
    }
}
