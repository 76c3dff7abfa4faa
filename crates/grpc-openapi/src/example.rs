//! Coercion of annotation example literals into typed JSON values.

use serde_json::Value;

use crate::schema::SchemaType;

/// An example literal that does not fit its field's JSON type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ExampleError {
    /// Boolean target, literal is neither `true` nor `false`.
    #[error("{literal:?} is not a boolean")]
    NotBoolean {
        /// Offending literal.
        literal: String,
    },

    /// Integer target, literal has a non-zero fractional part.
    #[error("{literal:?} has a fractional part and cannot be an integer")]
    Fractional {
        /// Offending literal.
        literal: String,
    },

    /// Numeric target, literal is not a finite number.
    #[error("{literal:?} is not numeric")]
    NotNumeric {
        /// Offending literal.
        literal: String,
    },
}

/// Coerce `literal` into a JSON value of type `target`.
///
/// Numeric and boolean targets accept an optionally double-quoted literal.
/// A decimal with an all-zero fraction is accepted for integers. String
/// targets keep a valid JSON string literal and stringify anything else.
/// Other targets parse the literal as JSON, falling back to a string.
///
/// # Errors
///
/// Returns [`ExampleError`] when the literal cannot represent `target`.
pub fn coerce_example(literal: &str, target: Option<SchemaType>) -> Result<Value, ExampleError> {
    let trimmed = literal.trim();
    match target {
        Some(SchemaType::Boolean) => match unquote(trimmed) {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(ExampleError::NotBoolean {
                literal: literal.to_string(),
            }),
        },
        Some(SchemaType::Integer) => coerce_integer(literal, unquote(trimmed)),
        Some(SchemaType::Number) => coerce_number(literal, unquote(trimmed)),
        Some(SchemaType::String) => Ok(serde_json::from_str::<String>(trimmed)
            .map_or_else(|_| Value::String(literal.to_string()), Value::String)),
        _ => Ok(serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(literal.to_string()))),
    }
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s)
}

fn coerce_integer(literal: &str, digits: &str) -> Result<Value, ExampleError> {
    if let Ok(n) = digits.parse::<i64>() {
        return Ok(Value::from(n));
    }
    if let Ok(n) = digits.parse::<u64>() {
        return Ok(Value::from(n));
    }

    // `12.000` is an integer literal with a redundant fraction.
    let Some((whole, fraction)) = digits.split_once('.') else {
        return Err(ExampleError::NotNumeric {
            literal: literal.to_string(),
        });
    };
    if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ExampleError::NotNumeric {
            literal: literal.to_string(),
        });
    }
    if fraction.bytes().any(|b| b != b'0') {
        return Err(ExampleError::Fractional {
            literal: literal.to_string(),
        });
    }
    coerce_integer(literal, whole)
}

fn coerce_number(literal: &str, digits: &str) -> Result<Value, ExampleError> {
    if let Ok(n) = digits.parse::<i64>() {
        return Ok(Value::from(n));
    }
    digits
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| ExampleError::NotNumeric {
            literal: literal.to_string(),
        })
}
