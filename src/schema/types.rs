//! Declared-type extraction and inference for schema fragments.

use super::{RefResolver, SchemaInvalidReason};
use crate::tool_registry::domain::ParameterType;
use serde_json::Value;

/// Maximum nesting of `anyOf`/`oneOf`/`allOf` followed during inference.
const MAX_COMBINATOR_DEPTH: usize = 8;

/// Determines the parameter type of a schema fragment.
///
/// An explicit `type` must be one of the supported keywords; an array of
/// types uses its first non-`null` entry. Without a type, `properties`
/// implies an object, `items` an array, and combinators use their first
/// non-null variant. Anything else is a string.
pub(crate) fn parameter_type<'doc>(
    resolver: RefResolver<'doc>,
    schema: &'doc Value,
    location: &str,
) -> Result<ParameterType, SchemaInvalidReason> {
    infer(resolver, schema, location, 0)
}

fn infer<'doc>(
    resolver: RefResolver<'doc>,
    schema: &'doc Value,
    location: &str,
    depth: usize,
) -> Result<ParameterType, SchemaInvalidReason> {
    match schema.get("type") {
        Some(Value::String(type_name)) => parse_type(type_name, location),
        Some(Value::Array(type_names)) => type_names
            .iter()
            .filter_map(Value::as_str)
            .find(|type_name| *type_name != "null")
            .map_or(Ok(ParameterType::String), |type_name| {
                parse_type(type_name, location)
            }),
        Some(other) => Err(SchemaInvalidReason::UnrecognizedType {
            location: location.to_owned(),
            type_name: other.to_string(),
        }),
        None => infer_untyped(resolver, schema, location, depth),
    }
}

fn infer_untyped<'doc>(
    resolver: RefResolver<'doc>,
    schema: &'doc Value,
    location: &str,
    depth: usize,
) -> Result<ParameterType, SchemaInvalidReason> {
    if schema.get("properties").is_some() {
        return Ok(ParameterType::Object);
    }
    if schema.get("items").is_some() {
        return Ok(ParameterType::Array);
    }
    if depth >= MAX_COMBINATOR_DEPTH {
        return Ok(ParameterType::String);
    }

    for combinator in ["anyOf", "oneOf", "allOf"] {
        let Some(variants) = schema.get(combinator).and_then(Value::as_array) else {
            continue;
        };
        for variant in variants {
            let resolved = resolver.resolve(variant)?;
            if is_null_schema(resolved) {
                continue;
            }
            return infer(resolver, resolved, location, depth.saturating_add(1));
        }
    }
    Ok(ParameterType::String)
}

fn is_null_schema(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("null")
}

fn parse_type(type_name: &str, location: &str) -> Result<ParameterType, SchemaInvalidReason> {
    ParameterType::try_from(type_name).map_err(|_| SchemaInvalidReason::UnrecognizedType {
        location: location.to_owned(),
        type_name: type_name.to_owned(),
    })
}
