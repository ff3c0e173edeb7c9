//! Swagger 2.0 specifics: inline parameter types, `in: body` and `basePath`.

use super::{RawBody, RefResolver, SchemaInvalidReason, dialect::is_json_media_type};
use serde_json::{Map, Value};

/// Parameter keywords that describe the value itself.
const SCHEMA_KEYWORDS: [&str; 13] = [
    "type",
    "format",
    "items",
    "enum",
    "default",
    "minimum",
    "maximum",
    "pattern",
    "minLength",
    "maxLength",
    "minItems",
    "maxItems",
    "uniqueItems",
];

const DEFAULT_CONTENT_TYPE: &str = "application/json";

pub(crate) fn base_path(document: &Value) -> Option<&str> {
    document
        .get("basePath")
        .and_then(Value::as_str)
        .filter(|path| *path != "/" && !path.is_empty())
}

pub(crate) fn parameter_schema(
    resolver: RefResolver<'_>,
    parameter: &Value,
) -> Result<Value, SchemaInvalidReason> {
    let mut schema = Map::new();
    for keyword in SCHEMA_KEYWORDS {
        if let Some(value) = parameter.get(keyword) {
            schema.insert(keyword.to_owned(), resolver.inline(value)?);
        }
    }
    Ok(Value::Object(schema))
}

pub(crate) fn request_body<'doc>(
    resolver: RefResolver<'doc>,
    operation: &'doc Map<String, Value>,
    parameters: &[&'doc Value],
) -> Result<Option<RawBody>, SchemaInvalidReason> {
    let Some(body) = parameters
        .iter()
        .find(|parameter| parameter.get("in").and_then(Value::as_str) == Some("body"))
    else {
        return Ok(None);
    };
    let schema = body
        .get("schema")
        .map_or_else(|| Ok(Value::Object(Map::new())), |schema| resolver.inline(schema))?;

    let content_type = operation
        .get("consumes")
        .or_else(|| resolver.document().get("consumes"))
        .and_then(Value::as_array)
        .and_then(|media_types| {
            media_types
                .iter()
                .filter_map(Value::as_str)
                .find(|media_type| is_json_media_type(media_type))
        })
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    Ok(Some(RawBody {
        content_type: content_type.to_owned(),
        required: body
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        schema,
    }))
}

pub(crate) fn response_has_json_body(response: &Value) -> bool {
    response.get("schema").is_some()
}
