//! OpenAPI 3.x specifics: parameter `schema`, `requestBody` and `content`.

use super::{RawBody, RefResolver, SchemaInvalidReason, dialect::is_json_media_type};
use serde_json::{Map, Value};

pub(crate) fn parameter_schema(
    resolver: RefResolver<'_>,
    parameter: &Value,
) -> Result<Value, SchemaInvalidReason> {
    if let Some(schema) = parameter.get("schema") {
        return resolver.inline(schema);
    }
    let media_schema = parameter
        .get("content")
        .and_then(Value::as_object)
        .and_then(json_media)
        .and_then(|media| media.get("schema"));
    media_schema.map_or_else(|| Ok(Value::Object(Map::new())), |schema| resolver.inline(schema))
}

pub(crate) fn request_body<'doc>(
    resolver: RefResolver<'doc>,
    operation: &'doc Map<String, Value>,
) -> Result<Option<RawBody>, SchemaInvalidReason> {
    let Some(raw_body) = operation.get("requestBody") else {
        return Ok(None);
    };
    let body = resolver.resolve(raw_body)?;
    let Some(content) = body.get("content").and_then(Value::as_object) else {
        return Ok(None);
    };
    let Some((content_type, media)) = json_media_entry(content) else {
        return Ok(None);
    };
    let schema = media
        .get("schema")
        .map_or_else(|| Ok(Value::Object(Map::new())), |schema| resolver.inline(schema))?;

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
    response
        .get("content")
        .and_then(Value::as_object)
        .is_some_and(|content| content.keys().any(|media| is_json_media_type(media)))
}

fn json_media(content: &Map<String, Value>) -> Option<&Value> {
    json_media_entry(content).map(|(_, media)| media)
}

/// Prefers `application/json`, falling back to the first JSON-like type.
fn json_media_entry(content: &Map<String, Value>) -> Option<(&str, &Value)> {
    content
        .get_key_value("application/json")
        .or_else(|| {
            content
                .iter()
                .find(|(media_type, _)| is_json_media_type(media_type))
        })
        .map(|(media_type, media)| (media_type.as_str(), media))
}
