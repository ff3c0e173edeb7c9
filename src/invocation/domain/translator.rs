//! Validation of tool arguments and construction of the outbound request.

use super::{ArgumentValue, HttpRequest, RequestPayload, ValidationError};
use crate::tool_registry::domain::{BodyMode, Parameter, ParameterLocation, Tool};
use http::HeaderValue;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Validates `arguments` against the tool's parameters and builds the
/// downstream request.
///
/// Absent or `null` arguments are treated as an empty object. Checks run in
/// a fixed order: missing required arguments, then unknown names, then type
/// coercion. An explicit `null` value counts as not supplied.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn translate(tool: &Tool, arguments: Option<&Value>) -> Result<HttpRequest, ValidationError> {
    let supplied = supplied_arguments(arguments)?;
    let operation = tool.operation();

    for parameter in operation.parameters() {
        let has_value = supplied
            .get(parameter.name())
            .is_some_and(|value| !value.is_null());
        if parameter.required() && !has_value && parameter.default_value().is_none() {
            return Err(ValidationError::MissingRequiredArgument(
                parameter.name().to_owned(),
            ));
        }
    }

    if let Some(unknown) = supplied
        .keys()
        .find(|name| operation.parameter(name).is_none())
    {
        return Err(ValidationError::UnknownArgument(unknown.clone()));
    }

    let mut values: Vec<(&Parameter, ArgumentValue)> = Vec::new();
    for parameter in operation.parameters() {
        let provided = supplied
            .get(parameter.name())
            .filter(|value| !value.is_null());
        let value = match provided {
            Some(raw) => coerce(parameter, raw)?,
            None if parameter.required() => match parameter.default_value() {
                Some(default) => ArgumentValue::from(default.clone()),
                None => continue,
            },
            None => continue,
        };
        values.push((parameter, value));
    }

    build_request(tool, &values)
}

fn supplied_arguments(arguments: Option<&Value>) -> Result<Map<String, Value>, ValidationError> {
    match arguments {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(fields)) => Ok(fields.clone()),
        Some(other) => Err(ValidationError::TypeMismatch {
            name: "arguments".to_owned(),
            expected: "object".to_owned(),
            got: ArgumentValue::from(other.clone()).kind_name().to_owned(),
        }),
    }
}

fn coerce(parameter: &Parameter, raw: &Value) -> Result<ArgumentValue, ValidationError> {
    ArgumentValue::from(raw.clone())
        .coerce(parameter.param_type())
        .map_err(|rejected| ValidationError::TypeMismatch {
            name: parameter.name().to_owned(),
            expected: parameter.param_type().as_str().to_owned(),
            got: rejected.kind_name().to_owned(),
        })
}

fn build_request(
    tool: &Tool,
    values: &[(&Parameter, ArgumentValue)],
) -> Result<HttpRequest, ValidationError> {
    let operation = tool.operation();
    let in_location = |location: ParameterLocation| {
        values
            .iter()
            .filter(move |(parameter, _)| parameter.location() == location)
    };

    let path_values: BTreeMap<&str, String> = in_location(ParameterLocation::Path)
        .map(|(parameter, value)| path_segment(*parameter, value))
        .collect::<Result<_, _>>()?;
    let segments = operation
        .path()
        .render_segments(|name| path_values.get(name).cloned())
        .map_err(|name| ValidationError::MissingRequiredArgument(name.to_owned()))?;
    let mut url = tool.service().request_url(&segments);

    let mut query: Vec<(&str, String)> = Vec::new();
    for (parameter, value) in in_location(ParameterLocation::Query) {
        match value {
            ArgumentValue::Array(items) => {
                query.extend(items.iter().map(|item| (parameter.name(), item.render_text())));
            }
            other => query.push((parameter.name(), other.render_text())),
        }
    }
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    let headers = in_location(ParameterLocation::Header)
        .map(|(parameter, value)| header_pair(*parameter, value))
        .collect::<Result<_, _>>()?;

    let body = operation.request_body().and_then(|declared| {
        let value = match declared.mode() {
            BodyMode::Whole => in_location(ParameterLocation::Body)
                .next()
                .map(|(_, value)| Value::from(value.clone())),
            BodyMode::Fields => {
                let fields: Map<String, Value> = in_location(ParameterLocation::Body)
                    .map(|(parameter, value)| (parameter.name().to_owned(), Value::from(value.clone())))
                    .collect();
                (!fields.is_empty() || declared.required()).then_some(Value::Object(fields))
            }
        };
        value.map(|payload| RequestPayload {
            content_type: declared.content_type().to_owned(),
            value: payload,
        })
    });

    Ok(HttpRequest {
        method: operation.method(),
        url,
        headers,
        body,
    })
}

/// Renders a path argument as one segment.
///
/// Empty and dot-only values would be collapsed by URL normalisation and
/// address a different endpoint, so they are rejected.
fn path_segment<'a>(
    parameter: &'a Parameter,
    value: &ArgumentValue,
) -> Result<(&'a str, String), ValidationError> {
    let rendered = value.render_text();
    if matches!(rendered.as_str(), "" | "." | "..") {
        return Err(ValidationError::TypeMismatch {
            name: parameter.name().to_owned(),
            expected: "path segment".to_owned(),
            got: format!("'{rendered}'"),
        });
    }
    Ok((parameter.name(), rendered))
}

fn header_pair(
    parameter: &Parameter,
    value: &ArgumentValue,
) -> Result<(String, String), ValidationError> {
    let rendered = value.render_text();
    HeaderValue::from_str(&rendered).map_err(|_| ValidationError::TypeMismatch {
        name: parameter.name().to_owned(),
        expected: "header value".to_owned(),
        got: "control characters".to_owned(),
    })?;
    Ok((parameter.name().to_owned(), rendered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool_registry::domain::{
        HttpMethod, Operation, ParameterType, PathTemplate, RequestBody, ServiceDescriptor,
        ServiceName,
    };
    use rstest::{fixture, rstest};
    use serde_json::json;
    use std::sync::Arc;

    fn service() -> Arc<ServiceDescriptor> {
        let name = ServiceName::new("customer").expect("valid service name");
        Arc::new(ServiceDescriptor::new(name, "http://localhost:8001").expect("valid descriptor"))
    }

    #[fixture]
    fn get_customer() -> Tool {
        let operation = Operation::new(
            "getCustomer",
            HttpMethod::Get,
            PathTemplate::parse("/customers/{id}").expect("valid template"),
        )
        .with_parameters(vec![
            Parameter::new("id", ParameterLocation::Path, ParameterType::String, true),
            Parameter::new("expand", ParameterLocation::Query, ParameterType::Array, false),
            Parameter::new("limit", ParameterLocation::Query, ParameterType::Integer, true)
                .with_default(Some(json!(10))),
            Parameter::new("verbose", ParameterLocation::Query, ParameterType::Boolean, false)
                .with_default(Some(json!(false))),
            Parameter::new("X-Trace", ParameterLocation::Header, ParameterType::String, false),
        ]);
        Tool::from_operation(service(), Arc::new(operation))
    }

    #[fixture]
    fn create_customer() -> Tool {
        let schema = json!({"type": "object", "properties": {
            "name": {"type": "string"}, "age": {"type": "integer"}
        }});
        let operation = Operation::new(
            "createCustomer",
            HttpMethod::Post,
            PathTemplate::parse("/customers").expect("valid template"),
        )
        .with_parameters(vec![
            Parameter::new("name", ParameterLocation::Body, ParameterType::String, true),
            Parameter::new("age", ParameterLocation::Body, ParameterType::Integer, false),
        ])
        .with_request_body(Some(RequestBody::new(
            "application/json",
            true,
            BodyMode::Fields,
            schema,
        )));
        Tool::from_operation(service(), Arc::new(operation))
    }

    #[rstest]
    fn builds_path_query_and_headers(get_customer: Tool) {
        let request = translate(
            &get_customer,
            Some(&json!({"id": "42", "expand": ["orders", "notes"], "X-Trace": "abc"})),
        )
        .expect("valid arguments");

        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(
            request.url.as_str(),
            "http://localhost:8001/customers/42?expand=orders&expand=notes&limit=10"
        );
        assert_eq!(request.headers, vec![("X-Trace".to_owned(), "abc".to_owned())]);
        assert_eq!(request.body, None);
    }

    #[rstest]
    fn path_values_are_percent_encoded(get_customer: Tool) {
        let request = translate(&get_customer, Some(&json!({"id": "a/b c"})))
            .expect("valid arguments");
        assert_eq!(
            request.url.path(),
            "/customers/a%2Fb%20c"
        );
    }

    #[rstest]
    #[case(".")]
    #[case("..")]
    #[case("")]
    fn dot_and_empty_path_values_are_rejected(get_customer: Tool, #[case] id: &str) {
        assert_eq!(
            translate(&get_customer, Some(&json!({"id": id}))),
            Err(ValidationError::TypeMismatch {
                name: "id".to_owned(),
                expected: "path segment".to_owned(),
                got: format!("'{id}'"),
            })
        );
    }

    #[rstest]
    fn encoded_dots_stay_literal(get_customer: Tool) {
        let request = translate(&get_customer, Some(&json!({"id": "%2e%2e"})))
            .expect("valid arguments");
        assert_eq!(request.url.path(), "/customers/%252e%252e");
    }

    #[rstest]
    #[case("a\nb")]
    #[case("a\rb")]
    #[case("nul\u{0}")]
    fn header_values_with_control_characters_are_rejected(
        get_customer: Tool,
        #[case] trace: &str,
    ) {
        assert_eq!(
            translate(&get_customer, Some(&json!({"id": "1", "X-Trace": trace}))),
            Err(ValidationError::TypeMismatch {
                name: "X-Trace".to_owned(),
                expected: "header value".to_owned(),
                got: "control characters".to_owned(),
            })
        );
    }

    #[rstest]
    fn string_arguments_are_coerced(get_customer: Tool) {
        let request = translate(
            &get_customer,
            Some(&json!({"id": 42, "limit": "5", "verbose": "TRUE"})),
        )
        .expect("valid arguments");
        assert_eq!(
            request.url.as_str(),
            "http://localhost:8001/customers/42?limit=5&verbose=true"
        );
    }

    #[rstest]
    #[case::absent(None)]
    #[case::null(Some(json!(null)))]
    #[case::explicit_null(Some(json!({"id": null})))]
    fn missing_required_arguments_are_reported(get_customer: Tool, #[case] arguments: Option<Value>) {
        assert_eq!(
            translate(&get_customer, arguments.as_ref()),
            Err(ValidationError::MissingRequiredArgument("id".to_owned()))
        );
    }

    #[rstest]
    fn missing_arguments_are_reported_before_unknown_ones(get_customer: Tool) {
        assert_eq!(
            translate(&get_customer, Some(&json!({"ghost": 1}))),
            Err(ValidationError::MissingRequiredArgument("id".to_owned()))
        );
    }

    #[rstest]
    fn unknown_arguments_fail_closed(get_customer: Tool) {
        assert_eq!(
            translate(&get_customer, Some(&json!({"id": "1", "ghost": 1}))),
            Err(ValidationError::UnknownArgument("ghost".to_owned()))
        );
    }

    #[rstest]
    #[case(json!({"id": "1", "limit": "ten"}), "limit", "integer", "string")]
    #[case(json!({"id": "1", "expand": "orders"}), "expand", "array", "string")]
    #[case(json!({"id": []}), "id", "string", "array")]
    fn type_mismatches_name_the_argument(
        get_customer: Tool,
        #[case] arguments: Value,
        #[case] name: &str,
        #[case] expected: &str,
        #[case] got: &str,
    ) {
        assert_eq!(
            translate(&get_customer, Some(&arguments)),
            Err(ValidationError::TypeMismatch {
                name: name.to_owned(),
                expected: expected.to_owned(),
                got: got.to_owned(),
            })
        );
    }

    #[rstest]
    fn non_object_arguments_are_rejected(get_customer: Tool) {
        assert_eq!(
            translate(&get_customer, Some(&json!([1, 2]))),
            Err(ValidationError::TypeMismatch {
                name: "arguments".to_owned(),
                expected: "object".to_owned(),
                got: "array".to_owned(),
            })
        );
    }

    #[rstest]
    fn body_fields_are_assembled_into_one_object(create_customer: Tool) {
        let request = translate(&create_customer, Some(&json!({"name": "Ada", "age": "36"})))
            .expect("valid arguments");
        let body = request.body.expect("request body");

        assert_eq!(body.content_type, "application/json");
        assert_eq!(body.value, json!({"name": "Ada", "age": 36}));
        assert_eq!(request.url.as_str(), "http://localhost:8001/customers");
    }
}
