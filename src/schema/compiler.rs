//! Dialect-independent walk over `paths` producing compiled operations.

use super::{
    Dialect, RawBody, RefResolver, SchemaInvalidReason, types::parameter_type,
};
use crate::tool_registry::domain::{
    BodyMode, HttpMethod, Operation, Parameter, ParameterLocation, ParameterType, PathTemplate,
    RequestBody, ResponseHint, sanitize_identifier,
};
use serde_json::{Map, Value};
use std::collections::HashSet;

type Reason = SchemaInvalidReason;

/// Compiles every operation of a document in deterministic order.
///
/// Paths are visited in sorted order and methods in [`HttpMethod::ALL`]
/// order.
pub(crate) fn compile_document(
    document: &Value,
    dialect: Dialect,
) -> Result<Vec<Operation>, Reason> {
    let resolver = RefResolver::new(document);
    let Some(raw_paths) = document.get("paths") else {
        return Ok(Vec::new());
    };
    let paths = raw_paths
        .as_object()
        .ok_or_else(|| Reason::malformed("paths", "expected an object"))?;

    let mut path_keys: Vec<&String> = paths
        .keys()
        .filter(|path| !path.starts_with("x-"))
        .collect();
    path_keys.sort();

    let mut operations = Vec::new();
    let mut seen_ids = HashSet::new();
    for path in path_keys {
        let Some(raw_item) = paths.get(path) else {
            continue;
        };
        let item = resolver
            .resolve(raw_item)?
            .as_object()
            .ok_or_else(|| Reason::malformed(format!("paths.{path}"), "expected an object"))?;
        let shared = parameter_list(
            resolver,
            item.get("parameters"),
            &format!("paths.{path}.parameters"),
        )?;

        for method in HttpMethod::ALL {
            let Some(raw_operation) = item.get(method.schema_key()) else {
                continue;
            };
            let context = OperationContext {
                resolver,
                dialect,
                path,
                method,
                shared: &shared,
            };
            let operation = context.compile(raw_operation)?;
            if !seen_ids.insert(operation.operation_id().to_owned()) {
                return Err(Reason::DuplicateOperationId(
                    operation.operation_id().to_owned(),
                ));
            }
            operations.push(operation);
        }
    }
    Ok(operations)
}

struct OperationContext<'doc, 'ctx> {
    resolver: RefResolver<'doc>,
    dialect: Dialect,
    path: &'ctx str,
    method: HttpMethod,
    shared: &'ctx [&'doc Value],
}

impl<'doc> OperationContext<'doc, '_> {
    fn compile(&self, raw_operation: &'doc Value) -> Result<Operation, Reason> {
        let location = format!("paths.{}.{}", self.path, self.method.schema_key());
        let fields = self
            .resolver
            .resolve(raw_operation)?
            .as_object()
            .ok_or_else(|| Reason::malformed(location.clone(), "expected an object"))?;

        let operation_id = sanitize_identifier(
            fields
                .get("operationId")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|declared| !declared.is_empty())
                .map_or_else(|| derive_operation_id(self.method, self.path), str::to_owned)
                .as_str(),
        );

        let declared_template =
            PathTemplate::parse(self.path).map_err(|err| Reason::MalformedPathTemplate {
                template: err.template,
                detail: err.reason.to_owned(),
            })?;

        let own = parameter_list(
            self.resolver,
            fields.get("parameters"),
            &format!("{location}.parameters"),
        )?;
        let merged = merge_parameters(self.shared, &own);

        let mut parameters = self.compile_parameters(&operation_id, &merged)?;
        let request_body = if self.method.is_mutating() {
            self.dialect
                .request_body(self.resolver, fields, &merged)?
                .map(|body| self.compile_body(&operation_id, body, &mut parameters))
                .transpose()?
        } else {
            None
        };

        validate_parameters(&operation_id, &declared_template, &parameters)?;

        let template = self
            .dialect
            .base_path(self.resolver.document())
            .map_or_else(
                || declared_template.clone(),
                |prefix| declared_template.with_prefix(prefix),
            );

        Ok(Operation::new(operation_id, self.method, template)
            .with_documentation(string_field(fields, "summary"), string_field(fields, "description"))
            .with_tags(tags(fields))
            .with_parameters(parameters)
            .with_request_body(request_body)
            .with_responses(self.responses(fields)?))
    }

    fn compile_parameters(
        &self,
        operation_id: &str,
        merged: &[&'doc Value],
    ) -> Result<Vec<Parameter>, Reason> {
        let mut parameters = Vec::with_capacity(merged.len());
        for raw in merged {
            let name = raw.get("name").and_then(Value::as_str).unwrap_or_default();
            let declared_location = raw.get("in").and_then(Value::as_str).unwrap_or_default();
            let location = match declared_location {
                "path" => ParameterLocation::Path,
                "query" => ParameterLocation::Query,
                "header" => ParameterLocation::Header,
                "cookie" => continue,
                "body" if self.dialect.has_body_parameters() => continue,
                other => {
                    return Err(Reason::UnsupportedParameterLocation {
                        operation: operation_id.to_owned(),
                        parameter: name.to_owned(),
                        location: other.to_owned(),
                    });
                }
            };

            let schema = self.dialect.parameter_schema(self.resolver, raw)?;
            let param_type = parameter_type(
                self.resolver,
                &schema,
                &format!("{operation_id}.{name}"),
            )?;
            let required = raw
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false);

            parameters.push(
                Parameter::new(name, location, param_type, required)
                    .with_description(raw.get("description").and_then(Value::as_str).map(str::to_owned))
                    .with_default(schema.get("default").cloned())
                    .with_enum_values(enum_values(&schema))
                    .with_schema(schema),
            );
        }
        Ok(parameters)
    }

    /// Adds body parameters and returns the compiled request body.
    fn compile_body(
        &self,
        operation_id: &str,
        body: RawBody,
        parameters: &mut Vec<Parameter>,
    ) -> Result<RequestBody, Reason> {
        let body_type = parameter_type(
            self.resolver,
            &body.schema,
            &format!("{operation_id}.body"),
        )?;
        let properties = body
            .schema
            .get("properties")
            .and_then(Value::as_object)
            .filter(|properties| !properties.is_empty());

        let mode = match properties {
            Some(fields) if body_type == ParameterType::Object => {
                let required_names = required_names(&body.schema);
                for (name, property) in fields {
                    let property_type = parameter_type(
                        self.resolver,
                        property,
                        &format!("{operation_id}.body.{name}"),
                    )?;
                    parameters.push(
                        Parameter::new(
                            name.as_str(),
                            ParameterLocation::Body,
                            property_type,
                            body.required && required_names.contains(name.as_str()),
                        )
                        .with_description(
                            property
                                .get("description")
                                .and_then(Value::as_str)
                                .map(str::to_owned),
                        )
                        .with_default(property.get("default").cloned())
                        .with_enum_values(enum_values(property))
                        .with_schema(property.clone()),
                    );
                }
                BodyMode::Fields
            }
            _ => {
                parameters.push(
                    Parameter::new("body", ParameterLocation::Body, body_type, body.required)
                        .with_description(
                            body.schema
                                .get("description")
                                .and_then(Value::as_str)
                                .map(str::to_owned),
                        )
                        .with_schema(body.schema.clone()),
                );
                BodyMode::Whole
            }
        };

        Ok(RequestBody::new(
            body.content_type,
            body.required,
            mode,
            body.schema,
        ))
    }

    fn responses(&self, fields: &'doc Map<String, Value>) -> Result<Vec<ResponseHint>, Reason> {
        let Some(responses) = fields.get("responses").and_then(Value::as_object) else {
            return Ok(Vec::new());
        };
        responses
            .iter()
            .filter(|(status, _)| !status.starts_with("x-"))
            .map(|(status, raw)| {
                let response = self.resolver.resolve(raw)?;
                Ok(ResponseHint {
                    status: status.clone(),
                    description: response
                        .get("description")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_owned(),
                    has_json_body: self.dialect.response_has_json_body(response),
                })
            })
            .collect()
    }
}

/// Resolves a `parameters` array into parameter objects with `name` and `in`.
fn parameter_list<'doc>(
    resolver: RefResolver<'doc>,
    raw: Option<&'doc Value>,
    location: &str,
) -> Result<Vec<&'doc Value>, Reason> {
    let Some(value) = raw else {
        return Ok(Vec::new());
    };
    let entries = value
        .as_array()
        .ok_or_else(|| Reason::malformed(location, "expected an array"))?;
    entries
        .iter()
        .map(|entry| {
            let parameter = resolver.resolve(entry)?;
            let has_identity = parameter.get("name").and_then(Value::as_str).is_some()
                && parameter.get("in").and_then(Value::as_str).is_some();
            if has_identity {
                Ok(parameter)
            } else {
                Err(Reason::malformed(
                    location,
                    "parameter requires string 'name' and 'in'",
                ))
            }
        })
        .collect()
}

/// Operation-level parameters replace path-level ones with the same name and
/// location in place; the rest are appended.
fn merge_parameters<'doc>(shared: &[&'doc Value], own: &[&'doc Value]) -> Vec<&'doc Value> {
    let identity = |parameter: &Value| (parameter.get("name").cloned(), parameter.get("in").cloned());
    let mut merged: Vec<(bool, &'doc Value)> =
        shared.iter().map(|parameter| (true, *parameter)).collect();
    for parameter in own {
        let key = identity(*parameter);
        let slot = merged
            .iter_mut()
            .find(|(inherited, existing)| *inherited && identity(*existing) == key);
        match slot {
            Some(entry) => *entry = (false, *parameter),
            None => merged.push((false, *parameter)),
        }
    }
    merged.into_iter().map(|(_, parameter)| parameter).collect()
}

fn validate_parameters(
    operation_id: &str,
    template: &PathTemplate,
    parameters: &[Parameter],
) -> Result<(), Reason> {
    let mut names = HashSet::new();
    for parameter in parameters {
        if !names.insert(parameter.name()) {
            return Err(Reason::DuplicateParameter {
                operation: operation_id.to_owned(),
                parameter: parameter.name().to_owned(),
            });
        }
    }

    let placeholders = template.placeholders();
    for placeholder in &placeholders {
        let matched = parameters.iter().any(|parameter| {
            parameter.location() == ParameterLocation::Path && parameter.name() == *placeholder
        });
        if !matched {
            return Err(Reason::UnmatchedPlaceholder {
                operation: operation_id.to_owned(),
                placeholder: (*placeholder).to_owned(),
            });
        }
    }
    for parameter in parameters {
        let is_unmatched = parameter.location() == ParameterLocation::Path
            && !placeholders.contains(&parameter.name());
        if is_unmatched {
            return Err(Reason::UnmatchedPathParameter {
                operation: operation_id.to_owned(),
                parameter: parameter.name().to_owned(),
            });
        }
    }
    Ok(())
}

/// Derives `get_customers_customer_id` from `GET /customers/{customer_id}`.
fn derive_operation_id(method: HttpMethod, path: &str) -> String {
    let segments: Vec<String> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.replace(['{', '}'], ""))
        .collect();
    if segments.is_empty() {
        format!("{}_root", method.schema_key())
    } else {
        format!("{}_{}", method.schema_key(), segments.join("_"))
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn tags(fields: &Map<String, Value>) -> Vec<String> {
    fields
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

fn enum_values(schema: &Value) -> Option<Vec<Value>> {
    schema.get("enum").and_then(Value::as_array).cloned()
}

fn required_names(schema: &Value) -> HashSet<&str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}
