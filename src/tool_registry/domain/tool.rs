//! Externally visible tool compiled 1:1 from an operation.

use super::{BodyMode, Operation, Parameter, ParameterLocation, ServiceDescriptor, ToolName};
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// A callable unit exposed to agents over MCP.
#[derive(Debug, Clone, PartialEq)]
pub struct Tool {
    name: ToolName,
    description: String,
    input_schema: Value,
    service: Arc<ServiceDescriptor>,
    operation: Arc<Operation>,
}

impl Tool {
    /// Builds a tool for an operation of a service.
    #[must_use]
    pub fn from_operation(service: Arc<ServiceDescriptor>, operation: Arc<Operation>) -> Self {
        let name = ToolName::for_operation(service.name(), operation.operation_id());
        let description = operation.tool_description();
        let input_schema = input_schema_for(&operation);
        Self {
            name,
            description,
            input_schema,
            service,
            operation,
        }
    }

    /// Returns the globally unique tool name.
    #[must_use]
    pub const fn name(&self) -> &ToolName {
        &self.name
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the JSON Schema describing accepted arguments.
    #[must_use]
    pub const fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    /// Returns the owning service.
    #[must_use]
    pub fn service(&self) -> &ServiceDescriptor {
        &self.service
    }

    /// Returns the compiled operation behind the tool.
    #[must_use]
    pub fn operation(&self) -> &Operation {
        &self.operation
    }
}

fn input_schema_for(operation: &Operation) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    let whole_body = operation
        .request_body()
        .is_some_and(|body| body.mode() == BodyMode::Whole);

    for parameter in operation.parameters() {
        let is_whole_body = whole_body && parameter.location() == ParameterLocation::Body;
        properties.insert(
            parameter.name().to_owned(),
            property_schema(parameter, is_whole_body),
        );
        if parameter.required() && parameter.default_value().is_none() {
            required.push(Value::String(parameter.name().to_owned()));
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn property_schema(parameter: &Parameter, is_whole_body: bool) -> Value {
    let mut property = match parameter.schema() {
        Value::Object(fields) => fields.clone(),
        _ => Map::new(),
    };
    property.insert(
        "type".to_owned(),
        Value::String(parameter.param_type().as_str().to_owned()),
    );

    let description = parameter.description().map_or_else(
        || {
            if is_whole_body {
                "Request body data".to_owned()
            } else {
                default_description(parameter)
            }
        },
        str::to_owned,
    );
    property.insert("description".to_owned(), Value::String(description));

    if let Some(default) = parameter.default_value() {
        property.insert("default".to_owned(), default.clone());
    }
    if let Some(values) = parameter.enum_values() {
        property.insert("enum".to_owned(), Value::Array(values.to_vec()));
    }
    Value::Object(property)
}

fn default_description(parameter: &Parameter) -> String {
    let kind = match parameter.location() {
        ParameterLocation::Path => "Path parameter",
        ParameterLocation::Query => "Query parameter",
        ParameterLocation::Header => "Header parameter",
        ParameterLocation::Body => "Request body parameter",
    };
    format!("{kind}: {}", parameter.name())
}
