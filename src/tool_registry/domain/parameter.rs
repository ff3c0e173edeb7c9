//! Parameter definitions compiled from schema operations.

use super::ParseParameterTypeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Where a parameter travels in the outbound HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterLocation {
    /// Substituted into a path template placeholder.
    Path,
    /// Appended to the query string.
    Query,
    /// Sent as a request header.
    Header,
    /// A field of the JSON request body, or the whole body for the `body` parameter.
    Body,
}

impl ParameterLocation {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Body => "body",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Declared JSON type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    /// Text value.
    String,
    /// Floating-point or integral number.
    Number,
    /// Integral number.
    Integer,
    /// `true` or `false`.
    Boolean,
    /// JSON array.
    Array,
    /// JSON object.
    Object,
}

impl ParameterType {
    /// Returns the JSON Schema type keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ParameterType {
    type Error = ParseParameterTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "integer" => Ok(Self::Integer),
            "boolean" => Ok(Self::Boolean),
            "array" => Ok(Self::Array),
            "object" => Ok(Self::Object),
            _ => Err(ParseParameterTypeError(value.to_owned())),
        }
    }
}

/// One compiled parameter of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    name: String,
    location: ParameterLocation,
    param_type: ParameterType,
    required: bool,
    default: Option<Value>,
    description: Option<String>,
    enum_values: Option<Vec<Value>>,
    schema: Value,
}

impl Parameter {
    /// Creates a parameter. Path parameters are always marked required.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        location: ParameterLocation,
        param_type: ParameterType,
        required: bool,
    ) -> Self {
        Self {
            name: name.into(),
            location,
            param_type,
            required: required || location == ParameterLocation::Path,
            default: None,
            description: None,
            enum_values: None,
            schema: Value::Object(serde_json::Map::new()),
        }
    }

    /// Sets the declared default value.
    #[must_use]
    pub fn with_default(mut self, default: Option<Value>) -> Self {
        self.default = default;
        self
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty());
        self
    }

    /// Sets the enumerated allowed values.
    #[must_use]
    pub fn with_enum_values(mut self, values: Option<Vec<Value>>) -> Self {
        self.enum_values = values;
        self
    }

    /// Sets the resolved schema fragment describing the value.
    #[must_use]
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = schema;
        self
    }

    /// Returns the argument name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the request location.
    #[must_use]
    pub const fn location(&self) -> ParameterLocation {
        self.location
    }

    /// Returns the declared type.
    #[must_use]
    pub const fn param_type(&self) -> ParameterType {
        self.param_type
    }

    /// Returns whether a value (or default) must be present.
    #[must_use]
    pub const fn required(&self) -> bool {
        self.required
    }

    /// Returns the declared default value.
    #[must_use]
    pub const fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the enumerated allowed values.
    #[must_use]
    pub fn enum_values(&self) -> Option<&[Value]> {
        self.enum_values.as_deref()
    }

    /// Returns the resolved schema fragment.
    #[must_use]
    pub const fn schema(&self) -> &Value {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_parameters_are_always_required() {
        let parameter = Parameter::new(
            "id",
            ParameterLocation::Path,
            ParameterType::String,
            false,
        );
        assert!(parameter.required());
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert_eq!(
            ParameterType::try_from("file"),
            Err(ParseParameterTypeError("file".to_owned()))
        );
    }
}
