//! Tagged representation of loosely-typed tool arguments.

use crate::tool_registry::domain::ParameterType;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// A tool argument with an explicit type tag.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    /// JSON `null`.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// Any JSON number.
    Number(Number),
    /// Text.
    String(String),
    /// Ordered list.
    Array(Vec<ArgumentValue>),
    /// Key-sorted map.
    Object(BTreeMap<String, ArgumentValue>),
}

impl ArgumentValue {
    /// Returns the JSON type name of the value.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Coerces the value to a declared parameter type.
    ///
    /// | declared | accepted |
    /// |---|---|
    /// | string | string; number and boolean rendered as text |
    /// | number | number; string parsing as a finite float |
    /// | integer | integral number; string parsing as a 64-bit integer |
    /// | boolean | boolean; `"true"`/`"false"`, case-insensitive |
    /// | array | array |
    /// | object | object |
    ///
    /// # Errors
    ///
    /// Returns the original value back when it cannot be coerced.
    pub fn coerce(self, declared: ParameterType) -> Result<Self, Self> {
        match (declared, self) {
            (ParameterType::String, Self::String(text)) => Ok(Self::String(text)),
            (ParameterType::String, Self::Number(number)) => Ok(Self::String(number.to_string())),
            (ParameterType::String, Self::Bool(flag)) => Ok(Self::String(flag.to_string())),

            (ParameterType::Number, Self::Number(number)) => Ok(Self::Number(number)),
            (ParameterType::Number, Self::String(text)) => {
                parse_number(&text).map(Self::Number).ok_or(Self::String(text))
            }

            (ParameterType::Integer, Self::Number(number)) => {
                if number.is_i64() || number.is_u64() {
                    Ok(Self::Number(number))
                } else {
                    Err(Self::Number(number))
                }
            }
            (ParameterType::Integer, Self::String(text)) => {
                let parsed = text.trim().parse::<i64>();
                parsed
                    .map(|integer| Self::Number(Number::from(integer)))
                    .map_err(|_| Self::String(text))
            }

            (ParameterType::Boolean, Self::Bool(flag)) => Ok(Self::Bool(flag)),
            (ParameterType::Boolean, Self::String(text)) => {
                match text.trim().to_ascii_lowercase().as_str() {
                    "true" => Ok(Self::Bool(true)),
                    "false" => Ok(Self::Bool(false)),
                    _ => Err(Self::String(text)),
                }
            }

            (ParameterType::Array, Self::Array(items)) => Ok(Self::Array(items)),
            (ParameterType::Object, Self::Object(fields)) => Ok(Self::Object(fields)),

            (_, other) => Err(other),
        }
    }

    /// Renders the value as text for a path segment, query string or header.
    ///
    /// Arrays and objects are rendered as compact JSON.
    #[must_use]
    pub fn render_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(flag) => flag.to_string(),
            Self::Number(number) => number.to_string(),
            Self::String(text) => text.clone(),
            Self::Array(_) | Self::Object(_) => Value::from(self.clone()).to_string(),
        }
    }
}

/// Parses text as a finite float, keeping integral values integral.
fn parse_number(text: &str) -> Option<Number> {
    let trimmed = text.trim();
    if let Ok(integer) = trimmed.parse::<i64>() {
        return Some(Number::from(integer));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|float| float.is_finite())
        .and_then(Number::from_f64)
}

impl From<Value> for ArgumentValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Bool(flag),
            Value::Number(number) => Self::Number(number),
            Value::String(text) => Self::String(text),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(fields) => Self::Object(
                fields
                    .into_iter()
                    .map(|(key, field)| (key, Self::from(field)))
                    .collect(),
            ),
        }
    }
}

impl From<ArgumentValue> for Value {
    fn from(value: ArgumentValue) -> Self {
        match value {
            ArgumentValue::Null => Self::Null,
            ArgumentValue::Bool(flag) => Self::Bool(flag),
            ArgumentValue::Number(number) => Self::Number(number),
            ArgumentValue::String(text) => Self::String(text),
            ArgumentValue::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            ArgumentValue::Object(fields) => Self::Object(
                fields
                    .into_iter()
                    .map(|(key, field)| (key, Self::from(field)))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(ParameterType::String, json!("abc"), json!("abc"))]
    #[case(ParameterType::String, json!(42), json!("42"))]
    #[case(ParameterType::String, json!(true), json!("true"))]
    #[case(ParameterType::Number, json!(1.5), json!(1.5))]
    #[case(ParameterType::Number, json!(" 2.25 "), json!(2.25))]
    #[case(ParameterType::Number, json!("7"), json!(7))]
    #[case(ParameterType::Integer, json!(42), json!(42))]
    #[case(ParameterType::Integer, json!("-17"), json!(-17))]
    #[case(ParameterType::Boolean, json!("TRUE"), json!(true))]
    #[case(ParameterType::Boolean, json!(false), json!(false))]
    #[case(ParameterType::Array, json!([1, "a"]), json!([1, "a"]))]
    #[case(ParameterType::Object, json!({"a": 1}), json!({"a": 1}))]
    fn accepted_coercions(
        #[case] declared: ParameterType,
        #[case] input: Value,
        #[case] expected: Value,
    ) {
        let coerced = ArgumentValue::from(input)
            .coerce(declared)
            .expect("value should coerce");
        assert_eq!(Value::from(coerced), expected);
    }

    #[rstest]
    #[case(ParameterType::Integer, json!(1.5))]
    #[case(ParameterType::Integer, json!("1.5"))]
    #[case(ParameterType::Number, json!("NaN"))]
    #[case(ParameterType::Number, json!("inf"))]
    #[case(ParameterType::Boolean, json!("yes"))]
    #[case(ParameterType::Boolean, json!(1))]
    #[case(ParameterType::String, json!([]))]
    #[case(ParameterType::Array, json!("a,b"))]
    #[case(ParameterType::Object, json!([]))]
    fn rejected_coercions(#[case] declared: ParameterType, #[case] input: Value) {
        let original = ArgumentValue::from(input);
        assert_eq!(original.clone().coerce(declared), Err(original));
    }

    #[test]
    fn compound_values_render_as_json_text() {
        let value = ArgumentValue::from(json!({"b": [1, 2], "a": "x"}));
        assert_eq!(value.render_text(), r#"{"a":"x","b":[1,2]}"#);
    }
}
