//! Local `$ref` resolution.

use super::SchemaInvalidReason;
use serde_json::{Map, Value};

/// Maximum number of `$ref` hops followed for one value.
const MAX_REF_DEPTH: usize = 32;

/// Resolves `#/...` references against one document.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RefResolver<'doc> {
    document: &'doc Value,
}

impl<'doc> RefResolver<'doc> {
    pub(crate) const fn new(document: &'doc Value) -> Self {
        Self { document }
    }

    pub(crate) const fn document(&self) -> &'doc Value {
        self.document
    }

    /// Follows `$ref` chains until a non-reference value is reached.
    pub(crate) fn resolve(&self, value: &'doc Value) -> Result<&'doc Value, SchemaInvalidReason> {
        let mut current = value;
        for _ in 0..MAX_REF_DEPTH {
            match reference_of(current) {
                Some(reference) => current = self.lookup(reference)?,
                None => return Ok(current),
            }
        }
        Err(SchemaInvalidReason::ReferenceCycle(
            reference_of(current).unwrap_or_default().to_owned(),
        ))
    }

    /// Returns a copy of `value` with every nested reference inlined.
    ///
    /// Recursive schemas are cut at the point of recursion and replaced with
    /// an unconstrained `{}` schema.
    pub(crate) fn inline(&self, value: &'doc Value) -> Result<Value, SchemaInvalidReason> {
        let mut expanding = Vec::new();
        self.inline_with(value, &mut expanding)
    }

    fn inline_with(
        &self,
        value: &'doc Value,
        expanding: &mut Vec<&'doc str>,
    ) -> Result<Value, SchemaInvalidReason> {
        if let Some(reference) = reference_of(value) {
            if expanding.contains(&reference) {
                return Ok(Value::Object(Map::new()));
            }
            if expanding.len() >= MAX_REF_DEPTH {
                return Err(SchemaInvalidReason::ReferenceCycle(reference.to_owned()));
            }
            let target = self.lookup(reference)?;
            expanding.push(reference);
            let inlined = self.inline_with(target, expanding);
            expanding.pop();
            return inlined;
        }

        match value {
            Value::Object(fields) => fields
                .iter()
                .map(|(key, field)| Ok((key.clone(), self.inline_with(field, expanding)?)))
                .collect::<Result<Map<String, Value>, _>>()
                .map(Value::Object),
            Value::Array(items) => items
                .iter()
                .map(|item| self.inline_with(item, expanding))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn lookup(&self, reference: &str) -> Result<&'doc Value, SchemaInvalidReason> {
        let pointer = reference
            .strip_prefix('#')
            .filter(|pointer| pointer.is_empty() || pointer.starts_with('/'))
            .ok_or_else(|| SchemaInvalidReason::NonLocalReference(reference.to_owned()))?;
        self.document
            .pointer(pointer)
            .ok_or_else(|| SchemaInvalidReason::DanglingReference(reference.to_owned()))
    }
}

fn reference_of(value: &Value) -> Option<&str> {
    value.get("$ref").and_then(Value::as_str)
}
