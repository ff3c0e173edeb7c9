//! Compiled REST operations and their path templates.

use super::{Parameter, ParameterLocation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// HTTP verb of a compiled operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `PUT`
    Put,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
    /// `OPTIONS`
    Options,
    /// `HEAD`
    Head,
    /// `PATCH`
    Patch,
    /// `TRACE`
    Trace,
}

impl HttpMethod {
    /// Methods in the order a path item is scanned during compilation.
    pub const ALL: [Self; 8] = [
        Self::Get,
        Self::Put,
        Self::Post,
        Self::Delete,
        Self::Options,
        Self::Head,
        Self::Patch,
        Self::Trace,
    ];

    /// Returns the upper-case verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
            Self::Trace => "TRACE",
        }
    }

    /// Returns the lower-case key used in schema path items.
    #[must_use]
    pub const fn schema_key(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Options => "options",
            Self::Head => "head",
            Self::Patch => "patch",
            Self::Trace => "trace",
        }
    }

    /// Returns whether the method carries a request body.
    #[must_use]
    pub const fn is_mutating(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when a path template is syntactically malformed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed path template '{template}': {reason}")]
pub struct PathTemplateError {
    /// Offending template.
    pub template: String,
    /// Human-readable reason.
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum SegmentPart {
    Literal(String),
    Placeholder(String),
}

/// Path template with named `{placeholder}` segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Vec<SegmentPart>>,
}

impl PathTemplate {
    /// Parses a template such as `/customers/{id}/orders`.
    ///
    /// # Errors
    ///
    /// Returns [`PathTemplateError`] for unbalanced braces or empty
    /// placeholder names.
    pub fn parse(template: impl Into<String>) -> Result<Self, PathTemplateError> {
        let raw = template.into();
        let mut segments = Vec::new();
        for segment in raw.split('/').filter(|segment| !segment.is_empty()) {
            segments.push(parse_segment(segment).map_err(|reason| PathTemplateError {
                template: raw.clone(),
                reason,
            })?);
        }
        Ok(Self { raw, segments })
    }

    /// Returns the template text as declared.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns placeholder names in order of appearance, without repeats.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for part in self.segments.iter().flatten() {
            if let SegmentPart::Placeholder(name) = part
                && !names.contains(&name.as_str())
            {
                names.push(name.as_str());
            }
        }
        names
    }

    /// Renders each segment, substituting placeholders with `lookup`.
    ///
    /// Returned segments are raw text; callers percent-encode them when
    /// pushing them onto a URL.
    ///
    /// # Errors
    ///
    /// Returns the name of the first placeholder for which `lookup` yields
    /// nothing.
    pub fn render_segments<'a>(
        &'a self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Vec<String>, &'a str> {
        self.segments
            .iter()
            .map(|parts| {
                let mut rendered = String::new();
                for part in parts {
                    match part {
                        SegmentPart::Literal(text) => rendered.push_str(text),
                        SegmentPart::Placeholder(name) => {
                            let value = lookup(name).ok_or(name.as_str())?;
                            rendered.push_str(&value);
                        }
                    }
                }
                Ok(rendered)
            })
            .collect()
    }

    /// Returns a template with `prefix` prepended, as for a Swagger `basePath`.
    #[must_use]
    pub fn with_prefix(&self, prefix: &str) -> Self {
        let trimmed = prefix.trim_end_matches('/');
        if trimmed.is_empty() {
            return self.clone();
        }
        let mut segments: Vec<Vec<SegmentPart>> = trimmed
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| vec![SegmentPart::Literal(segment.to_owned())])
            .collect();
        segments.extend(self.segments.iter().cloned());
        Self {
            raw: format!("{trimmed}{}", self.raw),
            segments,
        }
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.raw)
    }
}

fn parse_segment(segment: &str) -> Result<Vec<SegmentPart>, &'static str> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut characters = segment.chars();
    while let Some(character) = characters.next() {
        match character {
            '{' => {
                if !literal.is_empty() {
                    parts.push(SegmentPart::Literal(std::mem::take(&mut literal)));
                }
                let mut name = String::new();
                let mut closed = false;
                for inner in characters.by_ref() {
                    match inner {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => return Err("nested placeholder"),
                        other => name.push(other),
                    }
                }
                if !closed {
                    return Err("unclosed placeholder");
                }
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    return Err("empty placeholder name");
                }
                parts.push(SegmentPart::Placeholder(trimmed.to_owned()));
            }
            '}' => return Err("unbalanced closing brace"),
            other => literal.push(other),
        }
    }
    if !literal.is_empty() {
        parts.push(SegmentPart::Literal(literal));
    }
    Ok(parts)
}

/// How body parameters are assembled into the request payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyMode {
    /// Each top-level property is a separate body parameter.
    Fields,
    /// A single `body` parameter carries the whole payload.
    Whole,
}

/// Request body declared by a mutating operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    content_type: String,
    required: bool,
    mode: BodyMode,
    schema: Value,
}

impl RequestBody {
    /// Creates a request body description.
    #[must_use]
    pub fn new(content_type: impl Into<String>, required: bool, mode: BodyMode, schema: Value) -> Self {
        Self {
            content_type: content_type.into(),
            required,
            mode,
            schema,
        }
    }

    /// Returns the declared media type.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns whether the body itself is required.
    #[must_use]
    pub const fn required(&self) -> bool {
        self.required
    }

    /// Returns how parameters map onto the payload.
    #[must_use]
    pub const fn mode(&self) -> BodyMode {
        self.mode
    }

    /// Returns the resolved body schema.
    #[must_use]
    pub const fn schema(&self) -> &Value {
        &self.schema
    }
}

/// Declared response of an operation, kept as a shape hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHint {
    /// Status key as declared (`"200"`, `"4XX"`, `"default"`).
    pub status: String,
    /// Declared description.
    pub description: String,
    /// Whether a JSON body is declared.
    pub has_json_body: bool,
}

impl ResponseHint {
    /// Returns whether the hint describes a success response.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.starts_with('2')
    }
}

/// One REST endpoint compiled from a schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    operation_id: String,
    method: HttpMethod,
    path: PathTemplate,
    summary: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
    parameters: Vec<Parameter>,
    request_body: Option<RequestBody>,
    responses: Vec<ResponseHint>,
}

impl Operation {
    /// Creates an operation without parameters, body or responses.
    #[must_use]
    pub fn new(operation_id: impl Into<String>, method: HttpMethod, path: PathTemplate) -> Self {
        Self {
            operation_id: operation_id.into(),
            method,
            path,
            summary: None,
            description: None,
            tags: Vec::new(),
            parameters: Vec::new(),
            request_body: None,
            responses: Vec::new(),
        }
    }

    /// Sets summary and description text.
    #[must_use]
    pub fn with_documentation(mut self, summary: Option<String>, description: Option<String>) -> Self {
        self.summary = non_blank(summary);
        self.description = non_blank(description);
        self
    }

    /// Sets the declared tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Sets the ordered parameter list.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_request_body(mut self, request_body: Option<RequestBody>) -> Self {
        self.request_body = request_body;
        self
    }

    /// Sets the declared responses.
    #[must_use]
    pub fn with_responses(mut self, responses: Vec<ResponseHint>) -> Self {
        self.responses = responses;
        self
    }

    /// Returns the sanitized operation identifier.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Returns the path template.
    #[must_use]
    pub const fn path(&self) -> &PathTemplate {
        &self.path
    }

    /// Returns the summary.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Returns the long description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the declared tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns parameters in declared order.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Finds a parameter by argument name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|parameter| parameter.name() == name)
    }

    /// Returns parameters at one location in declared order.
    pub fn parameters_in(&self, location: ParameterLocation) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(move |parameter| parameter.location() == location)
    }

    /// Returns the request body, if any.
    #[must_use]
    pub const fn request_body(&self) -> Option<&RequestBody> {
        self.request_body.as_ref()
    }

    /// Returns the declared response hints.
    #[must_use]
    pub fn responses(&self) -> &[ResponseHint] {
        &self.responses
    }

    /// Builds the human-readable description used for the tool.
    ///
    /// Combines summary and description, falling back to `METHOD /path`, and
    /// lists path parameters.
    #[must_use]
    pub fn tool_description(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(summary) = self.summary() {
            parts.push(summary.to_owned());
        }
        if let Some(description) = self.description()
            && Some(description) != self.summary()
        {
            parts.push(description.to_owned());
        }
        if parts.is_empty() {
            parts.push(format!("{} {}", self.method, self.path));
        }

        let path_names: Vec<&str> = self
            .parameters_in(ParameterLocation::Path)
            .map(Parameter::name)
            .collect();
        if !path_names.is_empty() {
            parts.push(format!("Path parameters: {}", path_names.join(", ")));
        }
        parts.join(". ")
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool_registry::domain::ParameterType;
    use rstest::rstest;

    #[rstest]
    #[case("/customers/{id}", vec!["id"])]
    #[case("/files/{name}.json", vec!["name"])]
    #[case("/a/{x}/b/{y}/c/{x}", vec!["x", "y"])]
    #[case("/", vec![])]
    fn placeholders_are_listed_once_in_order(#[case] raw: &str, #[case] expected: Vec<&str>) {
        let template = PathTemplate::parse(raw).expect("valid template");
        assert_eq!(template.placeholders(), expected);
    }

    #[rstest]
    #[case("/customers/{id")]
    #[case("/customers/{}")]
    #[case("/customers/id}")]
    fn malformed_templates_are_rejected(#[case] raw: &str) {
        assert!(PathTemplate::parse(raw).is_err());
    }

    #[test]
    fn render_substitutes_within_segments() {
        let template = PathTemplate::parse("/files/{name}.json").expect("valid template");
        let segments = template
            .render_segments(|name| (name == "name").then(|| "report".to_owned()))
            .expect("all placeholders supplied");
        assert_eq!(segments, vec!["files".to_owned(), "report.json".to_owned()]);
    }

    #[test]
    fn render_reports_missing_placeholder() {
        let template = PathTemplate::parse("/customers/{id}").expect("valid template");
        assert_eq!(template.render_segments(|_| None), Err("id"));
    }

    #[test]
    fn prefix_is_prepended_to_template() {
        let template = PathTemplate::parse("/pets/{petId}").expect("valid template");
        let prefixed = template.with_prefix("/v1/");
        assert_eq!(prefixed.as_str(), "/v1/pets/{petId}");
        assert_eq!(prefixed.placeholders(), vec!["petId"]);
    }

    #[test]
    fn description_falls_back_to_method_and_path() {
        let operation = Operation::new(
            "getCustomer",
            HttpMethod::Get,
            PathTemplate::parse("/customers/{id}").expect("valid template"),
        )
        .with_parameters(vec![Parameter::new(
            "id",
            ParameterLocation::Path,
            ParameterType::String,
            true,
        )]);
        assert_eq!(
            operation.tool_description(),
            "GET /customers/{id}. Path parameters: id"
        );
    }

    #[test]
    fn description_skips_duplicate_summary() {
        let operation = Operation::new(
            "listCustomers",
            HttpMethod::Get,
            PathTemplate::parse("/customers").expect("valid template"),
        )
        .with_documentation(Some("List customers".to_owned()), Some("List customers".to_owned()));
        assert_eq!(operation.tool_description(), "List customers");
    }
}
