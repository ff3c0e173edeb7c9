//! Mapping of downstream outcomes onto tool results.

use super::{HttpOutcome, InvocationResult, ToolError, ToolErrorKind, UpstreamResponse};
use serde_json::Value;

/// Maximum number of characters of a downstream body quoted in errors.
pub const EXCERPT_CHARS: usize = 512;

/// Maps any outcome of a downstream call onto an [`InvocationResult`].
#[must_use]
pub fn map_outcome(outcome: HttpOutcome) -> InvocationResult {
    match outcome {
        HttpOutcome::Failed(failure) => InvocationResult::Failure(ToolError::new(
            ToolErrorKind::UpstreamUnreachable,
            failure.to_string(),
            None,
        )),
        HttpOutcome::Completed(response) => map_response(response),
    }
}

fn map_response(response: UpstreamResponse) -> InvocationResult {
    let status = response.status;
    if response.truncated {
        return malformed(status, "response body was truncated".to_owned());
    }
    match status {
        200..=299 => success_payload(&response.body).map_or_else(
            || malformed(status, "response body is neither JSON nor UTF-8 text".to_owned()),
            |payload| InvocationResult::Success { payload, status },
        ),
        400..=499 => InvocationResult::Failure(ToolError::new(
            ToolErrorKind::UpstreamRejected,
            format!(
                "upstream rejected the request with status {status}: {}",
                excerpt(&response.body)
            ),
            Some(status),
        )),
        500..=599 => InvocationResult::Failure(ToolError::new(
            ToolErrorKind::UpstreamFailure,
            format!(
                "upstream failed with status {status}: {}",
                excerpt(&response.body)
            ),
            Some(status),
        )),
        _ => malformed(status, format!("unexpected upstream status {status}")),
    }
}

/// Empty bodies become `null`, JSON is kept verbatim and other UTF-8 text
/// becomes a JSON string.
fn success_payload(body: &[u8]) -> Option<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Some(Value::Null);
    }
    serde_json::from_slice(body).ok().or_else(|| {
        std::str::from_utf8(body)
            .ok()
            .map(|text| Value::String(text.to_owned()))
    })
}

fn excerpt(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(EXCERPT_CHARS)
        .collect()
}

fn malformed(status: u16, message: String) -> InvocationResult {
    InvocationResult::Failure(ToolError::new(
        ToolErrorKind::MalformedUpstreamResponse,
        message,
        Some(status),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::domain::{TransportFailure, TransportFailureKind};
    use rstest::rstest;
    use serde_json::json;

    fn completed(status: u16, body: &[u8]) -> HttpOutcome {
        HttpOutcome::Completed(UpstreamResponse::new(status, body))
    }

    fn failure_kind(result: &InvocationResult) -> Option<ToolErrorKind> {
        match result {
            InvocationResult::Failure(error) => Some(error.kind),
            InvocationResult::Success { .. } => None,
        }
    }

    #[rstest]
    #[case(br#"{"id":"42","tags":[1,2.5,null]}"#.as_slice(), json!({"id": "42", "tags": [1, 2.5, null]}))]
    #[case(b"plain text".as_slice(), json!("plain text"))]
    #[case(b"".as_slice(), json!(null))]
    #[case(b"  \n".as_slice(), json!(null))]
    fn success_bodies_are_kept(#[case] body: &[u8], #[case] expected: Value) {
        assert_eq!(
            map_outcome(completed(200, body)),
            InvocationResult::Success {
                payload: expected,
                status: 200
            }
        );
    }

    #[rstest]
    #[case(completed(404, b"not found"), ToolErrorKind::UpstreamRejected)]
    #[case(completed(503, b"down"), ToolErrorKind::UpstreamFailure)]
    #[case(completed(302, b""), ToolErrorKind::MalformedUpstreamResponse)]
    #[case(completed(101, b""), ToolErrorKind::MalformedUpstreamResponse)]
    #[case(completed(200, &[0xff, 0xfe, 0x00]), ToolErrorKind::MalformedUpstreamResponse)]
    #[case(
        HttpOutcome::Completed(UpstreamResponse::new(200, b"{\"a\"".as_slice()).with_truncated_body()),
        ToolErrorKind::MalformedUpstreamResponse
    )]
    #[case(
        HttpOutcome::Failed(TransportFailure::new(TransportFailureKind::Timeout, "30s elapsed")),
        ToolErrorKind::UpstreamUnreachable
    )]
    fn error_outcomes_map_to_kinds(#[case] outcome: HttpOutcome, #[case] expected: ToolErrorKind) {
        assert_eq!(failure_kind(&map_outcome(outcome)), Some(expected));
    }

    #[test]
    fn rejection_excerpts_are_bounded() {
        let body = "x".repeat(2_000);
        let result = map_outcome(completed(400, body.as_bytes()));
        let InvocationResult::Failure(error) = result else {
            panic!("expected a failure");
        };
        let quoted = error.message.chars().filter(|character| *character == 'x').count();

        assert_eq!(error.status, Some(400));
        assert_eq!(quoted, EXCERPT_CHARS);
    }
}
