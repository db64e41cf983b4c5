//! Pure field extraction from an observed exchange.
//!
//! No side effects and no error state beyond "field absent": a missing key, a
//! missing array, an out-of-range index, or a non-string value all yield an
//! absent field, never a failure.

use serde_json::Value;

use crate::event::RequestData;
use crate::types::ExtractedFields;

/// Map a response body and its originating request onto the fields of
/// interest.
///
/// The authorization header comes from the *request* that produced the
/// response; response headers are never consulted here.
pub fn extract_fields(body: &Value, request: &RequestData) -> ExtractedFields {
    ExtractedFields {
        pre_qualification_id: string_field(body, "preQualificationId"),
        applicant_id: applicant_at(body, 0),
        co_applicant_id: applicant_at(body, 1),
        authorization_header: request.header("authorization").map(str::to_string),
    }
}

fn string_field(body: &Value, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(str::to_string)
}

fn applicant_at(body: &Value, index: usize) -> Option<String> {
    body.get("applicants")
        .and_then(Value::as_array)
        .and_then(|applicants| applicants.get(index))
        .and_then(|applicant| applicant.get("applicantId"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
