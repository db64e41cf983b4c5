//! Core data types for captured fields and per-test correlation records.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Logical identifier correlating all captures and credentials of one test case.
///
/// Opaque to the store; two workers may reuse the same value without collision
/// only because each worker process owns a disjoint store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestId(String);

impl TestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random test identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TestId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// The named fields a capture can populate on a [`CapturedRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaptureField {
    PreQualificationId,
    ApplicantId,
    CoApplicantId,
    AuthorizationHeader,
}

impl CaptureField {
    pub const ALL: [CaptureField; 4] = [
        CaptureField::PreQualificationId,
        CaptureField::ApplicantId,
        CaptureField::CoApplicantId,
        CaptureField::AuthorizationHeader,
    ];

    /// Store-facing field name. The identifier fields match the JSON keys
    /// the backend emits; `authorizationHeader` names the captured request
    /// header.
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureField::PreQualificationId => "preQualificationId",
            CaptureField::ApplicantId => "applicantId",
            CaptureField::CoApplicantId => "coApplicantId",
            CaptureField::AuthorizationHeader => "authorizationHeader",
        }
    }
}

impl fmt::Display for CaptureField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields pulled out of a single observed exchange.
///
/// A `None` field means "absent on this response", which is never an error;
/// the extractor skips it and the store is not written for that field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub pre_qualification_id: Option<String>,
    pub applicant_id: Option<String>,
    pub co_applicant_id: Option<String>,
    pub authorization_header: Option<String>,
}

impl ExtractedFields {
    /// True when no field of interest was present on the exchange.
    pub fn is_empty(&self) -> bool {
        self.pre_qualification_id.is_none()
            && self.applicant_id.is_none()
            && self.co_applicant_id.is_none()
            && self.authorization_header.is_none()
    }

    /// Iterate the fields that were present, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (CaptureField, &str)> {
        [
            (
                CaptureField::PreQualificationId,
                self.pre_qualification_id.as_deref(),
            ),
            (CaptureField::ApplicantId, self.applicant_id.as_deref()),
            (CaptureField::CoApplicantId, self.co_applicant_id.as_deref()),
            (
                CaptureField::AuthorizationHeader,
                self.authorization_header.as_deref(),
            ),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
    }
}

/// Immutable snapshot of everything captured for one test so far.
///
/// Writes never mutate a snapshot in place; the store replaces the previous
/// snapshot with the result of [`CapturedRecord::merge`], which makes the
/// last-resolved-wins policy explicit and testable without an event source.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedRecord {
    pub pre_qualification_id: Option<String>,
    pub applicant_id: Option<String>,
    pub co_applicant_id: Option<String>,
    pub authorization_header: Option<String>,
}

impl CapturedRecord {
    pub fn get(&self, field: CaptureField) -> Option<&str> {
        match field {
            CaptureField::PreQualificationId => self.pre_qualification_id.as_deref(),
            CaptureField::ApplicantId => self.applicant_id.as_deref(),
            CaptureField::CoApplicantId => self.co_applicant_id.as_deref(),
            CaptureField::AuthorizationHeader => self.authorization_header.as_deref(),
        }
    }

    /// Return a new snapshot with one field overwritten.
    pub fn merge_field(&self, field: CaptureField, value: &str) -> Self {
        let mut next = self.clone();
        let slot = match field {
            CaptureField::PreQualificationId => &mut next.pre_qualification_id,
            CaptureField::ApplicantId => &mut next.applicant_id,
            CaptureField::CoApplicantId => &mut next.co_applicant_id,
            CaptureField::AuthorizationHeader => &mut next.authorization_header,
        };
        *slot = Some(value.to_string());
        next
    }

    /// Return a new snapshot with every present extracted field overwritten.
    /// Absent extracted fields leave the previous value untouched.
    pub fn merge(&self, extracted: &ExtractedFields) -> Self {
        extracted
            .iter()
            .fold(self.clone(), |acc, (field, value)| acc.merge_field(field, value))
    }
}

/// Credential captured for one test, in a namespace independent from
/// [`CapturedRecord`]. Plaintext in memory for the process lifetime.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token: Option<String>,
}

/// Errors surfaced by the capture subsystem.
#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    /// A read found no record, or the record exists but the field is unset or
    /// empty. Fatal to the consuming test step.
    #[error("field {field} is not set for test {test_id}")]
    FieldNotSet { test_id: TestId, field: CaptureField },

    /// No token has been captured for the test.
    #[error("no token is set for test {test_id}")]
    TokenNotSet { test_id: TestId },

    /// A write was attempted with an empty value. Caught and logged at the
    /// write site, never propagated to callers.
    #[error("empty value for field {field}")]
    FieldNotCaptured { field: CaptureField },
}

/// Convenience result type.
pub type CaptureResult<T> = Result<T, CaptureError>;
