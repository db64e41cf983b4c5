//! netcorr: core capture library for test automation. Observes a page's
//! asynchronous network traffic, extracts backend-assigned identifiers and
//! credentials, and correlates them per logical test for later steps.

pub mod event;
pub mod extract;
pub mod observer;
pub mod secret;
pub mod store;
pub mod types;

pub use event::{RequestData, ResponseEvent, TrafficSource};
pub use extract::extract_fields;
pub use observer::ResponseObserver;
pub use secret::{decrypt, encrypt, SecretError};
pub use store::CorrelationStore;
pub use types::{
    CaptureError, CaptureField, CaptureResult, CapturedRecord, ExtractedFields, TestId,
    TokenRecord,
};
