//! Per-test correlation storage bridging asynchronous capture and later
//! synchronous consumption.
//!
//! One store is constructed per test run and injected into every component
//! that needs it; cross-worker isolation comes from process separation, not
//! from this store.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::types::{
    CaptureError, CaptureField, CaptureResult, CapturedRecord, ExtractedFields, TestId,
    TokenRecord,
};

#[derive(Default)]
struct StoreInner {
    captures: HashMap<TestId, CapturedRecord>,
    tokens: HashMap<TestId, TokenRecord>,
}

/// Cloneable handle to the shared correlation state.
///
/// Two independent namespaces keyed by [`TestId`]: captured records and
/// tokens. Records are created lazily on first write; every write replaces the
/// stored snapshot with a merged copy, so the winning value for a field is
/// whichever write completed last (last-resolved-wins).
#[derive(Clone, Default)]
pub struct CorrelationStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl CorrelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one captured field for a test.
    ///
    /// An empty value never reaches the map: it is logged at the write site
    /// and dropped, matching the extractor's absence convention.
    pub async fn write(&self, test_id: &TestId, field: CaptureField, value: &str) {
        if let Err(e) = self.try_write(test_id, field, value).await {
            tracing::warn!("capture dropped for test {test_id}: {e}");
        }
    }

    async fn try_write(
        &self,
        test_id: &TestId,
        field: CaptureField,
        value: &str,
    ) -> CaptureResult<()> {
        if value.is_empty() {
            return Err(CaptureError::FieldNotCaptured { field });
        }
        let mut inner = self.inner.lock().await;
        let record = inner.captures.entry(test_id.clone()).or_default();
        *record = record.merge_field(field, value);
        tracing::debug!("captured {field} for test {test_id}");
        Ok(())
    }

    /// Persist every present extracted field independently, one write per
    /// field. Absent fields are skipped.
    pub async fn apply(&self, test_id: &TestId, extracted: &ExtractedFields) {
        for (field, value) in extracted.iter() {
            self.write(test_id, field, value).await;
        }
    }

    /// Read one captured field.
    ///
    /// Fails with [`CaptureError::FieldNotSet`] when no record exists for the
    /// test or the field is unset or empty. Never returns a default.
    pub async fn read(&self, test_id: &TestId, field: CaptureField) -> CaptureResult<String> {
        let inner = self.inner.lock().await;
        inner
            .captures
            .get(test_id)
            .and_then(|record| record.get(field))
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| CaptureError::FieldNotSet {
                test_id: test_id.clone(),
                field,
            })
    }

    /// True iff a captured record exists for the test, regardless of which
    /// fields are populated.
    pub async fn exists(&self, test_id: &TestId) -> bool {
        self.inner.lock().await.captures.contains_key(test_id)
    }

    /// Remove the whole captured record for a test. The token namespace is
    /// untouched.
    pub async fn clear(&self, test_id: &TestId) {
        if self.inner.lock().await.captures.remove(test_id).is_some() {
            tracing::info!("cleared captured record for test {test_id}");
        }
    }

    /// Copy of the current captured record, if any.
    pub async fn snapshot(&self, test_id: &TestId) -> Option<CapturedRecord> {
        self.inner.lock().await.captures.get(test_id).cloned()
    }

    /// Store a token for a test. Empty tokens are logged and dropped, like
    /// empty field values.
    pub async fn write_token(&self, test_id: &TestId, token: &str) {
        if token.is_empty() {
            tracing::warn!("token capture dropped for test {test_id}: empty value");
            return;
        }
        let mut inner = self.inner.lock().await;
        let record = inner.tokens.entry(test_id.clone()).or_default();
        record.token = Some(token.to_string());
        tracing::debug!("captured token for test {test_id}");
    }

    /// Read the token for a test, failing with [`CaptureError::TokenNotSet`]
    /// when absent or empty.
    pub async fn read_token(&self, test_id: &TestId) -> CaptureResult<String> {
        let inner = self.inner.lock().await;
        inner
            .tokens
            .get(test_id)
            .and_then(|record| record.token.as_deref())
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .ok_or_else(|| CaptureError::TokenNotSet {
                test_id: test_id.clone(),
            })
    }

    /// Remove the token record for a test. The captured-record namespace is
    /// untouched.
    pub async fn clear_token(&self, test_id: &TestId) {
        if self.inner.lock().await.tokens.remove(test_id).is_some() {
            tracing::info!("cleared token for test {test_id}");
        }
    }
}
