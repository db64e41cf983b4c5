//! Recorded-traffic replay: feed recorded HTTP exchanges through a traffic
//! source and observer, then report what was captured.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use netcorr::{
    CapturedRecord, CorrelationStore, RequestData, ResponseEvent, ResponseObserver, TestId,
    TrafficSource,
};

/// Errors while loading or running a recorded session.
#[derive(thiserror::Error, Debug)]
pub enum ReplayError {
    #[error("failed to read replay file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse replay file: {0}")]
    Json(#[from] serde_json::Error),
}

/// One recorded HTTP exchange.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordedExchange {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub request_headers: HashMap<String, String>,
    pub status: u16,
    #[serde(default)]
    pub response_headers: HashMap<String, String>,
    #[serde(default)]
    pub body: String,
    /// Milliseconds from response-received to body availability, reproducing
    /// the arrival order observed when the session was recorded.
    #[serde(default)]
    pub body_latency_ms: u64,
}

impl RecordedExchange {
    fn into_event(self) -> ResponseEvent {
        let request = RequestData {
            method: self.method,
            url: self.url,
            headers: self.request_headers,
        };
        let event = ResponseEvent::new(self.status, self.response_headers, request, self.body);
        if self.body_latency_ms > 0 {
            event.with_body_delay(Duration::from_millis(self.body_latency_ms))
        } else {
            event
        }
    }
}

/// A recorded test session: one test id plus its network traffic in emission
/// order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordedSession {
    pub test_id: String,
    pub recorded_at: DateTime<Utc>,
    pub exchanges: Vec<RecordedExchange>,
}

impl RecordedSession {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Replay a recorded session against a store and return the resulting
/// captured record, if any exchange produced one.
///
/// The observer is drained before reading, so the returned snapshot is
/// quiescent, and detached before returning.
pub async fn run_session(
    session: &RecordedSession,
    store: &CorrelationStore,
) -> Option<CapturedRecord> {
    let source = TrafficSource::new();
    let test_id = TestId::new(&session.test_id);
    let observer = ResponseObserver::attach(&source, test_id.clone(), store.clone()).await;

    tracing::info!(
        "replaying {} exchanges for test {test_id}",
        session.exchanges.len()
    );
    for exchange in &session.exchanges {
        source.emit(exchange.clone().into_event()).await;
    }
    observer.drain().await;
    observer.detach();

    store.snapshot(&test_id).await
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn session(exchanges: Vec<RecordedExchange>) -> RecordedSession {
        RecordedSession {
            test_id: "replay-test".to_string(),
            recorded_at: Utc::now(),
            exchanges,
        }
    }

    fn exchange(status: u16, body: &str) -> RecordedExchange {
        RecordedExchange {
            method: "POST".to_string(),
            url: "https://api.example.test/prequalification".to_string(),
            request_headers: HashMap::from([(
                "Authorization".to_string(),
                "Bearer rec".to_string(),
            )]),
            status,
            response_headers: HashMap::from([(
                "content-type".to_string(),
                "application/json".to_string(),
            )]),
            body: body.to_string(),
            body_latency_ms: 0,
        }
    }

    #[tokio::test]
    async fn test_run_session_populates_store() {
        let store = CorrelationStore::new();
        let record = run_session(
            &session(vec![
                exchange(200, r#"{"preQualificationId":"PQ-1"}"#),
                exchange(200, r#"{"applicants":[{"applicantId":"A"}]}"#),
                exchange(500, r#"{"applicants":[{"applicantId":"IGNORED"}]}"#),
            ]),
            &store,
        )
        .await
        .unwrap();

        assert_eq!(record.pre_qualification_id.as_deref(), Some("PQ-1"));
        assert_eq!(record.applicant_id.as_deref(), Some("A"));
        assert_eq!(record.authorization_header.as_deref(), Some("Bearer rec"));
        assert_eq!(record.co_applicant_id, None);
    }

    #[tokio::test]
    async fn test_run_session_with_no_qualifying_traffic() {
        let store = CorrelationStore::new();
        let record = run_session(&session(vec![exchange(404, "{}")]), &store).await;
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_body_latency_reproduces_arrival_order() {
        let store = CorrelationStore::new();
        let mut slow = exchange(200, r#"{"preQualificationId":"PQ-SLOW"}"#);
        slow.body_latency_ms = 60;
        let fast = exchange(200, r#"{"preQualificationId":"PQ-FAST"}"#);

        let record = run_session(&session(vec![slow, fast]), &store)
            .await
            .unwrap();
        assert_eq!(record.pre_qualification_id.as_deref(), Some("PQ-SLOW"));
    }

    #[tokio::test]
    async fn test_from_file_parses_recorded_session() {
        let recorded = session(vec![exchange(200, r#"{"preQualificationId":"PQ-1"}"#)]);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&recorded).unwrap().as_bytes())
            .unwrap();

        let loaded = RecordedSession::from_file(file.path()).unwrap();
        assert_eq!(loaded.test_id, "replay-test");
        assert_eq!(loaded.exchanges.len(), 1);
        assert_eq!(loaded.exchanges[0].status, 200);
    }

    #[test]
    fn test_from_file_rejects_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();
        assert!(matches!(
            RecordedSession::from_file(file.path()),
            Err(ReplayError::Json(_))
        ));
    }
}
