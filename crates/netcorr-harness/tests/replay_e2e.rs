//! End-to-end replay tests for netcorr-harness.
//!
//! Exercise the whole pipeline: recorded session file -> traffic source ->
//! observer -> correlation store -> step-side reads.

use std::collections::HashMap;
use std::io::Write;

use chrono::Utc;

use netcorr::{CaptureError, CaptureField, CorrelationStore, TestId};
use netcorr_harness::replay::{run_session, RecordedExchange, RecordedSession};

fn json_exchange(status: u16, body: &str) -> RecordedExchange {
    RecordedExchange {
        method: "POST".to_string(),
        url: "https://api.example.test/prequalification".to_string(),
        request_headers: HashMap::from([(
            "Authorization".to_string(),
            "Bearer e2e-token".to_string(),
        )]),
        status,
        response_headers: HashMap::from([(
            "content-type".to_string(),
            "application/json; charset=utf-8".to_string(),
        )]),
        body: body.to_string(),
        body_latency_ms: 0,
    }
}

fn session_with(exchanges: Vec<RecordedExchange>) -> RecordedSession {
    RecordedSession {
        test_id: "e2e-test".to_string(),
        recorded_at: Utc::now(),
        exchanges,
    }
}

#[tokio::test]
async fn replay_file_roundtrip_populates_every_field() {
    let session = session_with(vec![
        json_exchange(
            200,
            r#"{"preQualificationId":"PQ-9","applicants":[{"applicantId":"A"},{"applicantId":"B"}]}"#,
        ),
        // Irrelevant traffic on the same page must not disturb the capture.
        json_exchange(204, ""),
        json_exchange(200, "<html>not json</html>"),
    ]);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(serde_json::to_string_pretty(&session).unwrap().as_bytes())
        .unwrap();
    let loaded = RecordedSession::from_file(file.path()).unwrap();

    let store = CorrelationStore::new();
    let record = run_session(&loaded, &store).await.unwrap();

    assert_eq!(record.pre_qualification_id.as_deref(), Some("PQ-9"));
    assert_eq!(record.applicant_id.as_deref(), Some("A"));
    assert_eq!(record.co_applicant_id.as_deref(), Some("B"));
    assert_eq!(record.authorization_header.as_deref(), Some("Bearer e2e-token"));

    // Later test steps read by the same id the session declared.
    let test_id = TestId::new("e2e-test");
    assert_eq!(
        store
            .read(&test_id, CaptureField::AuthorizationHeader)
            .await
            .unwrap(),
        "Bearer e2e-token"
    );
}

#[tokio::test]
async fn replay_then_teardown_clears_only_the_session_record() {
    let store = CorrelationStore::new();
    let test_id = TestId::new("e2e-test");

    // A login step stashed a token before the traffic was replayed.
    store.write_token(&test_id, "tok-login").await;

    let session = session_with(vec![json_exchange(
        200,
        r#"{"applicants":[{"applicantId":"A"}]}"#,
    )]);
    run_session(&session, &store).await.unwrap();

    store.clear(&test_id).await;
    assert!(!store.exists(&test_id).await);
    assert!(matches!(
        store
            .read(&test_id, CaptureField::ApplicantId)
            .await
            .unwrap_err(),
        CaptureError::FieldNotSet { .. }
    ));
    assert_eq!(store.read_token(&test_id).await.unwrap(), "tok-login");
}

#[tokio::test]
async fn replay_preserves_recorded_arrival_order() {
    let mut early_issue_late_arrival =
        json_exchange(200, r#"{"preQualificationId":"PQ-LATE-ARRIVAL"}"#);
    early_issue_late_arrival.body_latency_ms = 50;
    let late_issue_early_arrival =
        json_exchange(200, r#"{"preQualificationId":"PQ-EARLY-ARRIVAL"}"#);

    let store = CorrelationStore::new();
    let record = run_session(
        &session_with(vec![early_issue_late_arrival, late_issue_early_arrival]),
        &store,
    )
    .await
    .unwrap();

    // Last-resolved-wins: the body that finished parsing last holds the field.
    assert_eq!(
        record.pre_qualification_id.as_deref(),
        Some("PQ-LATE-ARRIVAL")
    );
}
