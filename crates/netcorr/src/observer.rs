//! Response observation: one observer per (traffic source, test), routing
//! qualifying responses through extraction into the correlation store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::event::{ResponseEvent, TrafficSource};
use crate::extract::extract_fields;
use crate::store::CorrelationStore;
use crate::types::TestId;

/// Registration of one observer with a [`TrafficSource`].
///
/// Dispatch spawns the handling task before returning, so every event emitted
/// before a [`ResponseObserver::drain`] is guaranteed to be tracked by it.
/// Handles are plain [`JoinHandle`]s: dropping the hook detaches them, it
/// never cancels a handler that already started.
pub(crate) struct ObserverHook {
    test_id: TestId,
    store: CorrelationStore,
    active: AtomicBool,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl ObserverHook {
    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) async fn dispatch(&self, event: ResponseEvent) {
        if !self.is_active() {
            return;
        }
        let test_id = self.test_id.clone();
        let store = self.store.clone();
        let handle = tokio::spawn(handle_event(event, test_id, store));
        self.pending.lock().await.push(handle);
    }
}

/// Observes one page's network traffic for one test.
///
/// Attached for the duration of a test and detached on teardown or drop;
/// every qualifying response is handled as an independent unit of work, so
/// the observer never delays one event for another. Handlers already running
/// when the observer detaches run to completion.
pub struct ResponseObserver {
    hook: Arc<ObserverHook>,
}

impl ResponseObserver {
    /// Register with a traffic source for the given test.
    pub async fn attach(
        source: &TrafficSource,
        test_id: TestId,
        store: CorrelationStore,
    ) -> Self {
        let hook = Arc::new(ObserverHook {
            test_id: test_id.clone(),
            store,
            active: AtomicBool::new(true),
            pending: Mutex::new(Vec::new()),
        });
        source.register(hook.clone()).await;
        tracing::info!("observer attached for test {test_id}");
        Self { hook }
    }

    pub fn test_id(&self) -> &TestId {
        &self.hook.test_id
    }

    /// Await every in-flight capture, so teardown can assert on a quiescent
    /// store. Events dispatched while draining are awaited as well.
    pub async fn drain(&self) {
        loop {
            let batch = {
                let mut pending = self.hook.pending.lock().await;
                std::mem::take(&mut *pending)
            };
            if batch.is_empty() {
                break;
            }
            for handle in batch {
                if let Err(e) = handle.await {
                    tracing::error!("capture task failed: {e}");
                }
            }
        }
    }

    /// Stop admitting events. In-flight handlers are not cancelled.
    pub fn detach(&self) {
        if self.hook.active.swap(false, Ordering::AcqRel) {
            tracing::info!("observer detached for test {}", self.hook.test_id);
        }
    }
}

impl Drop for ResponseObserver {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Handle one response event: gate on status and content type, materialize
/// the body, extract, persist. Failures are logged and never propagate.
async fn handle_event(event: ResponseEvent, test_id: TestId, store: CorrelationStore) {
    if event.status != 200 || !event.is_json() {
        return;
    }
    let body = match event.body_json().await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(
                "ignoring unparseable response body for test {test_id} ({} {}): {e}",
                event.request.method,
                event.request.url
            );
            return;
        }
    };
    let extracted = extract_fields(&body, &event.request);
    if extracted.is_empty() {
        return;
    }
    store.apply(&test_id, &extracted).await;
}
