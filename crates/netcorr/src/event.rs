//! Network traffic events: one [`ResponseEvent`] per completed HTTP exchange,
//! fanned out to attached observers by a [`TrafficSource`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::observer::ObserverHook;

/// The request that produced a response, with its outbound headers.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RequestData {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
}

impl RequestData {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        lookup_header(&self.headers, name)
    }
}

/// One completed HTTP exchange as seen by the page's network instrumentation.
///
/// The body is materialized lazily via [`ResponseEvent::body_json`]; that call
/// is the only suspension point in response handling, so field values in the
/// store reflect body-arrival order, not request-issue order.
#[derive(Clone, Debug)]
pub struct ResponseEvent {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub request: RequestData,
    body: Vec<u8>,
    body_delay: Option<Duration>,
}

impl ResponseEvent {
    pub fn new(
        status: u16,
        headers: HashMap<String, String>,
        request: RequestData,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            status,
            headers,
            request,
            body: body.into(),
            body_delay: None,
        }
    }

    /// Delay body materialization, reproducing the arrival order of recorded
    /// traffic. Replay sources use this; live sources leave it unset.
    pub fn with_body_delay(mut self, delay: Duration) -> Self {
        self.body_delay = Some(delay);
        self
    }

    /// Case-insensitive response header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        lookup_header(&self.headers, name)
    }

    /// True when the response content-type indicates a JSON body.
    pub fn is_json(&self) -> bool {
        self.header("content-type")
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false)
    }

    /// Materialize the response body as JSON.
    pub async fn body_json(&self) -> Result<Value, serde_json::Error> {
        if let Some(delay) = self.body_delay {
            tokio::time::sleep(delay).await;
        }
        serde_json::from_slice(&self.body)
    }
}

fn lookup_header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Fan-out point for a page's "response received" events.
///
/// Observers register through [`ResponseObserver::attach`]; each emitted event
/// is handed to every still-attached observer, which spawns its own handling
/// task before `emit` returns. Detached observers are pruned on the next emit.
///
/// [`ResponseObserver::attach`]: crate::observer::ResponseObserver::attach
#[derive(Clone, Default)]
pub struct TrafficSource {
    hooks: Arc<Mutex<Vec<Arc<ObserverHook>>>>,
}

impl TrafficSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one response event to every attached observer.
    pub async fn emit(&self, event: ResponseEvent) {
        // Snapshot the active hooks so the registry lock is not held across
        // dispatch suspension points.
        let active = {
            let mut hooks = self.hooks.lock().await;
            hooks.retain(|hook| hook.is_active());
            hooks.clone()
        };
        for hook in active {
            hook.dispatch(event.clone()).await;
        }
    }

    /// Number of currently attached observers.
    pub async fn observer_count(&self) -> usize {
        let mut hooks = self.hooks.lock().await;
        hooks.retain(|hook| hook.is_active());
        hooks.len()
    }

    pub(crate) async fn register(&self, hook: Arc<ObserverHook>) {
        self.hooks.lock().await.push(hook);
    }
}
