use super::{Eip1193Provider, ProviderEvent};
use crate::error::ProviderError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use tokio::sync::broadcast;

type Handler = dyn Fn(&str, &Value) -> Result<Value, ProviderError> + Send + Sync;

/// In-memory provider answering requests through a closure.
///
/// Records every request and lets the caller push wallet notifications,
/// which makes it suitable for dry runs and for exercising session and
/// transaction flows without a chain.
pub struct ScriptedProvider {
    handler: Box<Handler>,
    requests: Mutex<Vec<(String, Value)>>,
    events: broadcast::Sender<ProviderEvent>,
}

impl ScriptedProvider {
    pub fn new(
        handler: impl Fn(&str, &Value) -> Result<Value, ProviderError> + Send + Sync + 'static,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            events,
        }
    }

    /// Pushes a notification to every subscriber.
    pub fn emit(&self, event: ProviderEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    /// Methods requested so far, in order.
    pub fn methods(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.iter().map(|(m, _)| m.clone()).collect())
            .unwrap_or_default()
    }

    /// Requests recorded for one method.
    pub fn requests_for(&self, method: &str) -> Vec<Value> {
        self.requests
            .lock()
            .map(|r| {
                r.iter()
                    .filter(|(m, _)| m == method)
                    .map(|(_, p)| p.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Eip1193Provider for ScriptedProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((method.to_string(), params.clone()));
        }
        (self.handler)(method, &params)
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
