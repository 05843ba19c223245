//! Response tap
//!
//! Feeds every observed network response into the extraction engine from a
//! background task while the orchestrator drives the page.

use crate::browser::ResponseEvent;
use crate::extract::ExtractionEngine;
use crate::url::{target_id_from_payload, UNKNOWN_TARGET};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// What the tap saw before it stopped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TapSummary {
    /// Responses fed into the engine
    pub responses: usize,

    /// Product id found in a payload, looked for only when the address had none
    pub discovered_target_id: Option<String>,
}

impl TapSummary {
    fn record(&mut self, engine: &ExtractionEngine, event: &ResponseEvent, target_id: &str) {
        self.responses += 1;
        feed(engine, event, target_id);

        if target_id == UNKNOWN_TARGET && self.discovered_target_id.is_none() {
            self.discovered_target_id = discover_target_id(event);
            if let Some(id) = &self.discovered_target_id {
                tracing::info!("Found product id {} in response from {}", id, event.url);
            }
        }
    }
}

/// Handle to a running tap task
#[derive(Debug)]
pub struct ResponseTap {
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<TapSummary>>,
}

impl ResponseTap {
    /// Spawns a task draining `events` into `engine` under `target_id`
    pub fn start(
        mut events: mpsc::UnboundedReceiver<ResponseEvent>,
        engine: ExtractionEngine,
        target_id: String,
    ) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut summary = TapSummary::default();

            loop {
                tokio::select! {
                    biased;
                    event = events.recv() => match event {
                        Some(event) => summary.record(&engine, &event, &target_id),
                        None => break,
                    },
                    _ = &mut stop_rx => break,
                }
            }

            // Anything already queued still counts
            while let Ok(event) = events.try_recv() {
                summary.record(&engine, &event, &target_id);
            }

            summary
        });

        Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Stops the tap after draining queued events
    ///
    /// # Returns
    ///
    /// The number of responses processed and any product id discovered
    pub async fn stop(mut self) -> TapSummary {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }

        match self.handle.take() {
            Some(handle) => match handle.await {
                Ok(summary) => summary,
                Err(e) => {
                    tracing::warn!("Response tap ended abnormally: {}", e);
                    TapSummary::default()
                }
            },
            None => TapSummary::default(),
        }
    }
}

impl Drop for ResponseTap {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

fn feed(engine: &ExtractionEngine, event: &ResponseEvent, target_id: &str) {
    if engine.extract_response(&event.content_type, &event.body, Some(target_id)) {
        tracing::debug!("New image URLs in response from {}", event.url);
    }
}

fn discover_target_id(event: &ResponseEvent) -> Option<String> {
    let value: Value = serde_json::from_str(&event.body).ok()?;
    target_id_from_payload(&value)
}
