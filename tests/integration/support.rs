//! Fake collaborators for driving the orchestrator without a network

use async_trait::async_trait;
use galleria::browser::{Browser, PageQuery, ResponseEvent, WaitCondition};
use galleria::config::Config;
use galleria::retrieve::{FileTransfer, TransferError, TransferOptions};
use galleria::GalleriaError;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// What the next navigation to an address does
#[derive(Debug, Clone, Copy)]
pub enum NavStep {
    Load,
    Timeout,
    /// Driver failure
    Crash,
    /// HTTP 404 on the document
    Reject,
}

/// Canned content for one address
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub events: Vec<ResponseEvent>,
    pub title: Option<String>,
    pub image_sources: Vec<String>,
    /// Successive height readings; the last one repeats
    pub heights: Vec<u64>,
}

impl FakePage {
    /// A page whose only response is a JSON body listing `images`
    pub fn with_images(title: &str, images: &[&str]) -> Self {
        Self {
            events: vec![ResponseEvent {
                url: "https://www.example.com/api/detail".to_string(),
                content_type: "application/json".to_string(),
                body: serde_json::json!({ "data": { "images": images } }).to_string(),
            }],
            title: Some(title.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Default)]
pub struct FakeBrowser {
    pages: HashMap<String, FakePage>,
    steps: Mutex<HashMap<String, VecDeque<NavStep>>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<ResponseEvent>>>,
    current: Mutex<Option<FakePage>>,
    heights: Mutex<VecDeque<u64>>,
    pub navigations: Mutex<Vec<(String, WaitCondition, Instant)>>,
    pub scrolls: AtomicU32,
    pub hovers: Mutex<Vec<String>>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, address: &str, page: FakePage) -> Self {
        self.pages.insert(address.to_string(), page);
        self
    }

    pub fn steps(self, address: &str, steps: &[NavStep]) -> Self {
        self.steps
            .lock()
            .unwrap()
            .insert(address.to_string(), steps.iter().copied().collect());
        self
    }

    pub fn navigation_count(&self) -> usize {
        self.navigations.lock().unwrap().len()
    }

    fn loaded(&self) -> Result<FakePage, GalleriaError> {
        self.current
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| GalleriaError::Browser("no page loaded".to_string()))
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<ResponseEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    async fn navigate(
        &self,
        url: &str,
        wait: WaitCondition,
        timeout: Duration,
    ) -> Result<(), GalleriaError> {
        self.navigations
            .lock()
            .unwrap()
            .push((url.to_string(), wait, Instant::now()));

        let step = self
            .steps
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or(NavStep::Load);

        match step {
            NavStep::Load => {}
            NavStep::Timeout => {
                return Err(GalleriaError::NavigationTimeout {
                    url: url.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
            NavStep::Crash => return Err(GalleriaError::Browser("target crashed".to_string())),
            NavStep::Reject => {
                return Err(GalleriaError::Validation {
                    url: url.to_string(),
                    reason: "HTTP 404".to_string(),
                })
            }
        }

        let page = self.pages.get(url).cloned().unwrap_or_default();
        let heights = if page.heights.is_empty() {
            vec![1000]
        } else {
            page.heights.clone()
        };
        *self.heights.lock().unwrap() = heights.into_iter().collect();

        self.subscribers
            .lock()
            .unwrap()
            .retain(|tx| page.events.iter().all(|e| tx.send(e.clone()).is_ok()));
        *self.current.lock().unwrap() = Some(page);

        Ok(())
    }

    async fn evaluate(&self, query: PageQuery) -> Result<Value, GalleriaError> {
        let page = self.loaded()?;
        Ok(match query {
            PageQuery::Title => page.title.map(Value::String).unwrap_or(Value::Null),
            PageQuery::ImageSources => {
                Value::Array(page.image_sources.into_iter().map(Value::String).collect())
            }
        })
    }

    async fn scroll_to_bottom(&self) -> Result<(), GalleriaError> {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn measure_page_height(&self) -> Result<u64, GalleriaError> {
        let mut heights = self.heights.lock().unwrap();
        let height = heights.front().copied().unwrap_or(0);
        if heights.len() > 1 {
            heights.pop_front();
        }
        Ok(height)
    }

    async fn hover(&self, selector: &str) -> Result<bool, GalleriaError> {
        self.hovers.lock().unwrap().push(selector.to_string());
        Ok(selector == "body")
    }
}

/// Writes a few bytes for every URL and remembers what it fetched
#[derive(Default)]
pub struct FakeTransfer {
    pub fetched: Mutex<Vec<String>>,
}

#[async_trait]
impl FileTransfer for FakeTransfer {
    async fn fetch_to_file(
        &self,
        url: &str,
        dest: &Path,
        _options: &TransferOptions,
    ) -> Result<u64, TransferError> {
        self.fetched.lock().unwrap().push(url.to_string());
        std::fs::write(dest, b"image").map_err(|e| TransferError::StreamError(e.to_string()))?;
        Ok(5)
    }
}

/// Fast config writing under `root`
pub fn create_test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.retrieval.download_root = root.display().to_string();
    config.retrieval.min_pacing_ms = 0;
    config.retrieval.max_pacing_ms = 0;
    config.crawl.settle_delay_ms = 0;
    config.crawl.scroll_delay_ms = 0;
    config.crawl.retry_attempts = 3;
    config.crawl.retry_base_delay_ms = 2000;
    config
}
