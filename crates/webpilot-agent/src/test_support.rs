//! Drivers and factories for agent tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use webpilot_protocols::{Action, ActionOutcome, BrowserDriver, DriverError};

use crate::driver::DriverFactory;

/// Records every action. Clicking `"missing"` fails, and `"crash"` is a
/// driver error.
#[derive(Clone)]
pub struct RecordingDriver {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    page: Mutex<Option<String>>,
    actions: Mutex<Vec<Action>>,
    closed: AtomicBool,
}

impl RecordingDriver {
    pub fn new(name: &str) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.to_string(),
                page: Mutex::new(None),
                actions: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn with_page(self, html: &str) -> Self {
        *self.inner.page.lock() = Some(html.to_string());
        self
    }

    pub fn actions(&self) -> Vec<Action> {
        self.inner.actions.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserDriver for RecordingDriver {
    fn name(&self) -> &str {
        &self.inner.name
    }

    async fn execute_action(&self, action: &Action) -> Result<ActionOutcome, DriverError> {
        self.inner.actions.lock().push(action.clone());
        match action {
            Action::Click { element } if element == "missing" => {
                Ok(ActionOutcome::fail(format!("Element not found: {}", element)))
            }
            Action::Click { element } if element == "crash" => Err(DriverError::NotConnected),
            Action::Navigate { url } => Ok(ActionOutcome::ok(format!("Navigated to {}", url)).with("url", url.clone())),
            other => Ok(ActionOutcome::ok(format!("{} done", other.kind()))),
        }
    }

    async fn page_content(&self) -> Result<Option<String>, DriverError> {
        Ok(self.inner.page.lock().clone())
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.inner.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out the same driver and counts how often it was asked.
pub struct StaticFactory {
    driver: RecordingDriver,
    created: AtomicUsize,
}

impl StaticFactory {
    pub fn new(driver: RecordingDriver) -> Self {
        Self {
            driver,
            created: AtomicUsize::new(0),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DriverFactory for StaticFactory {
    async fn create(&self) -> Result<Arc<dyn BrowserDriver>, DriverError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(self.driver.clone()))
    }
}
