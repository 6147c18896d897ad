//! Stub drivers and a ready-made state for API tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use webpilot_agent::{BrowserAgent, DriverFactory};
use webpilot_config::{Config, ProfileStore};
use webpilot_protocols::{Action, ActionOutcome, BrowserDriver, DriverError};

use crate::state::{AppState, DriverPool};

#[derive(Clone, Default)]
pub struct StubDriver {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    actions: Mutex<Vec<Action>>,
    configs: Mutex<Vec<String>>,
    closed: AtomicUsize,
}

impl StubDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<Action> {
        self.inner.actions.lock().unwrap().clone()
    }

    /// Pool keys of the configs drivers were created for.
    pub fn configs(&self) -> Vec<String> {
        self.inner.configs.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserDriver for StubDriver {
    fn name(&self) -> &str {
        "stub"
    }

    async fn execute_action(&self, action: &Action) -> Result<ActionOutcome, DriverError> {
        self.inner.actions.lock().unwrap().push(action.clone());
        match action {
            Action::Click { element } if element == "missing" => {
                Ok(ActionOutcome::fail(format!("Element not found: {}", element)))
            }
            Action::Navigate { url } => Ok(ActionOutcome::ok(format!("Navigated to {}", url))),
            other => Ok(ActionOutcome::ok(format!("{} done", other.kind()))),
        }
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.inner.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct StubFactory {
    driver: StubDriver,
    key: Option<String>,
}

impl StubFactory {
    pub fn new(driver: StubDriver) -> Self {
        Self { driver, key: None }
    }

    pub fn for_config(driver: StubDriver, config: &Config) -> Self {
        let key = DriverPool::key(
            &config.browser.name,
            config.browser.headless,
            config.browser.slow_mo,
        );
        Self {
            driver,
            key: Some(key),
        }
    }
}

#[async_trait]
impl DriverFactory for StubFactory {
    async fn create(&self) -> Result<Arc<dyn BrowserDriver>, DriverError> {
        if let Some(key) = &self.key {
            self.driver.inner.configs.lock().unwrap().push(key.clone());
        }
        Ok(Arc::new(self.driver.clone()))
    }
}

pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.data_dir = Some(dir.path().join("data").to_string_lossy().into_owned());
    config.config_dir = Some(dir.path().join("config").to_string_lossy().into_owned());
    config
}

/// State whose agent and pool both act through `driver`.
pub async fn test_state(dir: &TempDir, driver: StubDriver) -> Arc<AppState> {
    let config = test_config(dir);
    let profiles = Arc::new(ProfileStore::new(config.profiles_dir()));
    let agent = BrowserAgent::with_factory(
        config.clone(),
        profiles.clone(),
        Arc::new(StubFactory::new(driver.clone())),
    )
    .await
    .unwrap();

    let pool = DriverPool::with_builder(config.clone(), profiles, move |config, _| {
        Arc::new(StubFactory::for_config(driver.clone(), &config))
    });
    Arc::new(AppState::with_driver_pool(config, Arc::new(agent), pool).unwrap())
}
