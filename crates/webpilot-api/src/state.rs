//! Application state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use tracing::{info, warn};

use webpilot_agent::{BrowserAgent, ConfigDriverFactory, DriverFactory};
use webpilot_config::{Config, ProfileStore};
use webpilot_extractor::DataExtractor;
use webpilot_parser::CommandParser;
use webpilot_protocols::{BrowserDriver, DriverError};

use crate::error::ApiError;
use crate::websocket::WsConnectionManager;

type FactoryBuilder = dyn Fn(Config, Arc<ProfileStore>) -> Arc<dyn DriverFactory> + Send + Sync;

/// Drivers for the Level 1/2 endpoints, one per
/// `{browser}_{headless}_{slow_mo}` combination.
pub struct DriverPool {
    base: Config,
    profiles: Arc<ProfileStore>,
    builder: Box<FactoryBuilder>,
    drivers: DashMap<String, Arc<dyn BrowserDriver>>,
}

impl DriverPool {
    /// A pool building the driver kind named in `base.browser.driver`.
    pub fn new(base: Config, profiles: Arc<ProfileStore>) -> Self {
        Self::with_builder(base, profiles, |config, profiles| {
            Arc::new(ConfigDriverFactory::new(config, profiles))
        })
    }

    /// A pool that gets its drivers from `builder`.
    pub fn with_builder<F>(base: Config, profiles: Arc<ProfileStore>, builder: F) -> Self
    where
        F: Fn(Config, Arc<ProfileStore>) -> Arc<dyn DriverFactory> + Send + Sync + 'static,
    {
        Self {
            base,
            profiles,
            builder: Box::new(builder),
            drivers: DashMap::new(),
        }
    }

    pub fn key(browser: &str, headless: bool, slow_mo: u64) -> String {
        format!("{}_{}_{}", browser.to_lowercase(), headless, slow_mo)
    }

    /// The pooled driver for these settings, created if needed.
    pub async fn get(
        &self,
        browser: &str,
        headless: bool,
        slow_mo: u64,
    ) -> Result<Arc<dyn BrowserDriver>, DriverError> {
        let key = Self::key(browser, headless, slow_mo);
        if let Some(driver) = self.drivers.get(&key).map(|d| Arc::clone(d.value())) {
            return Ok(driver);
        }

        let mut config = self.base.clone();
        config.browser.name = browser.to_lowercase();
        config.browser.headless = headless;
        config.browser.slow_mo = slow_mo;
        let driver = (self.builder)(config, self.profiles.clone()).create().await?;
        info!("Created {} driver for {}", driver.name(), key);

        Ok(Arc::clone(self.drivers.entry(key).or_insert(driver).value()))
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// Close and forget every pooled driver.
    pub async fn close_all(&self) {
        let keys: Vec<String> = self.drivers.iter().map(|e| e.key().clone()).collect();
        for key in keys {
            if let Some((_, driver)) = self.drivers.remove(&key) {
                if let Err(e) = driver.close().await {
                    warn!("Failed to close driver {}: {}", key, e);
                }
            }
        }
    }
}

impl std::fmt::Debug for DriverPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverPool")
            .field("drivers", &self.drivers.len())
            .finish()
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: Config,
    pub parser: Arc<CommandParser>,
    pub drivers: DriverPool,
    pub extractor: DataExtractor,
    pub profiles: Arc<ProfileStore>,
    pub agent: Arc<BrowserAgent>,
    pub connections: WsConnectionManager,
    start_time: Instant,
    request_count: AtomicU64,
}

impl AppState {
    /// State sharing the agent's profile store and extractor.
    pub fn new(config: Config, agent: Arc<BrowserAgent>) -> Result<Self, ApiError> {
        let drivers = DriverPool::new(config.clone(), agent.profiles().clone());
        Self::with_driver_pool(config, agent, drivers)
    }

    pub fn with_driver_pool(
        config: Config,
        agent: Arc<BrowserAgent>,
        drivers: DriverPool,
    ) -> Result<Self, ApiError> {
        let parser = Arc::new(CommandParser::new(&config.llm)?);
        Ok(Self {
            parser,
            drivers,
            extractor: agent.executor().extractor().clone(),
            profiles: agent.profiles().clone(),
            agent,
            connections: WsConnectionManager::new(),
            config,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        })
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn increment_requests(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }
}
