//! Lazily created browser driver.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::info;

use webpilot_config::{Config, DriverKind, ProfileStore};
use webpilot_driver_cdp::CdpDriver;
use webpilot_driver_native::NativeDriver;
use webpilot_protocols::{BrowserDriver, DriverError};

/// Builds the driver the agent acts through.
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn create(&self) -> Result<Arc<dyn BrowserDriver>, DriverError>;
}

/// Builds the driver named by `[browser] driver`.
#[derive(Debug, Clone)]
pub struct ConfigDriverFactory {
    config: Config,
    profiles: Arc<ProfileStore>,
}

impl ConfigDriverFactory {
    pub fn new(config: Config, profiles: Arc<ProfileStore>) -> Self {
        Self { config, profiles }
    }
}

#[async_trait]
impl DriverFactory for ConfigDriverFactory {
    async fn create(&self) -> Result<Arc<dyn BrowserDriver>, DriverError> {
        info!(
            "Creating {} driver for {}",
            self.config.browser.driver.as_str(),
            self.config.browser.name
        );
        let driver: Arc<dyn BrowserDriver> = match self.config.browser.driver {
            DriverKind::Cdp => Arc::new(CdpDriver::from_config(&self.config, &self.profiles)),
            DriverKind::Native => Arc::new(NativeDriver::from_config(&self.config, &self.profiles)),
        };
        Ok(driver)
    }
}

/// A driver created on first use and shared afterwards.
pub struct LazyDriver {
    factory: Arc<dyn DriverFactory>,
    driver: OnceCell<Arc<dyn BrowserDriver>>,
}

impl LazyDriver {
    pub fn new(factory: Arc<dyn DriverFactory>) -> Self {
        Self {
            factory,
            driver: OnceCell::new(),
        }
    }

    /// A handle over a driver that already exists.
    pub fn ready(driver: Arc<dyn BrowserDriver>) -> Self {
        Self {
            factory: Arc::new(Existing(driver.clone())),
            driver: OnceCell::new_with(Some(driver)),
        }
    }

    /// The driver, created now if this is the first call.
    pub async fn get(&self) -> Result<Arc<dyn BrowserDriver>, DriverError> {
        self.driver
            .get_or_try_init(|| self.factory.create())
            .await
            .cloned()
    }

    pub fn get_if_created(&self) -> Option<Arc<dyn BrowserDriver>> {
        self.driver.get().cloned()
    }

    /// Close the driver if it was ever created.
    pub async fn close(&self) -> Result<(), DriverError> {
        match self.driver.get() {
            Some(driver) => driver.close().await,
            None => Ok(()),
        }
    }
}

struct Existing(Arc<dyn BrowserDriver>);

#[async_trait]
impl DriverFactory for Existing {
    async fn create(&self) -> Result<Arc<dyn BrowserDriver>, DriverError> {
        Ok(self.0.clone())
    }
}

impl std::fmt::Debug for LazyDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyDriver")
            .field("created", &self.driver.initialized())
            .finish()
    }
}
