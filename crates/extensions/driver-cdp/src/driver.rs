//! [`BrowserDriver`] over CDP.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info};

use webpilot_config::{Config, ProfileStore};
use webpilot_protocols::{Action, ActionOutcome, BrowserDriver, DriverError};

use crate::cdp::{CdpError, PageSession};
use crate::locator::{self, Found, Locator};
use crate::manager::{BrowserError, BrowserManager, BrowserManagerConfig};

/// How long click, type and press look for their element.
pub const CANDIDATE_TIMEOUT: Duration = Duration::from_millis(5000);
/// How long `wait` looks for its element.
pub const WAIT_TIMEOUT: Duration = Duration::from_millis(10000);

const LOGIN_SETTLE: Duration = Duration::from_secs(3);
const SEARCH_SETTLE: Duration = Duration::from_secs(2);
const SUBMIT_TIMEOUT: Duration = Duration::from_millis(1000);
const DEFAULT_SCROLL_AMOUNT: u32 = 10;
const SCROLL_STEP: f64 = 100.0;

/// Prefix a bare host with `https://`.
pub fn with_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// True when `current_url` is already on `site`.
pub fn on_site(current_url: &str, site: &str) -> bool {
    let current = current_url.to_lowercase();
    let host = url::Url::parse(&with_scheme(site.trim()))
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()));
    match host {
        Some(host) if !host.is_empty() => current.contains(&host),
        _ => current.contains(&site.to_lowercase()),
    }
}

/// Wheel deltas for a scroll direction, or `None` if it is not one.
pub fn scroll_delta(direction: &str, amount: u32) -> Option<(f64, f64)> {
    let distance = amount as f64 * SCROLL_STEP;
    match direction.to_lowercase().as_str() {
        "up" => Some((0.0, -distance)),
        "down" => Some((0.0, distance)),
        "left" => Some((-distance, 0.0)),
        "right" => Some((distance, 0.0)),
        _ => None,
    }
}

/// Failure message prefix for an action, or `None` if this driver does
/// not run that kind of action.
fn failure_context(action: &Action) -> Option<String> {
    Some(match action {
        Action::Navigate { url } => format!("Failed to navigate to {}", url),
        Action::Click { element } => format!("Failed to click on {}", element),
        Action::Type { element, .. } => format!("Failed to type into {}", element),
        Action::Search { query, site } => format!("Failed to search for {} on {}", query, site),
        Action::Login { site, .. } => format!(
            "Failed to log into {}",
            site.as_deref().unwrap_or("the current page")
        ),
        Action::Scroll { element: Some(element), .. } => format!("Failed to scroll to {}", element),
        Action::Scroll { .. } => "Failed to scroll".to_string(),
        Action::Wait { element: Some(element), .. } => format!("Failed to wait for {}", element),
        Action::Wait { .. } => "Failed to wait".to_string(),
        Action::Press { key, .. } => format!("Failed to press {}", key),
        _ => return None,
    })
}

/// Level 1 driver: a Chromium-family browser controlled over CDP.
pub struct CdpDriver {
    manager: BrowserManager,
    slow_mo: Duration,
}

impl CdpDriver {
    pub fn new(config: BrowserManagerConfig, slow_mo_ms: u64) -> Self {
        Self {
            manager: BrowserManager::new(config),
            slow_mo: Duration::from_millis(slow_mo_ms),
        }
    }

    /// Driver for the configured browser, with its saved profile applied.
    pub fn from_config(config: &Config, profiles: &ProfileStore) -> Self {
        let profile = profiles.profile(&config.browser.name);
        Self::new(
            BrowserManagerConfig::from_config(config, &profile),
            config.browser.slow_mo,
        )
    }

    pub fn manager(&self) -> &BrowserManager {
        &self.manager
    }

    async fn run(&self, page: &PageSession, action: &Action) -> Result<ActionOutcome, CdpError> {
        match action {
            Action::Navigate { url } => self.navigate(page, url).await,
            Action::Click { element } => self.click(page, element).await,
            Action::Type { text, element } => self.type_text(page, text, element).await,
            Action::Search { query, site } => self.search(page, query, site).await,
            Action::Login {
                site,
                username,
                password,
            } => self.login(page, site.as_deref(), username, password).await,
            Action::Scroll {
                element,
                direction,
                amount,
            } => {
                self.scroll(page, element.as_deref(), direction.as_deref(), *amount)
                    .await
            }
            Action::Wait { element, seconds } => match element {
                Some(element) => self.wait_for(page, element).await,
                None => Ok(Self::pause(*seconds).await),
            },
            Action::Press { key, element } => self.press(page, key, element.as_deref()).await,
            other => Ok(ActionOutcome::unknown_action(other.kind())),
        }
    }

    async fn navigate(&self, page: &PageSession, url: &str) -> Result<ActionOutcome, CdpError> {
        let url = with_scheme(url);
        page.navigate(&url).await?;
        Ok(ActionOutcome::ok(format!("Navigated to {}", url)).with("title", page.title().await?))
    }

    async fn click(&self, page: &PageSession, element: &str) -> Result<ActionOutcome, CdpError> {
        let candidates = locator::click_candidates(element);
        let Some(found) = locator::find(page, &candidates, CANDIDATE_TIMEOUT, true).await? else {
            return Ok(ActionOutcome::fail(format!("Could not find element: {}", element)));
        };
        let (x, y) = found.center.unwrap_or_default();
        page.click(x, y).await?;
        Ok(ActionOutcome::ok(format!("Clicked on {}", element))
            .with("selector", found.locator.describe()))
    }

    async fn fill(&self, page: &PageSession, found: &Found, text: &str) -> Result<(), CdpError> {
        page.focus(found.node_id).await?;
        page.clear_input(&found.selector).await?;
        page.insert_text(text).await
    }

    async fn type_text(
        &self,
        page: &PageSession,
        text: &str,
        element: &str,
    ) -> Result<ActionOutcome, CdpError> {
        let candidates = locator::input_candidates(element);
        let Some(found) = locator::find(page, &candidates, CANDIDATE_TIMEOUT, true).await? else {
            return Ok(ActionOutcome::fail(format!("Could not find input field: {}", element)));
        };
        self.fill(page, &found, text).await?;
        Ok(ActionOutcome::ok(format!("Typed '{}' into {}", text, element))
            .with("selector", found.locator.describe()))
    }

    async fn search(&self, page: &PageSession, query: &str, site: &str) -> Result<ActionOutcome, CdpError> {
        if let Some(engine) = locator::search_engine(site) {
            page.navigate(engine.url).await?;
            let input = Locator::Css(engine.input.to_string());
            let found = locator::find(page, &[input], CANDIDATE_TIMEOUT, false)
                .await?
                .ok_or_else(|| CdpError::ElementNotFound(engine.input.to_string()))?;
            self.fill(page, &found, query).await?;
            page.press("Enter").await?;
            page.wait_for_selector(engine.results, WAIT_TIMEOUT).await?;
            return Ok(ActionOutcome::ok(format!("Searched for '{}' on {}", query, engine.name))
                .with("title", page.title().await?));
        }

        if !on_site(&page.url().await?, site) {
            page.navigate(&with_scheme(site)).await?;
        }
        let candidates = locator::css_candidates(locator::SEARCH_BOXES);
        let Some(found) = locator::find(page, &candidates, CANDIDATE_TIMEOUT, false).await? else {
            return Ok(ActionOutcome::fail(format!("Could not find a search box on {}", site)));
        };
        self.fill(page, &found, query).await?;
        page.press("Enter").await?;
        tokio::time::sleep(SEARCH_SETTLE).await;
        Ok(ActionOutcome::ok(format!("Searched for '{}' on {}", query, site))
            .with("title", page.title().await?))
    }

    async fn login(
        &self,
        page: &PageSession,
        site: Option<&str>,
        username: &str,
        password: &str,
    ) -> Result<ActionOutcome, CdpError> {
        if let Some(site) = site {
            if !on_site(&page.url().await?, site) {
                page.navigate(&with_scheme(site)).await?;
            }
        }

        let user_fields = locator::css_candidates(locator::USERNAME_FIELDS);
        let Some(user_field) = locator::find(page, &user_fields, CANDIDATE_TIMEOUT, false).await? else {
            return Ok(ActionOutcome::fail("Could not find username field"));
        };
        self.fill(page, &user_field, username).await?;

        let password_fields = locator::css_candidates(&[locator::PASSWORD_FIELD]);
        let Some(password_field) = locator::find(page, &password_fields, CANDIDATE_TIMEOUT, false).await?
        else {
            return Ok(ActionOutcome::fail("Could not find password field"));
        };
        self.fill(page, &password_field, password).await?;

        let submit = locator::find(page, &locator::submit_candidates(), SUBMIT_TIMEOUT, true).await?;
        match submit.and_then(|f| f.center) {
            Some((x, y)) => page.click(x, y).await?,
            None => {
                debug!("No submit control found, pressing Enter in the password field");
                page.focus(password_field.node_id).await?;
                page.press("Enter").await?;
            }
        }
        tokio::time::sleep(LOGIN_SETTLE).await;

        let shown = match site {
            Some(site) => site.to_string(),
            None => page.url().await?,
        };
        Ok(ActionOutcome::ok(format!("Logged into {} with username {}", shown, username))
            .with("title", page.title().await?))
    }

    async fn scroll(
        &self,
        page: &PageSession,
        element: Option<&str>,
        direction: Option<&str>,
        amount: Option<u32>,
    ) -> Result<ActionOutcome, CdpError> {
        if let Some(element) = element {
            let edge = match element.trim().to_lowercase().as_str() {
                "top" => Some("window.scrollTo(0, 0)"),
                "bottom" => Some("window.scrollTo(0, document.body.scrollHeight)"),
                _ => None,
            };
            if let Some(script) = edge {
                page.evaluate(script).await?;
                return Ok(ActionOutcome::ok(format!("Scrolled to {}", element)));
            }

            let candidates = locator::element_candidates(element);
            let Some(found) = locator::find(page, &candidates, CANDIDATE_TIMEOUT, false).await? else {
                return Ok(ActionOutcome::fail(format!("Could not find element: {}", element)));
            };
            page.scroll_into_view(&found.selector).await?;
            return Ok(ActionOutcome::ok(format!("Scrolled to {}", element))
                .with("selector", found.locator.describe()));
        }

        let Some(direction) = direction else {
            return Ok(ActionOutcome::fail("No scroll target or direction given"));
        };
        let amount = amount.unwrap_or(DEFAULT_SCROLL_AMOUNT);
        let Some((dx, dy)) = scroll_delta(direction, amount) else {
            return Ok(ActionOutcome::fail(format!("Unknown scroll direction: {}", direction)));
        };

        let viewport = page.evaluate("[window.innerWidth, window.innerHeight]").await?;
        let x = viewport[0].as_f64().unwrap_or(800.0) / 2.0;
        let y = viewport[1].as_f64().unwrap_or(600.0) / 2.0;
        page.scroll(x, y, dx, dy).await?;
        Ok(ActionOutcome::ok(format!("Scrolled {} by {}", direction, amount)))
    }

    async fn wait_for(&self, page: &PageSession, element: &str) -> Result<ActionOutcome, CdpError> {
        let candidates = locator::element_candidates(element);
        match locator::find(page, &candidates, WAIT_TIMEOUT, true).await? {
            Some(found) => Ok(ActionOutcome::ok(format!("Element {} is now visible", element))
                .with("selector", found.locator.describe())),
            None => Ok(ActionOutcome::fail(format!(
                "Element {} did not appear within the timeout",
                element
            ))),
        }
    }

    async fn pause(seconds: Option<f64>) -> ActionOutcome {
        let seconds = seconds.filter(|s| s.is_finite() && *s >= 0.0).unwrap_or(1.0);
        match Duration::try_from_secs_f64(seconds) {
            Ok(duration) => {
                tokio::time::sleep(duration).await;
                ActionOutcome::ok(format!("Waited for {} seconds", seconds))
            }
            Err(e) => ActionOutcome::fail(format!("Failed to wait: {}", e)),
        }
    }

    async fn press(
        &self,
        page: &PageSession,
        key: &str,
        element: Option<&str>,
    ) -> Result<ActionOutcome, CdpError> {
        let Some(element) = element else {
            page.press(key).await?;
            return Ok(ActionOutcome::ok(format!("Pressed {}", key)));
        };

        let candidates = locator::press_candidates(element);
        let Some(found) = locator::find(page, &candidates, CANDIDATE_TIMEOUT, true).await? else {
            return Ok(ActionOutcome::fail(format!("Could not find element: {}", element)));
        };
        page.focus(found.node_id).await?;
        page.press(key).await?;
        Ok(ActionOutcome::ok(format!("Pressed {} on {}", key, element))
            .with("selector", found.locator.describe()))
    }
}

#[async_trait]
impl BrowserDriver for CdpDriver {
    fn name(&self) -> &str {
        "cdp"
    }

    async fn execute_action(&self, action: &Action) -> Result<ActionOutcome, DriverError> {
        let Some(context) = failure_context(action) else {
            return Ok(ActionOutcome::unknown_action(action.kind()));
        };

        let outcome = if let Action::Wait {
            element: None,
            seconds,
        } = action
        {
            Self::pause(*seconds).await
        } else {
            let page = self.manager.page().await?;
            match self.run(&page, action).await {
                Ok(outcome) => outcome,
                Err(CdpError::SessionClosed) => {
                    return Err(BrowserError::NotConnected.into());
                }
                Err(e) => {
                    error!("{}: {}", context, e);
                    ActionOutcome::fail(format!("{}: {}", context, e))
                }
            }
        };

        if !self.slow_mo.is_zero() {
            tokio::time::sleep(self.slow_mo).await;
        }
        Ok(outcome)
    }

    async fn page_content(&self) -> Result<Option<String>, DriverError> {
        match self.manager.current_page().await {
            Some(page) => {
                let html = page.content().await.map_err(BrowserError::from)?;
                Ok(Some(html))
            }
            None => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.manager.shutdown().await?;
        info!("CDP driver closed");
        Ok(())
    }
}

impl std::fmt::Debug for CdpDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpDriver")
            .field("browser", &self.manager.config().browser)
            .field("slow_mo", &self.slow_mo)
            .finish()
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
