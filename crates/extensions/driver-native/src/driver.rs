//! [`BrowserDriver`] over OS-level input.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use webpilot_config::{Config, ProfileStore};
use webpilot_protocols::{Action, ActionOutcome, BrowserDriver, DriverError, ScreenRegion};

use crate::desktop::{Desktop, SystemDesktop};
use crate::error::NativeError;
use crate::launcher::LaunchSpec;
use crate::ocr::{DEFAULT_LANG, OcrController, OcrResult};

const DEFAULT_SCROLL_AMOUNT: u32 = 10;
const SCROLL_SEARCH_PAGES: usize = 5;
const SCROLL_SEARCH_STEP: i32 = 5;
const USERNAME_LABELS: &[&str] = &["username", "email", "login", "phone"];

/// Pauses between desktop steps. Browsers take real time to react to
/// keystrokes, and nothing on screen tells the driver when they are done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// After focusing the address bar.
    pub focus: Duration,
    /// Before typing into a freshly loaded page.
    pub settle: Duration,
    /// After submitting a URL.
    pub page_load: Duration,
    /// After submitting a search or login form.
    pub results: Duration,
    /// After starting the browser process.
    pub launch: Duration,
    /// Between screen reads while waiting for text.
    pub poll: Duration,
    /// How long `wait` looks for its element.
    pub wait_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            focus: Duration::from_millis(500),
            settle: Duration::from_secs(1),
            page_load: Duration::from_secs(3),
            results: Duration::from_secs(2),
            launch: Duration::from_secs(2),
            poll: Duration::from_millis(500),
            wait_timeout: Duration::from_secs(10),
        }
    }
}

impl Timing {
    /// No pauses at all.
    pub fn immediate() -> Self {
        Self {
            focus: Duration::ZERO,
            settle: Duration::ZERO,
            page_load: Duration::ZERO,
            results: Duration::ZERO,
            launch: Duration::ZERO,
            poll: Duration::ZERO,
            wait_timeout: Duration::ZERO,
        }
    }
}

/// `cmd` on macOS, `ctrl` elsewhere.
pub fn primary_modifier() -> &'static str {
    if cfg!(target_os = "macos") { "cmd" } else { "ctrl" }
}

/// Read `x,y` (optionally parenthesized) as screen coordinates.
pub fn parse_coordinates(element: &str) -> Option<(i32, i32)> {
    let trimmed = element
        .trim()
        .trim_start_matches(['(', '['])
        .trim_end_matches([')', ']']);
    let (x, y) = trimmed.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

/// Wheel notches and axis for a scroll direction.
pub fn scroll_units(direction: &str, amount: u32) -> Option<(i32, bool)> {
    let notches = amount.min(i32::MAX as u32) as i32;
    match direction.trim().to_lowercase().as_str() {
        "down" => Some((notches, false)),
        "up" => Some((-notches, false)),
        "right" => Some((notches, true)),
        "left" => Some((-notches, true)),
        _ => None,
    }
}

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
        Action::Scroll { direction: Some(direction), .. } => format!("Failed to scroll {}", direction),
        Action::Scroll { .. } => "Failed to scroll".to_string(),
        Action::Wait { .. } => "Failed to wait".to_string(),
        Action::Press { key, .. } => format!("Failed to press {}", key),
        Action::Extract { selector, .. } => format!(
            "Failed to extract data from {}",
            selector.as_deref().unwrap_or("screen")
        ),
        _ => return None,
    })
}

fn with_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

#[derive(Default)]
struct BrowserProcess {
    attempted: bool,
    child: Option<Child>,
    /// Some action touched the desktop since the last close.
    used: bool,
}

/// Level 2 driver: a visible browser operated with synthetic keyboard and
/// mouse input, with on-screen text found by OCR.
pub struct NativeDriver {
    desktop: Arc<dyn Desktop>,
    launch: Option<LaunchSpec>,
    process: Mutex<BrowserProcess>,
    lang: String,
    slow_mo: Duration,
    timing: Timing,
}

impl NativeDriver {
    /// Driver over `desktop` that never launches a browser itself.
    pub fn new(desktop: Arc<dyn Desktop>) -> Self {
        Self {
            desktop,
            launch: None,
            process: Mutex::new(BrowserProcess::default()),
            lang: DEFAULT_LANG.to_string(),
            slow_mo: Duration::ZERO,
            timing: Timing::default(),
        }
    }

    /// Driver for the configured browser on the real desktop. The browser
    /// is started with its profile's arguments before the first action.
    pub fn from_config(config: &Config, profiles: &ProfileStore) -> Self {
        let profile = profiles.profile(&config.browser.name);
        Self::new(Arc::new(SystemDesktop::new(OcrController::default())))
            .with_launch(LaunchSpec::from_config(config, &profile))
            .with_slow_mo(config.browser.slow_mo)
    }

    pub fn with_launch(mut self, spec: LaunchSpec) -> Self {
        self.launch = Some(spec);
        self
    }

    pub fn with_slow_mo(mut self, slow_mo_ms: u64) -> Self {
        self.slow_mo = Duration::from_millis(slow_mo_ms);
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// OCR language used to find elements.
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Start the configured browser.
    ///
    /// A browser that cannot be found is a failed outcome. A browser that
    /// is found but will not start is a [`DriverError::LaunchFailed`].
    pub async fn launch(&self) -> Result<ActionOutcome, DriverError> {
        let mut process = self.process.lock().await;
        self.launch_locked(&mut process).await
    }

    async fn launch_locked(&self, process: &mut BrowserProcess) -> Result<ActionOutcome, DriverError> {
        process.attempted = true;
        let Some(spec) = &self.launch else {
            return Ok(ActionOutcome::fail("No browser configured to launch"));
        };
        let Some(command) = spec.command() else {
            return Ok(ActionOutcome::fail(format!(
                "Could not find {} browser on this system",
                spec.browser
            )));
        };

        debug!("Launching {:?} {:?}", command.program, command.args);
        let child = Command::new(&command.program)
            .args(&command.args)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DriverError::LaunchFailed(format!("{}: {}", spec.browser, e)))?;
        let pid = child.id();
        process.child = Some(child);
        tokio::time::sleep(self.timing.launch).await;

        info!("Launched {} browser (pid {:?})", spec.browser, pid);
        let mut outcome = ActionOutcome::ok(format!("Launched {} browser", spec.browser));
        if let Some(pid) = pid {
            outcome = outcome.with("process_id", pid);
        }
        Ok(outcome)
    }

    async fn ensure_launched(&self) -> Result<(), DriverError> {
        let mut process = self.process.lock().await;
        process.used = true;
        if process.attempted || self.launch.is_none() {
            return Ok(());
        }
        let outcome = self.launch_locked(&mut process).await?;
        if !outcome.success {
            warn!("{}; using the browser already on screen", outcome.message);
        }
        Ok(())
    }

    async fn on_desktop<T, F>(&self, f: F) -> Result<T, NativeError>
    where
        F: FnOnce(&dyn Desktop) -> Result<T, NativeError> + Send + 'static,
        T: Send + 'static,
    {
        let desktop = Arc::clone(&self.desktop);
        tokio::task::spawn_blocking(move || f(desktop.as_ref()))
            .await
            .map_err(|e| NativeError::Task(e.to_string()))?
    }

    async fn press_keys(&self, combo: &str) -> Result<(), NativeError> {
        let combo = combo.to_string();
        self.on_desktop(move |d| d.press(&combo)).await
    }

    async fn type_keys(&self, text: &str) -> Result<(), NativeError> {
        let text = text.to_string();
        self.on_desktop(move |d| d.type_text(&text)).await
    }

    async fn click_at(&self, x: i32, y: i32) -> Result<(), NativeError> {
        self.on_desktop(move |d| d.click(x, y)).await
    }

    async fn read_screen(&self, region: Option<ScreenRegion>, lang: &str) -> Result<OcrResult, NativeError> {
        let lang = lang.to_string();
        self.on_desktop(move |d| d.read_screen(region, &lang)).await
    }

    /// Screen position of `element`: literal coordinates, or the centre of
    /// matching on-screen text.
    async fn locate(&self, element: &str) -> Result<Option<(i32, i32)>, NativeError> {
        if let Some(point) = parse_coordinates(element) {
            return Ok(Some(point));
        }
        let screen = self.read_screen(None, &self.lang).await?;
        Ok(screen.locate(element))
    }

    async fn run(&self, action: &Action) -> Result<ActionOutcome, NativeError> {
        match action {
            Action::Navigate { url } => self.navigate(url).await,
            Action::Click { element } => self.click(element).await,
            Action::Type { text, element } => self.type_text(text, element).await,
            Action::Search { query, site } => self.search(query, site).await,
            Action::Login {
                site,
                username,
                password,
            } => self.login(site.as_deref(), username, password).await,
            Action::Scroll {
                element,
                direction,
                amount,
            } => {
                self.scroll(element.as_deref(), direction.as_deref(), *amount)
                    .await
            }
            Action::Wait { element, seconds } => match element {
                Some(element) => self.wait_for(element).await,
                None => Ok(Self::pause(*seconds).await),
            },
            Action::Press { key, element } => self.press(key, element.as_deref()).await,
            Action::Extract {
                selector, params, ..
            } => self.extract(selector.as_deref(), params).await,
            other => Ok(ActionOutcome::unknown_action(other.kind())),
        }
    }

    async fn navigate(&self, url: &str) -> Result<ActionOutcome, NativeError> {
        let modifier = primary_modifier();
        self.press_keys(&format!("{}+l", modifier)).await?;
        tokio::time::sleep(self.timing.focus).await;
        self.press_keys(&format!("{}+a", modifier)).await?;
        self.press_keys("delete").await?;
        self.type_keys(url).await?;
        self.press_keys("enter").await?;
        tokio::time::sleep(self.timing.page_load).await;
        Ok(ActionOutcome::ok(format!("Navigated to {}", url)))
    }

    async fn click(&self, element: &str) -> Result<ActionOutcome, NativeError> {
        let Some((x, y)) = self.locate(element).await? else {
            return Ok(ActionOutcome::fail(format!("Could not find element: {}", element)));
        };
        self.click_at(x, y).await?;
        Ok(ActionOutcome::ok(format!("Clicked on {}", element)).with("location", json!([x, y])))
    }

    async fn type_text(&self, text: &str, element: &str) -> Result<ActionOutcome, NativeError> {
        let target = element.trim();
        if !target.is_empty() && !target.eq_ignore_ascii_case("focused") {
            let clicked = self.click(target).await?;
            if !clicked.success {
                return Ok(clicked);
            }
        }
        self.type_keys(text).await?;
        Ok(ActionOutcome::ok(format!("Typed '{}' into {}", text, element)))
    }

    async fn search(&self, query: &str, site: &str) -> Result<ActionOutcome, NativeError> {
        let site_key = site.trim().to_lowercase();
        let (home, name, opener) = match site_key.trim_start_matches("www.") {
            "google" | "google.com" => ("https://www.google.com", "Google", None),
            // "/" focuses GitHub's search bar.
            "github" | "github.com" => ("https://github.com", "GitHub", Some("/")),
            _ => {
                return Ok(ActionOutcome::fail(format!(
                    "Search on {} is not supported yet",
                    site
                )));
            }
        };

        self.navigate(home).await?;
        tokio::time::sleep(self.timing.settle).await;
        if let Some(opener) = opener {
            self.press_keys(opener).await?;
            tokio::time::sleep(self.timing.settle).await;
        }
        self.type_keys(query).await?;
        self.press_keys("enter").await?;
        tokio::time::sleep(self.timing.results).await;
        Ok(ActionOutcome::ok(format!("Searched for '{}' on {}", query, name)))
    }

    async fn login(
        &self,
        site: Option<&str>,
        username: &str,
        password: &str,
    ) -> Result<ActionOutcome, NativeError> {
        if let Some(site) = site {
            self.navigate(&with_scheme(site)).await?;
            tokio::time::sleep(self.timing.settle).await;
        }

        let screen = self.read_screen(None, &self.lang).await?;
        let field = USERNAME_LABELS.iter().find_map(|label| screen.locate(label));
        match field {
            Some((x, y)) => self.click_at(x, y).await?,
            None => {
                debug!("No username label on screen, tabbing to the first field");
                self.press_keys("tab").await?;
            }
        }

        self.type_keys(username).await?;
        self.press_keys("tab").await?;
        self.type_keys(password).await?;
        self.press_keys("enter").await?;
        tokio::time::sleep(self.timing.results).await;

        Ok(ActionOutcome::ok(format!(
            "Logged into {} with username {}",
            site.unwrap_or("the current page"),
            username
        )))
    }

    async fn scroll(
        &self,
        element: Option<&str>,
        direction: Option<&str>,
        amount: Option<u32>,
    ) -> Result<ActionOutcome, NativeError> {
        if let Some(element) = element {
            return self.scroll_to(element).await;
        }

        let Some(direction) = direction else {
            return Ok(ActionOutcome::fail("No scroll target or direction given"));
        };
        let amount = amount.unwrap_or(DEFAULT_SCROLL_AMOUNT);
        let Some((notches, horizontal)) = scroll_units(direction, amount) else {
            return Ok(ActionOutcome::fail(format!("Unknown scroll direction: {}", direction)));
        };
        self.on_desktop(move |d| d.scroll(notches, horizontal)).await?;
        Ok(ActionOutcome::ok(format!("Scrolled {} by {}", direction, amount)))
    }

    async fn scroll_to(&self, element: &str) -> Result<ActionOutcome, NativeError> {
        let edge = match element.trim().to_lowercase().as_str() {
            "top" => Some("home"),
            "bottom" => Some("end"),
            _ => None,
        };
        if let Some(key) = edge {
            self.press_keys(key).await?;
            return Ok(ActionOutcome::ok(format!("Scrolled to {}", element)));
        }

        for page in 0..SCROLL_SEARCH_PAGES {
            if let Some((x, y)) = self.locate(element).await? {
                return Ok(ActionOutcome::ok(format!("Scrolled to {}", element))
                    .with("location", json!([x, y])));
            }
            if page + 1 < SCROLL_SEARCH_PAGES {
                self.on_desktop(|d| d.scroll(SCROLL_SEARCH_STEP, false)).await?;
                tokio::time::sleep(self.timing.poll).await;
            }
        }
        Ok(ActionOutcome::fail(format!("Could not find element: {}", element)))
    }

    async fn wait_for(&self, element: &str) -> Result<ActionOutcome, NativeError> {
        let started = Instant::now();
        loop {
            if let Some((x, y)) = self.locate(element).await? {
                return Ok(ActionOutcome::ok(format!("Element {} is now visible", element))
                    .with("location", json!([x, y])));
            }
            if started.elapsed() >= self.timing.wait_timeout {
                return Ok(ActionOutcome::fail(format!(
                    "Element {} did not appear within the timeout",
                    element
                )));
            }
            tokio::time::sleep(self.timing.poll).await;
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

    async fn press(&self, key: &str, element: Option<&str>) -> Result<ActionOutcome, NativeError> {
        let Some(element) = element else {
            self.press_keys(key).await?;
            return Ok(ActionOutcome::ok(format!("Pressed {}", key)));
        };

        let clicked = self.click(element).await?;
        if !clicked.success {
            return Ok(clicked);
        }
        self.press_keys(key).await?;
        Ok(ActionOutcome::ok(format!("Pressed {} on {}", key, element)))
    }

    async fn extract(
        &self,
        selector: Option<&str>,
        params: &Map<String, Value>,
    ) -> Result<ActionOutcome, NativeError> {
        let region = params.get("region").and_then(ScreenRegion::from_value);
        let lang = params
            .get("lang")
            .and_then(Value::as_str)
            .unwrap_or(&self.lang)
            .to_string();
        let screen = self.read_screen(region, &lang).await?;
        Ok(
            ActionOutcome::ok(format!("Extracted data from {}", selector.unwrap_or("screen")))
                .with("data", screen.text)
                .with("confidence", screen.confidence as f64),
        )
    }
}

#[async_trait]
impl BrowserDriver for NativeDriver {
    fn name(&self) -> &str {
        "native"
    }

    async fn execute_action(&self, action: &Action) -> Result<ActionOutcome, DriverError> {
        let Some(context) = failure_context(action) else {
            return Ok(ActionOutcome::unknown_action(action.kind()));
        };

        let timed_wait = matches!(action, Action::Wait { element: None, .. });
        if !timed_wait {
            self.ensure_launched().await?;
        }

        let outcome = match self.run(action).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_unavailable() => return Err(e.into()),
            Err(e) => {
                error!("{}: {}", context, e);
                ActionOutcome::fail(format!("{}: {}", context, e))
            }
        };

        if !self.slow_mo.is_zero() {
            tokio::time::sleep(self.slow_mo).await;
        }
        Ok(outcome)
    }

    async fn close(&self) -> Result<(), DriverError> {
        let mut process = self.process.lock().await;
        if let Some(mut child) = process.child.take() {
            if let Err(e) = child.kill().await {
                warn!("Failed to stop browser process: {}", e);
            }
            info!("Closed browser process");
        } else if process.used {
            let combo = if cfg!(target_os = "macos") { "cmd+q" } else { "alt+f4" };
            self.press_keys(combo).await?;
            info!("Closed browser window with {}", combo);
        }
        *process = BrowserProcess::default();
        Ok(())
    }
}

impl std::fmt::Debug for NativeDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeDriver")
            .field("launch", &self.launch)
            .field("lang", &self.lang)
            .field("slow_mo", &self.slow_mo)
            .finish()
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
