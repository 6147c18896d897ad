//! Turning element descriptions into things the page can find.
//!
//! A description such as `"search box"` expands into an ordered list of
//! [`Locator`]s. CSS has no text matching, so text candidates run a small
//! script that tags the best visible match with [`MARK_ATTRIBUTE`] and are
//! then addressed through [`MARK_SELECTOR`].

use std::time::{Duration, Instant};

use crate::cdp::{CdpError, PageSession, js_string};

pub const MARK_ATTRIBUTE: &str = "data-webpilot-target";
pub const MARK_SELECTOR: &str = "[data-webpilot-target]";

/// Trailing words that name a widget rather than identify it.
const ROLE_WORDS: &[&str] = &["button", "btn", "link", "field", "box", "input", "textbox", "icon"];

/// Attributes worth matching a description against.
const MATCH_ATTRIBUTES: &[&str] = &["placeholder", "name", "id", "aria-label", "title"];

/// Generic search inputs, in order of preference.
pub const SEARCH_BOXES: &[&str] = &[
    r#"input[type="search"]"#,
    r#"input[name="q"]"#,
    r#"input[name="query"]"#,
    r#"input[name="search"]"#,
    r#"input[placeholder*="search" i]"#,
    r#"input[aria-label*="search" i]"#,
];

pub const USERNAME_FIELDS: &[&str] = &[
    r#"input[type="email"]"#,
    r#"input[type="text"][name*="email" i]"#,
    r#"input[type="text"][name*="user" i]"#,
    r#"input[type="text"][id*="email" i]"#,
    r#"input[type="text"][id*="user" i]"#,
    r#"input[type="text"][placeholder*="email" i]"#,
    r#"input[type="text"][placeholder*="user" i]"#,
    r#"input[name="username"]"#,
    r#"input[id="username"]"#,
];

pub const PASSWORD_FIELD: &str = r#"input[type="password"]"#;

pub const SUBMIT_BUTTONS: &[&str] = &[r#"button[type="submit"]"#, r#"input[type="submit"]"#];

pub const SUBMIT_TEXTS: &[&str] = &["log in", "login", "sign in", "signin"];

/// A search site with a known page layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchEngine {
    pub name: &'static str,
    pub url: &'static str,
    pub input: &'static str,
    pub results: &'static str,
}

pub const SEARCH_ENGINES: &[SearchEngine] = &[
    SearchEngine {
        name: "Google",
        url: "https://www.google.com",
        input: r#"textarea[name="q"]"#,
        results: "div#search",
    },
    SearchEngine {
        name: "Bing",
        url: "https://www.bing.com",
        input: r#"input[name="q"]"#,
        results: "ol#b_results",
    },
    SearchEngine {
        name: "Yahoo",
        url: "https://search.yahoo.com",
        input: r#"input[name="p"]"#,
        results: "div#results",
    },
];

/// The built-in engine whose name appears in `site`, if any.
pub fn search_engine(site: &str) -> Option<&'static SearchEngine> {
    let site = site.to_lowercase();
    SEARCH_ENGINES
        .iter()
        .find(|e| site.contains(&e.name.to_lowercase()))
}

/// One way of finding an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    /// Visible element whose text contains this lower-cased string.
    Text(String),
}

impl Locator {
    /// How the locator is reported back, e.g. in an outcome's `selector`.
    pub fn describe(&self) -> String {
        match self {
            Locator::Css(selector) => selector.clone(),
            Locator::Text(text) => format!("text=\"{}\"", text),
        }
    }

    /// Resolve to a CSS selector and node id on the current document.
    pub async fn resolve(&self, page: &PageSession) -> Result<Option<(String, i64)>, CdpError> {
        match self {
            Locator::Css(selector) => Ok(page
                .query_selector(selector)
                .await?
                .map(|id| (selector.clone(), id))),
            Locator::Text(text) => {
                if !page.evaluate_bool(&text_locator_script(text)).await? {
                    return Ok(None);
                }
                Ok(page
                    .query_selector(MARK_SELECTOR)
                    .await?
                    .map(|id| (MARK_SELECTOR.to_string(), id)))
            }
        }
    }
}

/// True when a description is already a CSS selector.
pub fn looks_like_css(description: &str) -> bool {
    let d = description.trim();
    (d.contains('[') && d.contains(']'))
        || ((d.starts_with('#') || d.starts_with('.')) && !d.contains(' '))
}

/// Lower-cased search strings for a description: the whole thing, then
/// without a trailing role word ("search box" also tries "search").
pub fn needles(description: &str) -> Vec<String> {
    let full = description
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let mut out = vec![full.clone()];
    if let Some((head, last)) = full.rsplit_once(' ') {
        if ROLE_WORDS.contains(&last) && !head.is_empty() {
            out.push(head.to_string());
        }
    }
    out
}

fn attribute_value(needle: &str) -> String {
    needle.replace('\\', "\\\\").replace('"', "\\\"")
}

fn attribute_matches(tag: &str, needle: &str, attributes: &[&str]) -> Vec<Locator> {
    let value = attribute_value(needle);
    attributes
        .iter()
        .map(|attr| Locator::Css(format!(r#"{}[{}*="{}" i]"#, tag, attr, value)))
        .collect()
}

/// Candidates for something to click.
pub fn click_candidates(description: &str) -> Vec<Locator> {
    if looks_like_css(description) {
        return vec![Locator::Css(description.trim().to_string())];
    }
    let mut out = Vec::new();
    for needle in needles(description) {
        out.push(Locator::Text(needle.clone()));
        out.extend(attribute_matches("", &needle, MATCH_ATTRIBUTES));
    }
    out
}

/// Candidates for something to type into.
pub fn input_candidates(description: &str) -> Vec<Locator> {
    if looks_like_css(description) {
        return vec![Locator::Css(description.trim().to_string())];
    }
    let mut out = Vec::new();
    for needle in needles(description) {
        out.extend(attribute_matches("input", &needle, &["placeholder", "name", "id", "aria-label"]));
        out.extend(attribute_matches("textarea", &needle, &["placeholder", "name", "aria-label"]));
    }
    for needle in needles(description) {
        out.extend(attribute_matches("", &needle, MATCH_ATTRIBUTES));
    }
    out
}

/// Candidates for scrolling to or waiting on. Single words also try a tag
/// selector, so "footer" finds `<footer>`.
pub fn element_candidates(description: &str) -> Vec<Locator> {
    let mut out = click_candidates(description);
    if looks_like_css(description) {
        return out;
    }
    let word = description.trim().to_lowercase();
    if !word.is_empty() && word.chars().all(|c| c.is_ascii_alphabetic()) {
        out.push(Locator::Css(word));
    }
    out
}

/// Candidates for pressing a key on: inputs first, then anything clickable.
pub fn press_candidates(description: &str) -> Vec<Locator> {
    let mut out = input_candidates(description);
    for candidate in click_candidates(description) {
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

/// Candidates for a login form's submit control.
pub fn submit_candidates() -> Vec<Locator> {
    SUBMIT_BUTTONS
        .iter()
        .map(|s| Locator::Css(s.to_string()))
        .chain(SUBMIT_TEXTS.iter().map(|t| Locator::Text(t.to_string())))
        .collect()
}

/// Css locators for a fixed selector list.
pub fn css_candidates(selectors: &[&str]) -> Vec<Locator> {
    selectors.iter().map(|s| Locator::Css(s.to_string())).collect()
}

const TEXT_LOCATOR: &str = r#"(() => {
  const needle = __NEEDLE__;
  const mark = '__MARK__';
  document.querySelectorAll('[' + mark + ']').forEach(el => el.removeAttribute(mark));
  const visible = el => !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length);
  const label = el => String(el.innerText || el.value || el.getAttribute('aria-label') || '')
    .trim().toLowerCase().replace(/\s+/g, ' ');
  const groups = [
    'button, a, [role=button], input[type=submit], input[type=button]',
    'label, span, div',
  ];
  for (const group of groups) {
    const nodes = Array.from(document.querySelectorAll(group)).filter(visible);
    let best = nodes.find(el => label(el) === needle);
    if (!best) {
      let bestLength = Infinity;
      for (const el of nodes) {
        const text = label(el);
        if (text.includes(needle) && text.length < bestLength) {
          best = el;
          bestLength = text.length;
        }
      }
    }
    if (best) {
      best.setAttribute(mark, '1');
      return true;
    }
  }
  return false;
})()"#;

/// Script that marks the best visible element containing `needle`.
pub fn text_locator_script(needle: &str) -> String {
    TEXT_LOCATOR
        .replace("__MARK__", MARK_ATTRIBUTE)
        .replace("__NEEDLE__", &js_string(&needle.to_lowercase()))
}

/// An element located on the page.
#[derive(Debug, Clone)]
pub struct Found {
    pub locator: Locator,
    /// CSS selector that addresses the element right now.
    pub selector: String,
    pub node_id: i64,
    /// Click point, known when the element is rendered.
    pub center: Option<(f64, f64)>,
}

/// Poll `candidates` in order until one matches or `timeout` passes.
/// With `visible`, a match must also have a box model.
pub async fn find(
    page: &PageSession,
    candidates: &[Locator],
    timeout: Duration,
    visible: bool,
) -> Result<Option<Found>, CdpError> {
    let start = Instant::now();
    loop {
        for locator in candidates {
            let Some((selector, node_id)) = locator.resolve(page).await? else {
                continue;
            };
            let center = page.box_model(node_id).await?.map(|m| m.center());
            if visible && center.is_none() {
                continue;
            }
            return Ok(Some(Found {
                locator: locator.clone(),
                selector,
                node_id,
                center,
            }));
        }
        if start.elapsed() >= timeout {
            return Ok(None);
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

#[cfg(test)]
#[path = "locator_tests.rs"]
mod tests;
