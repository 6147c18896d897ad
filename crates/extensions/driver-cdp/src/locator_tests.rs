use super::*;

#[test]
fn test_looks_like_css() {
    assert!(looks_like_css(r#"input[name="q"]"#));
    assert!(looks_like_css("#login"));
    assert!(looks_like_css(".btn-primary"));
    assert!(!looks_like_css("search button"));
    assert!(!looks_like_css("#1 result in list"));
}

#[test]
fn test_needles_strip_role_word() {
    assert_eq!(needles("Search  Box"), vec!["search box", "search"]);
    assert_eq!(needles("login button"), vec!["login button", "login"]);
    assert_eq!(needles("Sign in"), vec!["sign in"]);
    assert_eq!(needles("button"), vec!["button"]);
}

#[test]
fn test_css_description_used_as_is() {
    assert_eq!(
        click_candidates(" #submit "),
        vec![Locator::Css("#submit".to_string())]
    );
    assert_eq!(
        input_candidates(r#"textarea[name="q"]"#),
        vec![Locator::Css(r#"textarea[name="q"]"#.to_string())]
    );
}

#[test]
fn test_click_candidates_order() {
    let candidates = click_candidates("Sign in");
    assert_eq!(candidates[0], Locator::Text("sign in".to_string()));
    assert_eq!(
        candidates[1],
        Locator::Css(r#"[placeholder*="sign in" i]"#.to_string())
    );
    assert!(candidates.contains(&Locator::Css(r#"[aria-label*="sign in" i]"#.to_string())));
    assert_eq!(candidates.len(), 1 + MATCH_ATTRIBUTES.len());
}

#[test]
fn test_input_candidates_prefer_inputs() {
    let candidates = input_candidates("search box");
    assert_eq!(
        candidates[0],
        Locator::Css(r#"input[placeholder*="search box" i]"#.to_string())
    );
    let textarea = Locator::Css(r#"textarea[aria-label*="search" i]"#.to_string());
    let generic = Locator::Css(r#"[title*="search" i]"#.to_string());
    let textarea_at = candidates.iter().position(|c| *c == textarea).unwrap();
    let generic_at = candidates.iter().position(|c| *c == generic).unwrap();
    assert!(textarea_at < generic_at);
    assert!(candidates.iter().all(|c| matches!(c, Locator::Css(_))));
}

#[test]
fn test_quotes_are_escaped() {
    let candidates = input_candidates(r#"say "hi""#);
    assert_eq!(
        candidates[0],
        Locator::Css(r#"input[placeholder*="say \"hi\"" i]"#.to_string())
    );
}

#[test]
fn test_element_candidates_add_tag() {
    let candidates = element_candidates("Footer");
    assert_eq!(candidates.last(), Some(&Locator::Css("footer".to_string())));
    assert!(!element_candidates("search results")
        .contains(&Locator::Css("search results".to_string())));
}

#[test]
fn test_press_candidates_dedupe() {
    let candidates = press_candidates("search box");
    let mut seen = std::collections::HashSet::new();
    assert!(candidates.iter().all(|c| seen.insert(c.describe())));
    assert!(candidates.contains(&Locator::Text("search".to_string())));
}

#[test]
fn test_submit_candidates() {
    let candidates = submit_candidates();
    assert_eq!(candidates[0], Locator::Css(r#"button[type="submit"]"#.to_string()));
    assert!(candidates.contains(&Locator::Text("sign in".to_string())));
}

#[test]
fn test_describe() {
    assert_eq!(Locator::Text("next".to_string()).describe(), r#"text="next""#);
    assert_eq!(Locator::Css("#a".to_string()).describe(), "#a");
}

#[test]
fn test_text_locator_script_embeds_needle() {
    let script = text_locator_script(r#"It's "Go""#);
    assert!(script.contains(r#"const needle = "it's \"go\"";"#));
    assert!(script.contains("const mark = 'data-webpilot-target';"));
    assert!(!script.contains("__NEEDLE__"));
}

#[test]
fn test_search_engine_lookup() {
    assert_eq!(search_engine("Google").map(|e| e.url), Some("https://www.google.com"));
    assert_eq!(search_engine("www.bing.com").map(|e| e.name), Some("Bing"));
    assert_eq!(search_engine("yahoo").map(|e| e.input), Some(r#"input[name="p"]"#));
    assert!(search_engine("github").is_none());
}
