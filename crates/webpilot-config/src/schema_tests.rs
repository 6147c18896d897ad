use super::*;
use std::collections::HashMap;

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.browser.name, "chrome");
    assert_eq!(config.browser.driver, DriverKind::Cdp);
    assert!(!config.browser.headless);
    assert_eq!(config.browser.slow_mo, 50);
    assert_eq!(config.browser.debug_port, 9222);
}

#[test]
fn test_llm_config_default() {
    let llm = LlmConfig::default();
    assert!(!llm.enabled);
    assert_eq!(llm.model, "gpt-4o-mini");
    assert_eq!(llm.max_tokens, 500);
    assert!((llm.temperature - 0.1).abs() < f32::EPSILON);
    assert!(llm.api_url.ends_with("/v1/chat/completions"));
    assert!(!llm.is_usable());
}

#[test]
fn test_llm_usable_requires_key() {
    let mut llm = LlmConfig {
        enabled: true,
        ..Default::default()
    };
    assert!(!llm.is_usable());

    llm.api_key = Some(String::new());
    assert!(!llm.is_usable());

    llm.api_key = Some("sk-test".to_string());
    assert!(llm.is_usable());
}

#[test]
fn test_scheduler_and_logging_defaults() {
    let config = Config::default();
    assert_eq!(config.scheduler.check_interval_secs, 1);
    assert_eq!(config.scheduler.error_backoff_secs, 5);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.max_files, 5);
}

#[test]
fn test_driver_kind_parse() {
    assert_eq!("native".parse::<DriverKind>().unwrap(), DriverKind::Native);
    assert_eq!("CDP".parse::<DriverKind>().unwrap(), DriverKind::Cdp);
    assert!("selenium".parse::<DriverKind>().is_err());
    assert_eq!(DriverKind::Native.as_str(), "native");
}

#[test]
fn test_env_overrides() {
    let env = vars(&[
        ("HEADLESS", "True"),
        ("SLOW_MO", "120"),
        ("API_HOST", "127.0.0.1"),
        ("API_PORT", "9001"),
        ("OPENAI_API_KEY", "sk-env"),
    ]);
    let mut config = Config::default();
    config
        .apply_overrides_from(|name| env.get(name).cloned())
        .unwrap();

    assert!(config.browser.headless);
    assert_eq!(config.browser.slow_mo, 120);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9001);
    assert_eq!(config.llm.api_key.as_deref(), Some("sk-env"));
}

#[test]
fn test_env_override_headless_one() {
    let env = vars(&[("HEADLESS", "1")]);
    let mut config = Config::default();
    config
        .apply_overrides_from(|name| env.get(name).cloned())
        .unwrap();
    assert!(config.browser.headless);
}

#[test]
fn test_env_override_bad_port() {
    let env = vars(&[("API_PORT", "eighty")]);
    let mut config = Config::default();
    let result = config.apply_overrides_from(|name| env.get(name).cloned());
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
fn test_derived_dirs() {
    let config = Config {
        data_dir: Some("/tmp/wp-data".to_string()),
        config_dir: Some("/tmp/wp-config".to_string()),
        ..Default::default()
    };
    assert_eq!(config.memory_dir(), PathBuf::from("/tmp/wp-data/memory"));
    assert_eq!(config.log_dir(), PathBuf::from("/tmp/wp-data/logs"));
    assert_eq!(
        config.scheduler_dir(),
        PathBuf::from("/tmp/wp-config/scheduler")
    );
    assert_eq!(
        config.profiles_dir(),
        PathBuf::from("/tmp/wp-config/browsers")
    );
}

#[test]
fn test_explicit_section_dirs_win() {
    let mut config = Config::default();
    config.memory.data_dir = Some("/srv/memory".to_string());
    config.scheduler.config_dir = Some("/srv/sched".to_string());
    config.logging.dir = Some("/srv/logs".to_string());
    assert_eq!(config.memory_dir(), PathBuf::from("/srv/memory"));
    assert_eq!(config.scheduler_dir(), PathBuf::from("/srv/sched"));
    assert_eq!(config.log_dir(), PathBuf::from("/srv/logs"));
}
