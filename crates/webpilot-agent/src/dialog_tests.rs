use super::*;
use crate::driver::LazyDriver;
use crate::executor::ActionExecutor;
use crate::handlers::{DriverActionHandler, RecallHandler, RememberHandler};
use crate::test_support::{RecordingDriver, StaticFactory};
use serde_json::json;
use tempfile::TempDir;
use webpilot_extractor::DataExtractor;

fn dialog(dir: &TempDir, driver: &RecordingDriver) -> DialogManager {
    let memory = Arc::new(MemoryManager::new(dir.path()).unwrap());
    let parser = Arc::new(CommandParser::rules_only().unwrap());
    let dialog = DialogManager::new(memory, parser);

    let lazy = LazyDriver::new(Arc::new(StaticFactory::new(driver.clone())));
    let executor = Arc::new(ActionExecutor::new(Arc::new(lazy), DataExtractor::new().unwrap()));
    let browser: Arc<dyn ActionHandler> = Arc::new(DriverActionHandler::new(executor));
    dialog.register_handler("navigate", browser.clone());
    dialog.register_handler("click", browser);
    dialog
}

#[tokio::test]
async fn test_process_message_runs_actions() {
    let dir = TempDir::new().unwrap();
    let driver = RecordingDriver::new("cdp");
    let dialog = dialog(&dir, &driver);

    let reply = dialog
        .process_message("alice", "Go to example.com and click the login button")
        .await;

    assert_eq!(reply.user_id, "alice");
    assert!(reply.error.is_none());
    assert_eq!(
        reply.actions,
        Some(vec![Action::navigate("https://example.com"), Action::click("login button")])
    );
    assert_eq!(
        reply.response,
        "I've completed the tasks you requested.\n\
         - Navigated to https://example.com\n\
         - Clicked on login button"
    );
    assert_eq!(driver.actions().len(), 2);

    let history = dialog.conversation_history("alice", None);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, "user");
    assert_eq!(history[0].content, "Go to example.com and click the login button");
    assert_eq!(history[1].role, "assistant");
    assert_eq!(history[1].content, reply.response);
    assert!(history[1].metadata.contains_key("results"));

    assert_eq!(dialog.user_memory("alice"), Some(Map::new()));
}

#[tokio::test]
async fn test_unparsed_message() {
    let dir = TempDir::new().unwrap();
    let dialog = dialog(&dir, &RecordingDriver::new("cdp"));

    let reply = dialog.process_message("bob", "make me a sandwich").await;
    assert_eq!(reply.actions, Some(Vec::new()));
    assert_eq!(
        reply.response,
        "I'm not sure what you want me to do. Could you please be more specific?"
    );
}

#[tokio::test]
async fn test_missing_handler_is_recorded() {
    let dir = TempDir::new().unwrap();
    let memory = Arc::new(MemoryManager::new(dir.path()).unwrap());
    let dialog = DialogManager::new(memory, Arc::new(CommandParser::rules_only().unwrap()));

    let reply = dialog.process_message("carol", "Go to example.com").await;
    let results = reply.results.unwrap();
    assert_eq!(
        results[0].error.as_deref(),
        Some("No handler registered for action type: navigate")
    );
    assert!(reply.response.starts_with("I encountered some issues"));
    assert!(reply
        .response
        .contains("- Failed to navigate: No handler registered for action type: navigate"));
}

#[tokio::test]
async fn test_failed_action_in_reply() {
    let dir = TempDir::new().unwrap();
    let dialog = dialog(&dir, &RecordingDriver::new("cdp"));

    let reply = dialog
        .process_message("alice", "Go to example.com and click the missing")
        .await;
    assert_eq!(
        reply.response,
        "I encountered some issues while trying to complete your requests.\n\
         - Successfully navigated to https://example.com\n\
         - Failed to click: Element not found: missing"
    );
}

#[tokio::test]
async fn test_storage_failure_becomes_apology() {
    let dir = TempDir::new().unwrap();
    let dialog = dialog(&dir, &RecordingDriver::new("cdp"));

    let reply = dialog.process_message("   ", "Go to example.com").await;
    assert!(reply.error.is_some());
    assert!(reply
        .response
        .starts_with("I'm sorry, but I encountered an error while processing your message: "));
    assert!(reply.actions.is_none());
}

#[tokio::test]
async fn test_handlers_see_user() {
    let dir = TempDir::new().unwrap();
    let dialog = dialog(&dir, &RecordingDriver::new("cdp"));
    dialog.register_handler("remember", Arc::new(RememberHandler));
    dialog.register_handler("recall", Arc::new(RecallHandler));
    assert!(dialog.has_handler("remember"));

    let ctx = HandlerContext::new("dave", dialog.memory().clone());
    let record = dialog
        .dispatch(
            &Action::Remember {
                key: Some("team".to_string()),
                value: json!("blue"),
            },
            &ctx,
        )
        .await;
    assert!(record.is_success());
    assert_eq!(dialog.user_memory("dave"), Some(json!({"team": "blue"}).as_object().unwrap().clone()));
}

#[tokio::test]
async fn test_error_action_is_errored_record() {
    let dir = TempDir::new().unwrap();
    let dialog = dialog(&dir, &RecordingDriver::new("cdp"));
    let ctx = HandlerContext::new("erin", dialog.memory().clone());

    let record = dialog.dispatch(&Action::error("LLM unavailable"), &ctx).await;
    assert_eq!(record.error.as_deref(), Some("LLM unavailable"));
}

#[tokio::test]
async fn test_history_and_memory_operations() {
    let dir = TempDir::new().unwrap();
    let dialog = dialog(&dir, &RecordingDriver::new("cdp"));

    assert!(!dialog.clear_conversation_history("frank").unwrap());
    assert!(!dialog.update_user_memory("frank", "k", json!(1)).unwrap());
    assert!(!dialog.clear_user_memory("frank").unwrap());
    assert!(dialog.user_memory("frank").is_none());
    assert!(dialog.conversation_history("frank", None).is_empty());

    dialog.process_message("frank", "Go to example.com").await;
    dialog.process_message("frank", "Go to example.org").await;
    assert_eq!(dialog.conversation_history("frank", None).len(), 4);
    let last = dialog.conversation_history("frank", Some(1));
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].role, "assistant");

    assert!(dialog.update_user_memory("frank", "k", json!(1)).unwrap());
    assert_eq!(dialog.user_memory("frank").unwrap().get("k"), Some(&json!(1)));
    assert!(dialog.clear_user_memory("frank").unwrap());
    assert_eq!(dialog.user_memory("frank"), Some(Map::new()));

    assert!(dialog.clear_conversation_history("frank").unwrap());
    assert!(dialog.conversation_history("frank", None).is_empty());
}
