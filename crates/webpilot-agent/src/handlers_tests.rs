use super::*;
use crate::driver::LazyDriver;
use crate::test_support::{RecordingDriver, StaticFactory};
use serde_json::json;
use tempfile::TempDir;
use webpilot_extractor::DataExtractor;
use webpilot_memory::MemoryManager;
use webpilot_scheduler::MemoryTaskStore;

fn context(dir: &TempDir) -> HandlerContext {
    let memory = Arc::new(MemoryManager::new(dir.path()).unwrap());
    HandlerContext::new("alice", memory)
}

fn executor(driver: &RecordingDriver) -> Arc<ActionExecutor> {
    let lazy = LazyDriver::new(Arc::new(StaticFactory::new(driver.clone())));
    Arc::new(ActionExecutor::new(Arc::new(lazy), DataExtractor::new().unwrap()))
}

fn scheduler(driver: &RecordingDriver) -> Arc<TaskScheduler> {
    Arc::new(TaskScheduler::new(Arc::new(MemoryTaskStore::new()), executor(driver)))
}

fn schedule(task_id: &str) -> Action {
    Action::Schedule(ScheduleSpec {
        task_id: Some(task_id.to_string()),
        name: Some("Check news".to_string()),
        interval: 600,
        actions: vec![Action::navigate("https://news.ycombinator.com")],
        ..ScheduleSpec::default()
    })
}

#[tokio::test]
async fn test_driver_handler_delegates() {
    let dir = TempDir::new().unwrap();
    let driver = RecordingDriver::new("cdp");
    let handler = DriverActionHandler::new(executor(&driver));

    let outcome = handler.handle(&Action::click("Sign in"), &context(&dir)).await.unwrap();
    assert!(outcome.success);
    assert_eq!(driver.actions(), vec![Action::click("Sign in")]);
}

#[tokio::test]
async fn test_schedule_adds_task() {
    let dir = TempDir::new().unwrap();
    let driver = RecordingDriver::new("cdp");
    let scheduler = scheduler(&driver);
    let handler = ScheduleHandler::new(scheduler.clone());

    let outcome = handler.handle(&schedule("news"), &context(&dir)).await.unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.message, "Scheduled task news (Check news)");
    assert_eq!(outcome.get("task_id"), Some(&json!("news")));
    assert!(scheduler.get_task("news").is_some());
    assert!(driver.actions().is_empty());
}

#[tokio::test]
async fn test_schedule_duplicate_fails() {
    let dir = TempDir::new().unwrap();
    let handler = ScheduleHandler::new(scheduler(&RecordingDriver::new("cdp")));
    let ctx = context(&dir);

    handler.handle(&schedule("news"), &ctx).await.unwrap();
    let outcome = handler.handle(&schedule("news"), &ctx).await.unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Failed to schedule task news (Check news)");
}

#[tokio::test]
async fn test_schedule_rejects_bad_times() {
    let dir = TempDir::new().unwrap();
    let handler = ScheduleHandler::new(scheduler(&RecordingDriver::new("cdp")));
    let ctx = context(&dir);

    let action = Action::Schedule(ScheduleSpec {
        start_time: Some("tomorrow".to_string()),
        ..ScheduleSpec::default()
    });
    let outcome = handler.handle(&action, &ctx).await.unwrap();
    assert_eq!(outcome.message, "Invalid start time format: tomorrow");

    let action = Action::Schedule(ScheduleSpec {
        end_time: Some("2024-13-45".to_string()),
        ..ScheduleSpec::default()
    });
    let outcome = handler.handle(&action, &ctx).await.unwrap();
    assert_eq!(outcome.message, "Invalid end time format: 2024-13-45");
}

#[tokio::test]
async fn test_schedule_rejects_bad_schedule() {
    let dir = TempDir::new().unwrap();
    let handler = ScheduleHandler::new(scheduler(&RecordingDriver::new("cdp")));

    let action = Action::Schedule(ScheduleSpec {
        schedule_type: "cron".to_string(),
        ..ScheduleSpec::default()
    });
    let outcome = handler.handle(&action, &context(&dir)).await.unwrap();
    assert!(!outcome.success);
}

#[tokio::test]
async fn test_remember_recall_forget() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    let remember = Action::Remember {
        key: Some("city".to_string()),
        value: json!("Paris"),
    };
    let outcome = RememberHandler.handle(&remember, &ctx).await.unwrap();
    assert_eq!(outcome.message, "Remembered city: Paris");
    assert_eq!(ctx.memory.get_memory("alice").unwrap().get("city"), Some(&json!("Paris")));

    let recall = Action::Recall {
        key: Some("city".to_string()),
    };
    let outcome = RecallHandler.handle(&recall, &ctx).await.unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.message, "Recalled city: Paris");
    assert_eq!(outcome.get("value"), Some(&json!("Paris")));

    let forget = Action::Forget {
        key: Some("city".to_string()),
    };
    let outcome = ForgetHandler.handle(&forget, &ctx).await.unwrap();
    assert_eq!(outcome.message, "Forgot city");

    let outcome = RecallHandler.handle(&recall, &ctx).await.unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.message, "No memory found for key: city");
}

#[tokio::test]
async fn test_remember_structured_value() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let remember = Action::Remember {
        key: Some("sizes".to_string()),
        value: json!([1, 2]),
    };
    let outcome = RememberHandler.handle(&remember, &ctx).await.unwrap();
    assert_eq!(outcome.message, "Remembered sizes: [1,2]");
}

#[tokio::test]
async fn test_missing_keys() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    let outcome = RememberHandler
        .handle(&Action::Remember { key: None, value: json!(1) }, &ctx)
        .await
        .unwrap();
    assert_eq!(outcome.message, "No key specified for remember action");

    let outcome = RecallHandler.handle(&Action::Recall { key: None }, &ctx).await.unwrap();
    assert_eq!(outcome.message, "No key specified for recall action");

    let outcome = ForgetHandler.handle(&Action::Forget { key: None }, &ctx).await.unwrap();
    assert_eq!(outcome.message, "No key specified for forget action");
}

#[tokio::test]
async fn test_wrong_action_kind() {
    let dir = TempDir::new().unwrap();
    let outcome = RecallHandler
        .handle(&Action::navigate("https://a.b"), &context(&dir))
        .await
        .unwrap();
    assert_eq!(outcome.message, "Unknown action type: navigate");
}
