//! Level 3 handlers: dialog, tasks, conversations and memory.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use webpilot_agent::{DialogResponse, TaskRequest};

use crate::error::ApiError;
use crate::http::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct MessageRequest {
    pub user_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// POST /message
pub async fn process_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MessageRequest>,
) -> Json<DialogResponse> {
    Json(
        state
            .agent
            .process_message(&request.user_id, &request.message)
            .await,
    )
}

/// POST /task
pub async fn schedule_task(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TaskRequest>,
) -> Result<Json<Value>, ApiError> {
    let task = state.agent.schedule_task(request).await?;
    info!("Scheduled task {} via API", task.task_id);
    Ok(Json(json!({
        "status": "success",
        "message": "Task scheduled successfully",
        "task_id": task.task_id,
    })))
}

/// GET /tasks
pub async fn list_tasks(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "tasks": state.agent.scheduled_tasks() }))
}

/// POST /tasks/{task_id}/run
pub async fn run_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let report = state.agent.run_task(&task_id).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Task executed successfully",
        "result": report,
    })))
}

/// DELETE /tasks/{task_id}
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    if !state.agent.remove_task(&task_id).await? {
        return Err(ApiError::NotFound(format!("Task not found: {}", task_id)));
    }
    Ok(Json(ApiResponse::success("Task deleted successfully")))
}

/// GET /conversation/{user_id}
pub async fn conversation_history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Json<Value> {
    let history = state.agent.dialog().conversation_history(&user_id, query.limit);
    Json(json!({ "user_id": user_id, "history": history }))
}

/// DELETE /conversation/{user_id}
pub async fn clear_conversation(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    if !state.agent.dialog().clear_conversation_history(&user_id)? {
        return Err(ApiError::NotFound(format!(
            "Conversation not found for user: {}",
            user_id
        )));
    }
    Ok(Json(ApiResponse::success("Conversation history cleared successfully")))
}

/// GET /memory/{user_id}
pub async fn user_memory(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let memory = state
        .agent
        .dialog()
        .user_memory(&user_id)
        .ok_or_else(|| ApiError::NotFound(format!("Memory not found for user: {}", user_id)))?;
    Ok(Json(json!({ "user_id": user_id, "memory": memory })))
}

/// DELETE /memory/{user_id}
pub async fn clear_memory(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    if !state.agent.dialog().clear_user_memory(&user_id)? {
        return Err(ApiError::NotFound(format!("Memory not found for user: {}", user_id)));
    }
    Ok(Json(ApiResponse::success("Memory cleared successfully")))
}
