//! `/config/*`: per-browser profile settings.
//!
//! Mutations answer with the profile store's `{success, message}` outcome as
//! `data`.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::json;

use webpilot_config::{Cookie, ProfileOutcome};

use crate::error::ApiError;
use crate::http::{ApiResponse, BrowserQuery, check_browser, default_browser};
use crate::state::AppState;

type ApiResult = Result<Json<ApiResponse>, ApiError>;

fn outcome_response(message: &str, outcome: ProfileOutcome) -> ApiResult {
    Ok(Json(
        ApiResponse::success(message).with_data(serde_json::to_value(outcome)?),
    ))
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProxyRequest {
    #[serde(default = "default_proxy_type")]
    pub proxy_type: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_browser")]
    pub browser: String,
}

fn default_proxy_type() -> String {
    "http".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtensionRequest {
    pub extension_path: String,
    #[serde(default = "default_browser")]
    pub browser: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentRequest {
    pub user_agent: String,
    #[serde(default = "default_browser")]
    pub browser: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowSizeRequest {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_browser")]
    pub browser: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieRequest {
    pub domain: String,
    pub name: String,
    pub value: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub expiry: Option<i64>,
    #[serde(default = "default_browser")]
    pub browser: String,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

impl From<CookieRequest> for Cookie {
    fn from(request: CookieRequest) -> Self {
        Cookie {
            domain: request.domain,
            name: request.name,
            value: request.value,
            path: request.path,
            secure: request.secure,
            http_only: request.http_only,
            expiry: request.expiry,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieQuery {
    pub domain: String,
    pub name: String,
    #[serde(default = "default_browser")]
    pub browser: String,
}

pub async fn set_proxy(State(state): State<Arc<AppState>>, Json(req): Json<ProxyRequest>) -> ApiResult {
    check_browser(&req.browser, None)?;
    let outcome = state.profiles.set_proxy(
        &req.browser,
        &req.proxy_type,
        &req.host,
        req.port,
        &req.username,
        &req.password,
    )?;
    outcome_response("Proxy configuration set successfully", outcome)
}

pub async fn get_proxy(State(state): State<Arc<AppState>>, Query(q): Query<BrowserQuery>) -> ApiResult {
    check_browser(&q.browser, None)?;
    let proxy = state.profiles.proxy(&q.browser);
    Ok(Json(
        ApiResponse::success("Proxy configuration retrieved successfully")
            .with_data(serde_json::to_value(proxy)?),
    ))
}

pub async fn disable_proxy(State(state): State<Arc<AppState>>, Query(q): Query<BrowserQuery>) -> ApiResult {
    check_browser(&q.browser, None)?;
    let outcome = state.profiles.disable_proxy(&q.browser)?;
    outcome_response("Proxy disabled successfully", outcome)
}

pub async fn add_extension(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExtensionRequest>,
) -> ApiResult {
    check_browser(&req.browser, None)?;
    let path = PathBuf::from(shellexpand::tilde(&req.extension_path).into_owned());
    let outcome = state.profiles.add_extension(&req.browser, &path)?;
    outcome_response("Extension added successfully", outcome)
}

pub async fn remove_extension(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(q): Query<BrowserQuery>,
) -> ApiResult {
    check_browser(&q.browser, None)?;
    let outcome = state.profiles.remove_extension(&q.browser, &name)?;
    outcome_response("Extension removed successfully", outcome)
}

pub async fn list_extensions(State(state): State<Arc<AppState>>, Query(q): Query<BrowserQuery>) -> ApiResult {
    check_browser(&q.browser, None)?;
    let extensions = state.profiles.extensions(&q.browser);
    Ok(Json(
        ApiResponse::success("Extensions listed successfully")
            .with_data(json!({ "extensions": extensions })),
    ))
}

pub async fn set_user_agent(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UserAgentRequest>,
) -> ApiResult {
    check_browser(&req.browser, None)?;
    let outcome = state.profiles.set_user_agent(&req.browser, &req.user_agent)?;
    outcome_response("User agent set successfully", outcome)
}

pub async fn get_user_agent(State(state): State<Arc<AppState>>, Query(q): Query<BrowserQuery>) -> ApiResult {
    check_browser(&q.browser, None)?;
    let user_agent = state.profiles.user_agent(&q.browser);
    Ok(Json(
        ApiResponse::success("User agent retrieved successfully")
            .with_data(json!({ "user_agent": user_agent })),
    ))
}

pub async fn set_window_size(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WindowSizeRequest>,
) -> ApiResult {
    check_browser(&req.browser, None)?;
    let outcome = state.profiles.set_window_size(&req.browser, req.width, req.height)?;
    outcome_response("Window size set successfully", outcome)
}

pub async fn get_window_size(State(state): State<Arc<AppState>>, Query(q): Query<BrowserQuery>) -> ApiResult {
    check_browser(&q.browser, None)?;
    let size = state.profiles.window_size(&q.browser);
    Ok(Json(
        ApiResponse::success("Window size retrieved successfully")
            .with_data(json!({ "width": size.width, "height": size.height })),
    ))
}

pub async fn add_cookie(State(state): State<Arc<AppState>>, Json(req): Json<CookieRequest>) -> ApiResult {
    check_browser(&req.browser, None)?;
    let browser = req.browser.clone();
    let outcome = state.profiles.add_cookie(&browser, req.into())?;
    outcome_response("Cookie added successfully", outcome)
}

pub async fn remove_cookie(State(state): State<Arc<AppState>>, Query(q): Query<CookieQuery>) -> ApiResult {
    check_browser(&q.browser, None)?;
    let outcome = state.profiles.remove_cookie(&q.browser, &q.domain, &q.name)?;
    outcome_response("Cookie removed successfully", outcome)
}

pub async fn list_cookies(State(state): State<Arc<AppState>>, Query(q): Query<BrowserQuery>) -> ApiResult {
    check_browser(&q.browser, None)?;
    let cookies = state.profiles.cookies(&q.browser);
    Ok(Json(
        ApiResponse::success("Cookies retrieved successfully")
            .with_data(json!({ "cookies": cookies })),
    ))
}
