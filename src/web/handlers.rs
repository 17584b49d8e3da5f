//! HTTP request handlers.

use super::sanitize::{escape_attr, sanitize_text_field, sanitize_url};
use super::AppState;
use crate::db::{DbError, Settings};
use crate::relay::{ContentSave, PollOutcome, Triggered, UpgradeNotice, UpgradeOutcome};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Form,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn store_failure(e: DbError) -> Response {
    tracing::error!("Store failure: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
}

fn accepted<T: Serialize>(body: T) -> Response {
    (StatusCode::ACCEPTED, Json(body)).into_response()
}

// ============================================================================
// Hooks
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SavePostResponse {
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggered: Option<Triggered>,
}

pub async fn handle_save_post(
    State(state): State<AppState>,
    Json(event): Json<ContentSave>,
) -> impl IntoResponse {
    match state.relay.on_content_saved(&event).await {
        Ok(triggered) => accepted(SavePostResponse {
            skipped: triggered.is_none(),
            triggered,
        }),
        Err(e) => store_failure(e),
    }
}

#[derive(Debug, Serialize)]
pub struct UpgradeResponse {
    pub outcome: UpgradeOutcome,
    pub triggered: Triggered,
}

pub async fn handle_upgrade_complete(
    State(state): State<AppState>,
    Json(notice): Json<UpgradeNotice>,
) -> impl IntoResponse {
    let outcome = UpgradeOutcome::from(notice);

    match state.relay.on_upgrade_complete(&outcome).await {
        Ok(triggered) => accepted(UpgradeResponse { outcome, triggered }),
        Err(e) => store_failure(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct PluginStatusRequest {
    #[serde(default)]
    pub plugin: String,
    #[serde(default)]
    pub activated: bool,
}

pub async fn handle_plugin_status(
    State(state): State<AppState>,
    Json(req): Json<PluginStatusRequest>,
) -> impl IntoResponse {
    match state
        .relay
        .on_plugin_status_change(&req.plugin, req.activated)
        .await
    {
        Ok(triggered) => accepted(triggered),
        Err(e) => store_failure(e),
    }
}

#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub outcome: PollOutcome,
}

/// One host request cycle: poll the pending test, if any.
pub async fn handle_init(State(state): State<AppState>) -> impl IntoResponse {
    match state.relay.poll_once().await {
        Ok(outcome) => Json(PollResponse { outcome }).into_response(),
        Err(e) => store_failure(e),
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Settings form as submitted. Unknown fields (such as the anti-forgery
/// token) are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsForm {
    #[serde(rename = "webpage-apikey", default)]
    pub webpage_apikey: Option<String>,
    #[serde(rename = "wpttest-url", default)]
    pub wpttest_url: Option<String>,
    #[serde(rename = "wpttest-tests", default)]
    pub wpttest_tests: Option<String>,
    #[serde(rename = "slack-url", default)]
    pub slack_url: Option<String>,
    #[serde(rename = "slack-channel", default)]
    pub slack_channel: Option<String>,
}

impl SettingsForm {
    pub fn sanitize(&self) -> Settings {
        let text = |v: &Option<String>| v.as_deref().map(sanitize_text_field).unwrap_or_default();
        let url = |v: &Option<String>| v.as_deref().map(sanitize_url).unwrap_or_default();

        Settings {
            webpage_apikey: self.webpage_apikey.as_deref().map(escape_attr).unwrap_or_default(),
            wpttest_url: url(&self.wpttest_url),
            wpttest_tests: text(&self.wpttest_tests),
            slack_url: url(&self.slack_url),
            slack_channel: text(&self.slack_channel),
        }
    }
}

pub async fn handle_save_settings(
    State(state): State<AppState>,
    Form(form): Form<SettingsForm>,
) -> impl IntoResponse {
    let settings = form.sanitize();

    match state.relay.store().save_settings(&settings) {
        Ok(()) => {
            tracing::info!("Settings saved");
            Json(settings.masked()).into_response()
        }
        Err(e) => store_failure(e),
    }
}

pub async fn handle_get_settings(State(state): State<AppState>) -> impl IntoResponse {
    match state.relay.store().get_settings() {
        Ok(settings) => Json(settings.masked()).into_response(),
        Err(e) => store_failure(e),
    }
}

/// The "run now" submission.
pub async fn handle_run_now(State(state): State<AppState>) -> impl IntoResponse {
    match state.relay.on_manual_trigger().await {
        Ok(triggered) => accepted(triggered),
        Err(e) => store_failure(e),
    }
}

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pub pending: bool,
    pub test_id: String,
    pub action: String,
    pub triggered_at: Option<DateTime<Utc>>,
    pub age_secs: Option<i64>,
}

pub async fn handle_get_pending(State(state): State<AppState>) -> impl IntoResponse {
    match state.relay.store().get_pending() {
        Ok(p) => Json(PendingResponse {
            pending: p.is_pending(),
            age_secs: p.age_secs(Utc::now()),
            test_id: p.test_id,
            action: p.action,
            triggered_at: p.triggered_at,
        })
        .into_response(),
        Err(e) => store_failure(e),
    }
}

pub async fn handle_health() -> impl IntoResponse {
    "ok"
}
