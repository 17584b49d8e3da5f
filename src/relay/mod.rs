//! The relay: turns site events into test runs and finished tests into
//! chat reports.
//!
//! Pending state lives in the option store as a single (identifier, action)
//! pair. Every trigger overwrites it, so only the most recent test is ever
//! reported. Poll cycles check that identifier and deliver the report once
//! the service says the test is complete.

mod events;
mod poller;

pub use events::*;
pub use poller::*;

use crate::db::{DbError, Store};
use crate::notify::Notifier;
use crate::wpt::{format_report, WptClient};

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const PLUGIN_STATUS_ACTION: &str = "Plugin activate / deactivate.";
pub const MANUAL_ACTION: &str = "Manual Trigger.";

/// What a trigger wrote to pending state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Triggered {
    pub test_id: Option<String>,
    pub action: Option<String>,
}

/// Result of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollOutcome {
    /// Nothing pending, no outbound calls made.
    Idle,
    /// A test is pending and stays pending (still running, or a call failed).
    Pending,
    /// The report was formatted, pending state cleared and the notifier called.
    Delivered,
}

pub struct Relay {
    store: Arc<Store>,
    wpt: WptClient,
    notifier: Notifier,
    poll_lock: Mutex<()>,
}

impl Relay {
    pub fn new(store: Arc<Store>, wpt: WptClient, notifier: Notifier) -> Self {
        Self {
            store,
            wpt,
            notifier,
            poll_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    // --- Test trigger ---

    /// Schedule a test of `target_url`, or of the configured URL when none
    /// is given. Any failure yields `None`.
    pub async fn fetch_test_id(&self, target_url: Option<&str>) -> Option<String> {
        let settings = match self.store.get_settings() {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Relay: Failed to load settings: {}", e);
                return None;
            }
        };

        let url = match target_url {
            Some(url) if !url.is_empty() => url,
            _ => settings.wpttest_url.as_str(),
        };

        match self
            .wpt
            .run_test(url, &settings.wpttest_tests, &settings.webpage_apikey)
            .await
        {
            Ok(test_id) => {
                tracing::info!("Relay: Scheduled test {} for {}", test_id, url);
                Some(test_id)
            }
            Err(e) => {
                tracing::warn!("Relay: Failed to schedule test for {}: {}", url, e);
                None
            }
        }
    }

    // --- Event hooks ---

    /// Content was saved. Revisions are ignored entirely.
    pub async fn on_content_saved(&self, event: &ContentSave) -> Result<Option<Triggered>, DbError> {
        if event.is_revision {
            tracing::debug!("Relay: Ignoring revision save of post {}", event.post_id);
            return Ok(None);
        }

        let test_id = self.fetch_test_id(Some(&event.permalink)).await;
        let action = event.action();

        self.store.set_pending_action(&action)?;
        self.store.set_pending_test_id(test_id.as_deref(), Utc::now())?;

        Ok(Some(Triggered {
            test_id,
            action: Some(action),
        }))
    }

    /// A plugin or theme install/upgrade finished.
    ///
    /// The identifier is written before the kind is looked at, so an
    /// upgrade of any other kind still replaces the pending test but leaves
    /// the action untouched.
    pub async fn on_upgrade_complete(&self, outcome: &UpgradeOutcome) -> Result<Triggered, DbError> {
        let test_id = self.fetch_test_id(None).await;
        self.store.set_pending_test_id(test_id.as_deref(), Utc::now())?;

        let action = outcome.action();
        if let Some(action) = &action {
            self.store.set_pending_action(action)?;
        }

        Ok(Triggered { test_id, action })
    }

    /// Any plugin was activated or deactivated.
    pub async fn on_plugin_status_change(&self, plugin: &str, activated: bool) -> Result<Triggered, DbError> {
        tracing::info!(
            "Relay: Plugin {} {}",
            plugin,
            if activated { "activated" } else { "deactivated" }
        );
        self.record(PLUGIN_STATUS_ACTION).await
    }

    /// An administrator asked for a test run.
    pub async fn on_manual_trigger(&self) -> Result<Triggered, DbError> {
        self.record(MANUAL_ACTION).await
    }

    async fn record(&self, action: &str) -> Result<Triggered, DbError> {
        let test_id = self.fetch_test_id(None).await;

        self.store.set_pending_test_id(test_id.as_deref(), Utc::now())?;
        self.store.set_pending_action(action)?;

        Ok(Triggered {
            test_id,
            action: Some(action.to_string()),
        })
    }

    // --- Report poller ---

    /// Run one poll cycle.
    ///
    /// A stuck identifier is polled again on every cycle with no limit;
    /// only a successful delivery or a new trigger replaces it.
    pub async fn poll_once(&self) -> Result<PollOutcome, DbError> {
        let _guard = self.poll_lock.lock().await;

        let pending = self.store.get_pending()?;
        if !pending.is_pending() {
            return Ok(PollOutcome::Idle);
        }

        let age = pending.age_secs(Utc::now());
        let test_id = pending.test_id;

        let status = match self.wpt.test_status(&test_id).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!("Relay: Status check for {} failed: {}", test_id, e);
                return Ok(PollOutcome::Pending);
            }
        };

        if !status.is_complete() {
            tracing::debug!(
                "Relay: Test {} not complete (status {} {}, age {:?}s)",
                test_id,
                status.status_code,
                status.status_text.as_deref().unwrap_or_default(),
                age
            );
            return Ok(PollOutcome::Pending);
        }

        let result = match self.wpt.json_result(&test_id).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Relay: Fetching result of {} failed: {}", test_id, e);
                return Ok(PollOutcome::Pending);
            }
        };

        // The action may have been replaced while the result was in flight.
        let action = self.store.get_pending()?.action;
        let text = format_report(&result, &action);

        self.store.clear_pending()?;
        tracing::info!("Relay: Test {} complete, sending report", test_id);

        self.send_message(&text).await;

        Ok(PollOutcome::Delivered)
    }

    // --- Notifier ---

    /// Post `text` to the configured webhook and channel.
    pub async fn send_message(&self, text: &str) {
        let settings = match self.store.get_settings() {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Relay: Failed to load settings for notification: {}", e);
                return;
            }
        };

        self.notifier
            .send_message(&settings.slack_url, &settings.slack_channel, text)
            .await;
    }
}
