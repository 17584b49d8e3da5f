//! Web server module: the endpoints the host application calls.

mod handlers;
mod sanitize;

use crate::config::ServerConfig;
use crate::relay::Relay;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub relay: Arc<Relay>,
}

/// Web server for the relay.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new server with the given dependencies.
    pub fn new(config: ServerConfig, relay: Arc<Relay>) -> Self {
        Self {
            state: AppState { config, relay },
        }
    }

    /// Build the router with all routes.
    fn routes(&self) -> Router {
        router(self.state.clone())
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

    Router::new()
        // Host events
        .route("/hooks/save-post", post(handlers::handle_save_post))
        .route("/hooks/upgrade-complete", post(handlers::handle_upgrade_complete))
        .route("/hooks/plugin-status", post(handlers::handle_plugin_status))
        .route("/hooks/init", post(handlers::handle_init))
        // Settings form submissions
        .route("/settings", post(handlers::handle_save_settings))
        .route("/run", post(handlers::handle_run_now))
        // API
        .route("/api/settings", get(handlers::handle_get_settings))
        .route("/api/pending", get(handlers::handle_get_pending))
        .route("/healthz", get(handlers::handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::tests::{relay_for, RESULT_BODY};
    use crate::testing::FakeUpstream;
    use serde_json::Value;

    /// Serve the router on an ephemeral port and return its base URL.
    async fn serve(relay: Arc<Relay>) -> String {
        let state = AppState {
            config: ServerConfig::default(),
            relay,
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router(state)).await;
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_settings_form_roundtrip() {
        let fake = FakeUpstream::start().await;
        let base = serve(Arc::new(relay_for(&fake))).await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/settings", base))
            .form(&[
                ("webpage-apikey", "A.0123456789"),
                ("wpttest-url", "https://example.com"),
                ("wpttest-tests", "2"),
                ("slack-url", "https://hooks.slack.com/services/T/B/X"),
                ("slack-channel", "#general"),
                ("webpagetest-slack", "nonce"),
            ])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = client
            .get(format!("{}/api/settings", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["webpage_apikey"], "********6789");
        assert_eq!(body["wpttest_tests"], "2");
        assert_eq!(body["slack_channel"], "#general");
    }

    #[tokio::test]
    async fn test_hooks_then_init_delivers() {
        let fake = FakeUpstream::start().await;
        fake.respond("/runtest.php", 200, r#"{"statusCode":200,"data":{"testId":"T9"}}"#);
        fake.respond("/testStatus.php", 200, r#"{"statusCode":200}"#);
        fake.respond("/jsonResult.php", 200, RESULT_BODY);
        fake.respond("/webhook", 200, "ok");

        let base = serve(Arc::new(relay_for(&fake))).await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/hooks/upgrade-complete", base))
            .json(&serde_json::json!({
                "upgrader": "Theme_Upgrader",
                "result": {"destination_name": "twentytwentyfour"}
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 202);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["outcome"]["kind"], "theme");
        assert_eq!(body["triggered"]["test_id"], "T9");

        let pending: Value = client
            .get(format!("{}/api/pending", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(pending["pending"], true);
        assert_eq!(pending["action"], "twentytwentyfour installed/updated.");

        let poll: Value = client
            .post(format!("{}/hooks/init", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(poll["outcome"], "delivered");
        assert_eq!(fake.requests_to("/webhook").len(), 1);
    }

    #[tokio::test]
    async fn test_revision_hook_is_skipped() {
        let fake = FakeUpstream::start().await;
        let base = serve(Arc::new(relay_for(&fake))).await;

        let resp = reqwest::Client::new()
            .post(format!("{}/hooks/save-post", base))
            .json(&serde_json::json!({
                "post_id": 5,
                "post_type": "revision",
                "permalink": "https://example.com/?p=5",
                "is_revision": true
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 202);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["skipped"], true);
        assert!(fake.requests().is_empty());
    }

    #[tokio::test]
    async fn test_run_now_and_plugin_status() {
        let fake = FakeUpstream::start().await;
        fake.respond("/runtest.php", 200, r#"{"statusCode":200,"data":{"testId":"T1"}}"#);
        let relay = Arc::new(relay_for(&fake));
        let base = serve(relay.clone()).await;
        let client = reqwest::Client::new();

        let resp = client.post(format!("{}/run", base)).send().await.unwrap();
        assert_eq!(resp.status(), 202);
        assert_eq!(relay.store().get_pending().unwrap().action, "Manual Trigger.");

        let resp = client
            .post(format!("{}/hooks/plugin-status", base))
            .json(&serde_json::json!({"plugin": "akismet/akismet.php", "activated": false}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 202);
        assert_eq!(
            relay.store().get_pending().unwrap().action,
            "Plugin activate / deactivate."
        );
        assert_eq!(fake.requests_to("/runtest.php").len(), 2);
    }
}
