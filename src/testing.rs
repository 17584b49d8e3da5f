//! In-process fake of the testing service and the chat webhook.
//!
//! Binds an axum router to an ephemeral local port, answers each path with
//! a scripted status and body, and records every request it receives.

use axum::{
    body::Bytes,
    extract::State,
    http::{StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A request seen by the fake.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub query: HashMap<String, String>,
    pub body: String,
}

impl Recorded {
    /// Decoded form fields of the body.
    pub fn form(&self) -> HashMap<String, String> {
        parse_pairs(&self.body)
    }
}

#[derive(Default)]
struct FakeState {
    requests: Mutex<Vec<Recorded>>,
    responses: Mutex<HashMap<String, (u16, String)>>,
}

pub struct FakeUpstream {
    pub base_url: String,
    state: Arc<FakeState>,
}

impl FakeUpstream {
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Script the answer for a path such as `/runtest.php`.
    pub fn respond(&self, path: &str, status: u16, body: &str) {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
    }

    pub fn webhook_url(&self) -> String {
        format!("{}/webhook", self.base_url)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }
}

async fn handle(State(state): State<Arc<FakeState>>, uri: Uri, body: Bytes) -> impl IntoResponse {
    let path = uri.path().to_string();
    state.requests.lock().unwrap().push(Recorded {
        path: path.clone(),
        query: parse_pairs(uri.query().unwrap_or_default()),
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let (status, body) = state
        .responses
        .lock()
        .unwrap()
        .get(&path)
        .cloned()
        .unwrap_or((404, String::new()));

    (StatusCode::from_u16(status).unwrap(), body)
}

fn parse_pairs(encoded: &str) -> HashMap<String, String> {
    let url = reqwest::Url::parse(&format!("http://fake/?{}", encoded)).unwrap();
    url.query_pairs().into_owned().collect()
}
