//! Integration tests for Order Desk.
//!
//! The dashboard is served in-process against [`FakeBackend`], a small axum
//! server that records every request and answers with canned JSON.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p order-desk-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session_gate` - Login, callback and logout
//! - `callback_keys` - Session keys left behind by the code exchange
//! - `dashboard_tabs` - Role-filtered tabs and access control
//! - `order_views` - Tab pages, dialogs and mutations

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use order_desk_admin::{AppState, DeskConfig};
use serde_json::{Value, json};
use tokio::net::TcpListener;

// ============================================================================
// Fake backend
// ============================================================================

/// One request received by the fake backend.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub user_id: Option<String>,
    pub body: String,
}

impl RecordedCall {
    /// Body parsed as JSON, or `Null` for empty and non-JSON bodies.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

/// A configured answer body.
#[derive(Debug, Clone)]
enum Canned {
    Json(Value),
    Text(String),
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<HashMap<String, (u16, Canned)>>,
    callback_delay: Mutex<Duration>,
}

/// In-process stand-in for the orders backend.
///
/// Unconfigured `GET`s answer `[]`, unconfigured mutations `{"success": true}`,
/// and `/api/callback` issues a token for `fb-{role}` unless overridden.
#[derive(Debug, Clone)]
pub struct FakeBackend {
    pub url: String,
    state: Arc<FakeState>,
}

impl FakeBackend {
    /// Bind on an ephemeral port and start serving.
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let router = Router::new().fallback(respond).with_state(Arc::clone(&state));
        let addr = serve(router).await;

        Self {
            url: format!("http://{addr}"),
            state,
        }
    }

    /// Answer `method path` with `status` and `body` from now on.
    pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
        self.canned(method, path, status, Canned::Json(body));
    }

    /// Answer `method path` with `status` and a plain-text `body`.
    pub fn respond_text(&self, method: &str, path: &str, status: u16, body: &str) {
        self.canned(method, path, status, Canned::Text(body.to_string()));
    }

    fn canned(&self, method: &str, path: &str, status: u16, body: Canned) {
        self.state
            .responses
            .lock()
            .expect("fake backend lock")
            .insert(route_key(method, path), (status, body));
    }

    /// Answer `GET path` with 200 and `body`.
    pub fn respond_get(&self, path: &str, body: Value) {
        self.respond("GET", path, 200, body);
    }

    /// Hold every code exchange for `delay` before answering.
    pub fn delay_callback(&self, delay: Duration) {
        *self.state.callback_delay.lock().expect("fake backend lock") = delay;
    }

    /// Every request received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().expect("fake backend lock").clone()
    }

    /// Requests received for `method path`.
    #[must_use]
    pub fn calls_to(&self, method: &str, path: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.path == path)
            .collect()
    }

    /// Forget recorded requests.
    pub fn clear_calls(&self) {
        self.state.calls.lock().expect("fake backend lock").clear();
    }
}

fn route_key(method: &str, path: &str) -> String {
    format!("{} {path}", method.to_uppercase())
}

async fn respond(
    State(state): State<Arc<FakeState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    state.calls.lock().expect("fake backend lock").push(RecordedCall {
        method: method.to_string(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        user_id: headers
            .get("user-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    if path == "/api/callback" {
        let delay = *state.callback_delay.lock().expect("fake backend lock");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    let configured = state
        .responses
        .lock()
        .expect("fake backend lock")
        .get(&route_key(method.as_str(), &path))
        .cloned();
    if let Some((status, body)) = configured {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return match body {
            Canned::Json(value) => (status, Json(value)).into_response(),
            Canned::Text(text) => (status, text).into_response(),
        };
    }

    match (method.as_str(), path.as_str()) {
        ("GET", "/") => Json(json!({"status": "ok"})).into_response(),
        ("GET", "/api/login") => {
            Json(json!({"auth_url": "https://provider.test/oauth?client_id=desk"})).into_response()
        }
        ("GET", "/api/callback") => {
            let role = params.get("role").cloned().unwrap_or_else(|| "staff".to_string());
            Json(json!({
                "access_token": format!("token-{}", params.get("code").cloned().unwrap_or_default()),
                "user": {"facebook_id": format!("fb-{role}"), "user_role": role},
            }))
            .into_response()
        }
        ("GET", _) => Json(json!([])).into_response(),
        _ => Json(json!({"success": true})).into_response(),
    }
}

// ============================================================================
// Dashboard
// ============================================================================

/// A dashboard served against a [`FakeBackend`], with a cookie-keeping client
/// that does not follow redirects.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub url: String,
    pub client: reqwest::Client,
}

impl Dashboard {
    /// Serve the dashboard on an ephemeral port.
    pub async fn start(backend: &FakeBackend) -> Self {
        let state = AppState::new(DeskConfig::for_backend(&backend.url))
            .expect("Failed to create application state");
        let addr = serve(order_desk_admin::app(state)).await;

        Self {
            url: format!("http://{addr}"),
            client: new_client(),
        }
    }

    /// Same dashboard, fresh browser (no cookies).
    #[must_use]
    pub fn new_browser(&self) -> Self {
        Self {
            url: self.url.clone(),
            client: new_client(),
        }
    }

    /// Full URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.url)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET")
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("Failed to send POST")
    }

    /// GET `path` and return the body text, asserting a 200.
    pub async fn page(&self, path: &str) -> String {
        let resp = self.get(path).await;
        assert_eq!(resp.status(), reqwest::StatusCode::OK, "GET {path}");
        resp.text().await.expect("Failed to read body")
    }

    /// Sign in through the provider round trip: start login, then return to
    /// `/` with `code`.
    pub async fn login(&self, owner: bool, code: &str) {
        let form: &[(&str, &str)] = if owner { &[("role", "owner")] } else { &[] };
        let resp = self.post_form("/auth/login", form).await;
        assert!(resp.status().is_redirection(), "login should redirect to the provider");

        let resp = self.get(&format!("/?code={code}")).await;
        assert_eq!(location(&resp), "/");
    }

    /// Sign in as an owner.
    pub async fn login_owner(&self) {
        self.login(true, "owner-code").await;
    }

    /// Sign in as staff.
    pub async fn login_staff(&self) {
        self.login(false, "staff-code").await;
    }
}

/// `Location` header of a redirect, or empty.
#[must_use]
pub fn location(resp: &reqwest::Response) -> String {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn new_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    addr
}
