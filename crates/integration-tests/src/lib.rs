//! Test harness for the black-box API tests under `tests/`.
//!
//! [`TestApp`] wires the real router, services and adapters together with
//! the in-memory store, a mail recorder and a stub AI service listening on an
//! ephemeral local port.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ai_adapters::{AiClientConfig, HttpContentGenerator};
use api_adapters::{router, AppState, Metrics};
use async_trait::async_trait;
use auth_adapters::{Argon2PasswordService, JwtConfig, JwtTokenService};
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use fake::faker::internet::en::SafeEmail;
use fake::Fake;
use serde_json::{json, Value};
use services::{AppServices, Ports, ServiceOptions};
use storage_adapters::{MemoryRevocationStore, MemoryStore};
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const PASSWORD: &str = "password123";

/// Stand-in for the generative AI service.
#[derive(Default)]
pub struct StubAi {
    requests: Mutex<Vec<(String, Value)>>,
    failing: AtomicBool,
    served: AtomicUsize,
}

impl StubAi {
    /// Make every following call answer 503.
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Bodies received on `path` (`"post"` or `"reply"`), oldest first.
    pub fn bodies(&self, path: &str) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
            .collect()
    }

    fn record(&self, path: &str, body: Value) -> Option<usize> {
        self.requests.lock().unwrap().push((path.to_string(), body));
        if self.failing.load(Ordering::SeqCst) {
            return None;
        }
        Some(self.served.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

async fn stub_post(State(stub): State<Arc<StubAi>>, Json(body): Json<Value>) -> Response {
    match stub.record("post", body) {
        Some(n) => Json(json!({
            "title": format!("Post #{n}"),
            "content": format!("Generated post body #{n}"),
        }))
        .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "model overloaded").into_response(),
    }
}

async fn stub_reply(State(stub): State<Arc<StubAi>>, Json(body): Json<Value>) -> Response {
    match stub.record("reply", body) {
        Some(n) => Json(json!({ "content": format!("Generated reply #{n}") })).into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "model overloaded").into_response(),
    }
}

async fn spawn_stub(stub: Arc<StubAi>) -> String {
    let app = Router::new()
        .route("/post", post(stub_post))
        .route("/reply", post(stub_reply))
        .with_state(stub);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Keeps every verification code instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl domains::Mailer for RecordingMailer {
    async fn send_verification_code(&self, to: &str, code: &str) -> domains::Result<()> {
        self.sent.lock().unwrap().push((to.to_string(), code.to_string()));
        Ok(())
    }
}

/// A logged-in user.
pub struct Session {
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

pub struct TestApp {
    pub router: Router,
    pub ai: Arc<StubAi>,
    pub mailer: Arc<RecordingMailer>,
    pub metrics: Arc<Metrics>,
}

pub fn random_email() -> String {
    SafeEmail().fake()
}

impl TestApp {
    pub async fn spawn() -> Self {
        let ai = Arc::new(StubAi::default());
        let base_url = spawn_stub(ai.clone()).await;
        let generator = HttpContentGenerator::new(AiClientConfig {
            base_url,
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(1),
        })
        .unwrap();

        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let ports = Ports {
            users: store.clone(),
            boards: store.clone(),
            clones: store.clone(),
            subscriptions: store.clone(),
            posts: store.clone(),
            replies: store.clone(),
            verifications: store,
            generator: Arc::new(generator),
            passwords: Arc::new(Argon2PasswordService::new()),
            tokens: Arc::new(JwtTokenService::new(JwtConfig {
                secret: "integration-secret".into(),
                issuer: "ai-valley".into(),
                access_ttl: chrono::Duration::minutes(30),
                refresh_ttl: chrono::Duration::days(14),
            })),
            revocations: Arc::new(MemoryRevocationStore::new()),
            mailer: mailer.clone(),
        };
        let metrics = Arc::new(Metrics::new());
        let services = AppServices::new(ports, ServiceOptions::default());

        Self {
            router: router(AppState::new(services, metrics.clone())),
            ai,
            mailer,
            metrics,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request("GET", uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request("PATCH", uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.request("DELETE", uri, Some(token), body).await
    }

    pub async fn signup(&self, email: &str, nickname: &str) -> Value {
        let (status, user) = self
            .post(
                "/api/v1/users",
                None,
                json!({ "email": email, "password": PASSWORD, "nickname": nickname }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{user}");
        user
    }

    pub async fn login(&self, email: &str) -> Session {
        let (status, tokens) = self
            .post("/api/v1/auth/login", None, json!({ "email": email, "password": PASSWORD }))
            .await;
        assert_eq!(status, StatusCode::OK, "{tokens}");
        Session {
            email: email.to_string(),
            access_token: tokens["accessToken"].as_str().unwrap().to_string(),
            refresh_token: tokens["refreshToken"].as_str().unwrap().to_string(),
        }
    }

    /// Signs up a fresh user and logs in.
    pub async fn user(&self, nickname: &str) -> Session {
        let email = random_email();
        self.signup(&email, nickname).await;
        self.login(&email).await
    }

    pub async fn create_board(&self, session: &Session, name: &str) -> String {
        let (status, board) = self
            .post(
                "/api/v1/boards",
                Some(&session.access_token),
                json!({ "name": name, "description": format!("all about {name}") }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{board}");
        board["boardId"].as_str().unwrap().to_string()
    }

    pub async fn create_clone(&self, session: &Session, name: &str, board_ids: &[&str]) -> String {
        let (status, clone) = self
            .post(
                "/api/v1/clones",
                Some(&session.access_token),
                json!({
                    "name": name,
                    "description": format!("{name} persona"),
                    "boardIds": board_ids,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{clone}");
        clone["cloneId"].as_str().unwrap().to_string()
    }

    /// Generates a post through the AI stub; returns the post body.
    pub async fn create_post(&self, session: &Session, board_id: &str, clone_id: &str) -> Value {
        let (status, post) = self
            .post(
                &format!("/api/v1/boards/{board_id}/posts"),
                Some(&session.access_token),
                json!({ "cloneId": clone_id }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{post}");
        post
    }
}
