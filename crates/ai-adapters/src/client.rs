//! # HttpContentGenerator
//!
//! One `reqwest::Client` with a total and a connect timeout. Every call is a
//! single attempt: a timeout, transport error, non-2xx status or unreadable
//! body is logged and returned as `DomainError::ExternalService`.

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use domains::{
    ContentGenerator, DomainError, GeneratedPost, GeneratedReply, PostGenerationRequest,
    ReplyGenerationRequest, Result,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, info};

use crate::wire::{PostAnswer, PostBody, ReplyAnswer, ReplyBody};

/// Longest slice of an error body kept in logs and errors.
const ERROR_BODY_LIMIT: usize = 1024;

#[derive(Debug, Clone)]
pub struct AiClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for AiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

pub struct HttpContentGenerator {
    client: Client,
    base_url: String,
}

impl HttpContentGenerator {
    pub fn new(config: AiClientConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .context("failed to build AI service HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn call<B, A>(&self, path: &str, body: &B) -> anyhow::Result<A>
    where
        B: Serialize + Sync,
        A: DeserializeOwned,
    {
        let url = format!("{}/{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow!("request to {url} timed out")
                } else {
                    anyhow!(e).context(format!("request to {url} failed"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let text: String = text.chars().take(ERROR_BODY_LIMIT).collect();
            error!(%status, body = %text, %url, "AI service returned an error status");
            return Err(anyhow!("AI service error {status}: {text}"));
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("failed to read response from {url}"))?;
        serde_json::from_slice::<A>(&bytes).with_context(|| {
            let preview = String::from_utf8_lossy(&bytes[..bytes.len().min(200)]).into_owned();
            format!("malformed AI response body: {preview}")
        })
    }
}

fn external(kind: &str, err: anyhow::Error) -> DomainError {
    error!(kind, error = %format!("{err:#}"), "AI generation failed");
    DomainError::ExternalService(format!("{err:#}"))
}

#[async_trait]
impl ContentGenerator for HttpContentGenerator {
    async fn generate_post(&self, request: PostGenerationRequest) -> Result<GeneratedPost> {
        info!(
            clone_id = %request.clone_id,
            post_history = request.post_history.len(),
            reply_history = request.reply_history.len(),
            "requesting AI post"
        );
        let answer: PostAnswer = self
            .call("post", &PostBody::from(&request))
            .await
            .map_err(|e| external("post", e))?;
        info!(clone_id = %request.clone_id, title_len = answer.title.len(), "AI post received");
        Ok(GeneratedPost {
            title: answer.title,
            content: answer.content,
        })
    }

    async fn generate_reply(&self, request: ReplyGenerationRequest) -> Result<GeneratedReply> {
        info!(
            clone_id = %request.context.clone_id,
            post_history = request.context.post_history.len(),
            reply_history = request.context.reply_history.len(),
            "requesting AI reply"
        );
        let answer: ReplyAnswer = self
            .call("reply", &ReplyBody::from(&request))
            .await
            .map_err(|e| external("reply", e))?;
        info!(clone_id = %request.context.clone_id, "AI reply received");
        Ok(GeneratedReply {
            content: answer.content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use domains::{PostHistoryItem, HISTORY_LIMIT};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;
    use uuid::Uuid;

    type Seen = Arc<Mutex<Vec<Value>>>;

    /// Serves `router` on an ephemeral local port and returns its base URL.
    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn generator(base_url: String, timeout: Duration) -> HttpContentGenerator {
        HttpContentGenerator::new(AiClientConfig {
            base_url,
            timeout,
            connect_timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    fn post_request() -> PostGenerationRequest {
        PostGenerationRequest {
            clone_id: Uuid::now_v7(),
            clone_description: Some("stoic".into()),
            post_history: (0..HISTORY_LIMIT)
                .map(|i| PostHistoryItem {
                    board_name: "b".into(),
                    post_title: format!("t{i}"),
                    post_content: "c".into(),
                })
                .collect(),
            reply_history: vec![],
            board_description: Some("board".into()),
        }
    }

    #[tokio::test]
    async fn post_success_returns_title_and_content() {
        let seen: Seen = Arc::default();
        let router = Router::new()
            .route(
                "/post",
                post(|State(seen): State<Seen>, Json(body): Json<Value>| async move {
                    seen.lock().unwrap().push(body);
                    Json(json!({ "title": "Meditations", "content": "Waste no more time." }))
                }),
            )
            .with_state(seen.clone());
        let base = serve(router).await;

        let request = post_request();
        let clone_id = request.clone_id;
        let out = generator(base, Duration::from_secs(5))
            .generate_post(request)
            .await
            .unwrap();

        assert_eq!(out.title, "Meditations");
        assert_eq!(out.content, "Waste no more time.");
        let bodies = seen.lock().unwrap();
        assert_eq!(bodies[0]["cloneId"], clone_id.to_string());
        assert_eq!(bodies[0]["post_history"].as_array().unwrap().len(), HISTORY_LIMIT);
        assert_eq!(bodies[0]["board_description"], "board");
    }

    #[tokio::test]
    async fn reply_success_returns_content() {
        let router = Router::new().route(
            "/reply",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["post_title"], "Why?");
                Json(json!({ "content": "Because." }))
            }),
        );
        let base = serve(router).await;

        let out = generator(base, Duration::from_secs(5))
            .generate_reply(ReplyGenerationRequest {
                context: post_request(),
                post_title: "Why?".into(),
                post_content: "Tell me.".into(),
            })
            .await
            .unwrap();
        assert_eq!(out.content, "Because.");
    }

    #[tokio::test]
    async fn error_status_becomes_external_service_failure() {
        let router = Router::new().route(
            "/post",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "model overloaded") }),
        );
        let base = serve(router).await;

        let err = generator(base, Duration::from_secs(5))
            .generate_post(post_request())
            .await
            .unwrap_err();
        match err {
            DomainError::ExternalService(msg) => {
                assert!(msg.contains("503"), "{msg}");
                assert!(msg.contains("model overloaded"), "{msg}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let router = Router::new().route(
            "/post",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({ "title": "late", "content": "late" }))
            }),
        );
        let base = serve(router).await;

        let err = generator(base, Duration::from_millis(200))
            .generate_post(post_request())
            .await
            .unwrap_err();
        match err {
            DomainError::ExternalService(msg) => assert!(msg.contains("timed out"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let router = Router::new().route("/post", post(|| async { "definitely not json" }));
        let base = serve(router).await;

        let err = generator(base, Duration::from_secs(5))
            .generate_post(post_request())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "AI_SERVICE_FAILURE");
    }

    #[tokio::test]
    async fn unreachable_service_fails_fast() {
        let err = generator("http://127.0.0.1:9".into(), Duration::from_secs(2))
            .generate_post(post_request())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ExternalService(_)));
    }
}
