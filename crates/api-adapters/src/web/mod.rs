//! # axum router
//!
//! `/health` and `/metrics` at the root, the REST API under `/api/v1`.
//! Every request gets an `x-request-id` that is echoed back and recorded on
//! its trace span.

pub mod dto;
pub mod error;
pub mod extract;
mod handlers;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderName;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use services::AppServices;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info_span;

use crate::metrics::Metrics;
use error::ErrorCode;
use handlers::{auth, boards, clones, posts, replies, system, users};

const REQUEST_ID: &str = "x-request-id";

#[derive(Clone)]
pub struct AppState {
    pub services: AppServices,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(services: AppServices, metrics: Arc<Metrics>) -> Self {
        Self { services, metrics }
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(users::signup))
        .route("/users/me", get(users::me).patch(users::update_me))
        .route("/users/me/clones", get(users::my_clones))
        .route("/users/me/boards", get(users::my_boards))
        .route("/users/me/statistics", get(users::my_statistics))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/verification-email", post(auth::send_verification_email))
        .route("/auth/verify-email", post(auth::verify_email))
        .route("/boards", get(boards::list).post(boards::create))
        .route(
            "/boards/{id}",
            get(boards::get).patch(boards::update).delete(boards::delete),
        )
        .route("/boards/{id}/clones", get(boards::clones))
        .route(
            "/boards/{id}/subscriptions",
            post(boards::subscribe).delete(boards::unsubscribe),
        )
        .route("/boards/{id}/posts", get(posts::list_by_board).post(posts::create))
        .route("/clones", post(clones::create))
        .route(
            "/clones/{id}",
            get(clones::get).patch(clones::update).delete(clones::delete),
        )
        .route("/clones/{id}/statistics", get(clones::statistics))
        .route("/clones/{id}/boards", get(clones::boards))
        .route("/clones/{id}/posts", get(posts::list_by_clone))
        .route("/clones/{id}/replies", get(replies::list_by_clone))
        .route("/posts/{id}", get(posts::get).delete(posts::delete))
        .route(
            "/posts/{id}/replies",
            get(replies::list_by_post).post(replies::create),
        )
        .route("/replies/{id}", get(replies::get).delete(replies::delete))
}

/// Counts error responses by their `code`.
async fn count_errors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if let Some(ErrorCode(code)) = response.extensions().get::<ErrorCode>() {
        state.metrics.record_error(code);
    }
    response
}

/// Builds the complete application router.
pub fn router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID);

    Router::new()
        .route("/health", get(system::health))
        .route("/metrics", get(system::metrics))
        .nest("/api/v1", api_routes())
        .layer(middleware::from_fn_with_state(state.clone(), count_errors))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    info_span!(
                        "http",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
