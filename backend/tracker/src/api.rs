//! Axum REST API handlers.
//!
//! Every route maps to one control of the tracker front end. Failures come
//! back as an error [`Notification`](crate::notify::Notification) with a
//! matching status code (see [`TrackerError`]).

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::actions::Dashboard;
use crate::db;
use crate::errors::TrackerError;
use crate::events::EventRecord;
use crate::forms::{AddProductForm, AuthorityForm, CounterfeitForm, UpdateStatusForm};
use crate::session::Tab;
use crate::views::{
    ProductCountView, ProductHistoryView, SessionView, TabView, VerificationView, WriteOutcome,
};

pub struct ApiState {
    pub dashboard: Dashboard,
    pub pool: SqlitePool,
}

type ApiResult<T> = Result<Json<T>, TrackerError>;

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/session", get(get_session))
        .route("/session/connect", post(connect))
        .route("/session/tab", put(switch_tab))
        .route("/products", post(add_product))
        .route("/products/count", get(product_count))
        .route("/products/:id/status", post(update_status))
        .route("/products/:id/verify", get(verify_product))
        .route("/products/:id/history", get(product_history))
        .route("/products/:id/events", get(get_product_events))
        .route("/events", get(get_all_events))
        .route("/admin/manufacturers", post(authorize_manufacturer))
        .route("/admin/logistics", post(authorize_logistics))
        .route("/admin/counterfeit", post(mark_as_counterfeit))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventsResponse {
    pub product_id: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct AllEventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Deserialize)]
pub struct TabRequest {
    pub tab: Tab,
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /session/connect`
pub async fn connect(State(state): State<Arc<ApiState>>) -> ApiResult<SessionView> {
    Ok(Json(state.dashboard.connect().await?))
}

/// `GET /session`
pub async fn get_session(State(state): State<Arc<ApiState>>) -> ApiResult<SessionView> {
    Ok(Json(state.dashboard.session().await?))
}

/// `PUT /session/tab`
pub async fn switch_tab(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<TabRequest>,
) -> Json<TabView> {
    Json(state.dashboard.switch_tab(request.tab).await)
}

/// `POST /products`
pub async fn add_product(
    State(state): State<Arc<ApiState>>,
    Json(form): Json<AddProductForm>,
) -> ApiResult<WriteOutcome> {
    Ok(Json(state.dashboard.add_product(&form).await?))
}

/// `GET /products/count`
pub async fn product_count(State(state): State<Arc<ApiState>>) -> ApiResult<ProductCountView> {
    Ok(Json(state.dashboard.product_count().await?))
}

/// `POST /products/:id/status`
pub async fn update_status(
    State(state): State<Arc<ApiState>>,
    Path(product_id): Path<String>,
    Json(form): Json<UpdateStatusForm>,
) -> ApiResult<WriteOutcome> {
    Ok(Json(state.dashboard.update_status(&product_id, &form).await?))
}

/// `GET /products/:id/verify`
pub async fn verify_product(
    State(state): State<Arc<ApiState>>,
    Path(product_id): Path<String>,
) -> ApiResult<VerificationView> {
    Ok(Json(state.dashboard.verify(&product_id).await?))
}

/// `GET /products/:id/history`
pub async fn product_history(
    State(state): State<Arc<ApiState>>,
    Path(product_id): Path<String>,
) -> ApiResult<ProductHistoryView> {
    Ok(Json(state.dashboard.history(&product_id).await?))
}

/// `POST /admin/manufacturers`
pub async fn authorize_manufacturer(
    State(state): State<Arc<ApiState>>,
    Json(form): Json<AuthorityForm>,
) -> ApiResult<WriteOutcome> {
    Ok(Json(state.dashboard.authorize_manufacturer(&form).await?))
}

/// `POST /admin/logistics`
pub async fn authorize_logistics(
    State(state): State<Arc<ApiState>>,
    Json(form): Json<AuthorityForm>,
) -> ApiResult<WriteOutcome> {
    Ok(Json(state.dashboard.authorize_logistics(&form).await?))
}

/// `POST /admin/counterfeit`
pub async fn mark_as_counterfeit(
    State(state): State<Arc<ApiState>>,
    Json(form): Json<CounterfeitForm>,
) -> ApiResult<WriteOutcome> {
    Ok(Json(state.dashboard.mark_as_counterfeit(&form).await?))
}

/// `GET /products/:id/events`
///
/// Returns all indexed events for the given product identifier.
pub async fn get_product_events(
    State(state): State<Arc<ApiState>>,
    Path(product_id): Path<String>,
) -> ApiResult<EventsResponse> {
    let events = db::get_events_for_product(&state.pool, &product_id).await?;
    Ok(Json(EventsResponse {
        product_id,
        count: events.len(),
        events,
    }))
}

/// `GET /events`
///
/// Returns all indexed events across all products.
pub async fn get_all_events(State(state): State<Arc<ApiState>>) -> ApiResult<AllEventsResponse> {
    let events = db::get_all_events(&state.pool).await?;
    Ok(Json(AllEventsResponse {
        count: events.len(),
        events,
    }))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::actions::tests::dashboard;
    use crate::contract::tests::CONTRACT;
    use crate::db::tests::memory_pool;
    use crate::session::ConnectionManager;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chain_rpc::mock::MockProvider;
    use tower::ServiceExt;

    async fn app(dashboard: Dashboard) -> Router {
        router(Arc::new(ApiState {
            dashboard,
            pool: memory_pool().await,
        }))
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let mock = Arc::new(MockProvider::new());
        let response = app(dashboard(&mock))
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn connect_without_wallet_is_unavailable() {
        let no_wallet = Dashboard::new(ConnectionManager::new(
            None,
            CONTRACT,
            Duration::from_millis(1),
        ));
        let response = app(no_wallet)
            .await
            .oneshot(json_request("POST", "/session/connect", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn writes_without_session_are_unauthorized() {
        let mock = Arc::new(MockProvider::new());
        let response = app(dashboard(&mock))
            .await
            .oneshot(json_request(
                "POST",
                "/products",
                r#"{"name":"Widget","description":"Blue","manufacturing_location":"Lyon","price":"10"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn tab_switch_needs_no_wallet() {
        let no_wallet = Dashboard::new(ConnectionManager::new(
            None,
            CONTRACT,
            Duration::from_millis(1),
        ));
        let response = app(no_wallet)
            .await
            .oneshot(json_request("PUT", "/session/tab", r#"{"tab":"verify"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn empty_event_feed() {
        let mock = Arc::new(MockProvider::new());
        let response = app(dashboard(&mock))
            .await
            .oneshot(Request::get("/events").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
