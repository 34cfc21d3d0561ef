//! In-process fake of the REST API used by the integration tests.

#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use console_api::ClientConfig;

pub const PASSWORD: &str = "secret";

#[derive(Default)]
pub struct FakeApi {
    issued: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub me_calls: AtomicUsize,
    pub refresh_fails: AtomicBool,
    pub menu_fails: AtomicBool,
    pub refresh_delay_ms: AtomicU64,
    /// Lifetimes (seconds) of the next issued access tokens; one hour when empty.
    pub next_ttls: Mutex<VecDeque<i64>>,
    /// Only this bearer token is accepted by protected endpoints.
    pub valid_token: Mutex<Option<String>>,
    pub refresh_bodies: Mutex<Vec<Value>>,
    pub error_reports: Mutex<Vec<Value>>,
    pub requests: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn push_ttl(&self, seconds: i64) {
        self.next_ttls.lock().unwrap().push_back(seconds);
    }

    pub fn revoke_tokens(&self) {
        *self.valid_token.lock().unwrap() = Some("revoked".to_string());
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: impl Into<String>) {
        self.requests.lock().unwrap().push(request.into());
    }

    fn issue_tokens(&self) -> Value {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let ttl = self.next_ttls.lock().unwrap().pop_front().unwrap_or(3600);
        let access_token = format!("access-{}", n);
        *self.valid_token.lock().unwrap() = Some(access_token.clone());

        json!({
            "data": {
                "access_token": access_token,
                "refresh_token": format!("refresh-{}", n),
                "access_expires_at": (Utc::now() + chrono::Duration::seconds(ttl)).to_rfc3339(),
                "refresh_expires_at": (Utc::now() + chrono::Duration::days(30)).to_rfc3339(),
            }
        })
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let bearer = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        let valid = self.valid_token.lock().unwrap();
        matches!((bearer, valid.as_deref()), (Some(b), Some(v)) if b == v)
    }
}

fn api_error(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(json!({"error": {"code": code, "message": message}}))).into_response()
}

fn unauthorized() -> Response {
    api_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Invalid or expired token")
}

type Api = State<Arc<FakeApi>>;

async fn login(State(api): Api, Json(body): Json<Value>) -> Response {
    api.login_calls.fetch_add(1, Ordering::SeqCst);
    api.record("POST /auth/login");
    if body["password"] != PASSWORD {
        return api_error(StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", "Invalid email or password");
    }
    Json(api.issue_tokens()).into_response()
}

async fn register(State(api): Api, Json(body): Json<Value>) -> Response {
    api.record("POST /auth/register");
    if body["full_name"].as_str().unwrap_or_default().is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "full_name is required");
    }
    Json(api.issue_tokens()).into_response()
}

async fn refresh(State(api): Api, Json(body): Json<Value>) -> Response {
    api.refresh_calls.fetch_add(1, Ordering::SeqCst);
    api.record("POST /auth/refresh");
    api.refresh_bodies.lock().unwrap().push(body);

    let delay = api.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    if api.refresh_fails.load(Ordering::SeqCst) {
        return api_error(StatusCode::UNAUTHORIZED, "INVALID_REFRESH_TOKEN", "Refresh token expired");
    }
    Json(api.issue_tokens()).into_response()
}

async fn me(State(api): Api, headers: HeaderMap) -> Response {
    api.me_calls.fetch_add(1, Ordering::SeqCst);
    api.record("GET /me");
    if !api.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "data": {
            "id": "u-1",
            "email": "ada@example.com",
            "full_name": "Ada Lovelace",
            "roles": [{"id": 1, "name": "admin"}]
        }
    }))
    .into_response()
}

async fn my_menu(State(api): Api, headers: HeaderMap) -> Response {
    api.record("GET /backoffice/me/menu");
    if !api.authorized(&headers) {
        return unauthorized();
    }
    if api.menu_fails.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "menu unavailable").into_response();
    }
    Json(json!({
        "data": [
            {"id": "users", "label": "Users", "path": "/admin/users", "sort_order": 2},
            {
                "id": "cms",
                "label": "Content",
                "sort_order": 1,
                "children": [{"id": "pages", "label": "Pages", "path": "/admin/cms/pages"}]
            }
        ]
    }))
    .into_response()
}

async fn roles(State(api): Api, headers: HeaderMap) -> Response {
    api.record("GET /backoffice/roles");
    if !api.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"data": [{"id": 1, "name": "admin"}, {"id": 2, "name": "editor"}]})).into_response()
}

async fn create_role(State(api): Api, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    api.record("POST /backoffice/roles");
    if !api.authorized(&headers) {
        return unauthorized();
    }
    (StatusCode::CREATED, Json(json!({"data": {"id": 3, "name": body["name"]}}))).into_response()
}

async fn add_permission(
    State(api): Api,
    headers: HeaderMap,
    Path(role_id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    api.record(format!("POST /backoffice/roles/{}/permissions {}", role_id, body));
    if !api.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"data": {"role_id": role_id, "permission_id": body["permission_id"]}})).into_response()
}

async fn assign_role(
    State(api): Api,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    api.record(format!("POST /backoffice/users/{}/roles {}", user_id, body));
    if !api.authorized(&headers) {
        return unauthorized();
    }
    StatusCode::NO_CONTENT.into_response()
}

const PAGE_ID: &str = "6f1c2a1e-3b9d-4a57-9a43-0c8d1f2e7b10";

fn page(slug: &str, status: &str) -> Value {
    json!({
        "id": PAGE_ID,
        "title": "About us",
        "slug": slug,
        "seo_description": null,
        "seo_keywords": null,
        "status": status,
        "created_at": "2030-01-01T00:00:00Z",
        "updated_at": "2030-01-01T00:00:00Z"
    })
}

async fn pages(State(api): Api) -> Response {
    api.record("GET /pages");
    Json(json!({"data": [page("about", "published")]})).into_response()
}

async fn page_by_slug(State(api): Api, Path(slug): Path<String>) -> Response {
    api.record(format!("GET /pages/{}", slug));
    if slug == "missing" {
        return api_error(StatusCode::NOT_FOUND, "PAGE_NOT_FOUND", "Page not found");
    }
    let mut detail = page(&slug, "published");
    detail["layout"] = json!([{
        "sort_order": 0,
        "css_class": "hero",
        "columns": [{"width_md": "12", "blocks": [{"type": "heading", "content": {"text": "Hello"}}]}]
    }]);
    Json(json!({"data": detail})).into_response()
}

async fn create_page(State(api): Api, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    api.record("POST /pages");
    if !api.authorized(&headers) {
        return unauthorized();
    }
    let mut created = page("about-us", "draft");
    created["title"] = body["title"].clone();
    (StatusCode::CREATED, Json(json!({"data": created}))).into_response()
}

async fn update_metadata(State(api): Api, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    api.record(format!("PUT /pages/{}/metadata {}", id, body));
    Json(json!({"message": "updated"})).into_response()
}

async fn update_layout(State(api): Api, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    let rows = body.as_array().map(Vec::len).unwrap_or_default();
    api.record(format!("PUT /pages/{}/layout rows={}", id, rows));
    Json(json!({"data": {"rows": rows}})).into_response()
}

async fn publish(State(api): Api, Path(id): Path<String>) -> Response {
    api.record(format!("POST /pages/{}/publish", id));
    Json(json!({"data": {"status": "published"}})).into_response()
}

async fn archive(State(api): Api, Path(id): Path<String>) -> Response {
    api.record(format!("POST /pages/{}/archive", id));
    StatusCode::NO_CONTENT.into_response()
}

async fn log_error(State(api): Api, Json(body): Json<Value>) -> Response {
    api.error_reports.lock().unwrap().push(body);
    (StatusCode::ACCEPTED, Json(json!({"data": null}))).into_response()
}

pub fn router(api: Arc<FakeApi>) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/refresh", post(refresh))
        .route("/me", get(me))
        .route("/backoffice/me/menu", get(my_menu))
        .route("/backoffice/roles", get(roles).post(create_role))
        .route("/backoffice/roles/{role_id}/permissions", post(add_permission))
        .route("/backoffice/users/{user_id}/roles", post(assign_role))
        .route("/pages", get(pages).post(create_page))
        .route("/pages/{id}", get(page_by_slug))
        .route("/pages/{id}/metadata", put(update_metadata))
        .route("/pages/{id}/layout", put(update_layout))
        .route("/pages/{id}/publish", post(publish))
        .route("/pages/{id}/archive", post(archive))
        .route("/logs/errors", post(log_error))
        .with_state(api)
}

/// Serve the fake API on an ephemeral port and return its base URL.
pub async fn spawn(api: Arc<FakeApi>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake API");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, router(api)).await.expect("serve fake API");
    });

    format!("http://{}", addr)
}

pub fn config(base_url: &str) -> ClientConfig {
    ClientConfig {
        request_timeout_secs: 5,
        ..ClientConfig::with_base_url(base_url)
    }
}

pub async fn wait_until<F>(receiver: &mut tokio::sync::watch::Receiver<Option<console_api::Session>>, f: F)
where
    F: FnMut(&Option<console_api::Session>) -> bool,
{
    tokio::time::timeout(Duration::from_secs(10), receiver.wait_for(f))
        .await
        .expect("session change within timeout")
        .expect("session channel open");
}
