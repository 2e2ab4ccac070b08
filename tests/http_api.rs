// HTTP-level tests for the review thread client
// Runs the store against an in-process axum backend and checks the exact
// requests it issues.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use rental_reviews::error::TRANSPORT_MESSAGE;
use rental_reviews::reviews::{ParentType, ReviewInput};
use rental_reviews::{HttpReviewApi, ReviewApi, ReviewError, ReviewThreadStore, Session, ThreadState};
use serde_json::{json, Value};

// ============================================================================
// Mock backend
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Recorded {
    method: &'static str,
    path: String,
    auth: Option<String>,
    body: Option<Value>,
}

struct Backend {
    requests: Mutex<Vec<Recorded>>,
    tree: Mutex<Value>,
    tree_is_html: Mutex<bool>,
}

type Shared = Arc<Backend>;

impl Backend {
    fn new(tree: Value) -> Shared {
        Arc::new(Backend {
            requests: Mutex::new(Vec::new()),
            tree: Mutex::new(tree),
            tree_is_html: Mutex::new(false),
        })
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, method: &'static str, path: String, headers: &HeaderMap, body: &str) -> Option<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body: Option<Value> = serde_json::from_str(body).ok();
        self.requests.lock().unwrap().push(Recorded {
            method,
            path,
            auth,
            body: body.clone(),
        });
        body
    }
}

/// Reject blank content the way the real backend does
fn check_content(body: &Option<Value>) -> Option<Response> {
    let content = body
        .as_ref()
        .and_then(|b| b.get("content"))
        .and_then(Value::as_str)
        .unwrap_or("");
    if content.trim().is_empty() || content == "server-says-no" {
        return Some(
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "errors": { "content": ["required"] } })),
            )
                .into_response(),
        );
    }
    None
}

async fn review_tree(State(b): State<Shared>, Path(id): Path<i64>, headers: HeaderMap) -> Response {
    b.record("GET", format!("/posts/{}/review-tree", id), &headers, "");
    if *b.tree_is_html.lock().unwrap() {
        return (StatusCode::OK, "<html>maintenance</html>").into_response();
    }
    let tree = b.tree.lock().unwrap().clone();
    Json(json!({ "data": tree })).into_response()
}

async fn post_detail(State(b): State<Shared>, Path(id): Path<i64>, headers: HeaderMap) -> Response {
    b.record("GET", format!("/posts/{}", id), &headers, "");
    Json(json!({
        "data": {
            "id": id,
            "title": "Dormitory bed",
            "images": [{ "secureUrl": "https://img.test/bed.jpg" }],
            "reviews": [
                { "id": 1, "userId": 2, "rating": 5 },
                { "id": 2, "userId": 3, "rating": 4 },
                { "id": 3, "userId": 4, "rating": 4 }
            ]
        }
    }))
    .into_response()
}

async fn create_review(
    State(b): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let body = b.record("POST", format!("/posts/{}/reviews", id), &headers, &body);
    check_content(&body).unwrap_or_else(|| StatusCode::CREATED.into_response())
}

async fn update_review(
    State(b): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let body = b.record("PUT", format!("/reviews/{}", id), &headers, &body);
    check_content(&body).unwrap_or_else(|| StatusCode::OK.into_response())
}

async fn delete_review(State(b): State<Shared>, Path(id): Path<i64>, headers: HeaderMap) -> Response {
    b.record("DELETE", format!("/reviews/{}", id), &headers, "");
    if id == 500 {
        return (StatusCode::INTERNAL_SERVER_ERROR, "oops").into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn reply_to_review(
    State(b): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let body = b.record("POST", format!("/reviews/{}/replies", id), &headers, &body);
    check_content(&body).unwrap_or_else(|| StatusCode::CREATED.into_response())
}

async fn reply_to_reply(
    State(b): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let body = b.record("POST", format!("/replies/{}/child", id), &headers, &body);
    check_content(&body).unwrap_or_else(|| StatusCode::CREATED.into_response())
}

/// Start the mock backend on a random port and return its base URL
async fn spawn_backend(backend: Shared) -> String {
    let app = Router::new()
        .route("/posts/:id/review-tree", get(review_tree))
        .route("/posts/:id", get(post_detail))
        .route("/posts/:id/reviews", post(create_review))
        .route("/reviews/:id", put(update_review).delete(delete_review))
        .route("/reviews/:id/replies", post(reply_to_review))
        .route("/replies/:id/child", post(reply_to_reply))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn sample_tree() -> Value {
    json!([{
        "id": 42,
        "postId": 5,
        "userId": 2,
        "rating": 4,
        "content": "Close to the market",
        "createdAt": "2024-04-01T08:00:00Z",
        "replies": [{
            "id": 43,
            "parentType": "review",
            "parentId": 42,
            "userId": 9,
            "content": "Agreed",
            "createdAt": "2024-04-02T08:00:00Z",
            "children": []
        }]
    }])
}

fn session() -> Session {
    Session::authenticated("tok-9", 9)
}

async fn setup(tree: Value) -> (Shared, ReviewThreadStore) {
    let backend = Backend::new(tree);
    let base_url = spawn_backend(backend.clone()).await;
    let api = Arc::new(HttpReviewApi::new(base_url));
    let store = ReviewThreadStore::new(api, session(), 5);
    store.load_tree().await;
    (backend, store)
}

fn tree_fetch() -> Recorded {
    Recorded {
        method: "GET",
        path: "/posts/5/review-tree".to_string(),
        auth: None,
        body: None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_load_tree_over_http() {
    let (backend, store) = setup(sample_tree()).await;

    assert_eq!(store.state(), ThreadState::Loaded);
    let snapshot = store.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.reviews()[0].replies[0].id, 43);
    assert_eq!(backend.requests(), vec![tree_fetch()]);
}

#[tokio::test]
async fn test_empty_tree_over_http() {
    let (_backend, store) = setup(json!([])).await;

    assert!(store.snapshot().is_empty());
    assert_eq!(store.last_error(), None);
}

#[tokio::test]
async fn test_non_json_tree_is_empty_forest() {
    let backend = Backend::new(sample_tree());
    *backend.tree_is_html.lock().unwrap() = true;
    let base_url = spawn_backend(backend.clone()).await;
    let store = ReviewThreadStore::new(Arc::new(HttpReviewApi::new(base_url)), session(), 5);

    store.load_tree().await;

    assert!(store.snapshot().is_empty());
    assert_eq!(store.last_error(), None);
}

#[tokio::test]
async fn test_submit_reply_issues_post_then_refetch() {
    let (backend, store) = setup(sample_tree()).await;

    store
        .submit_reply(ParentType::Review, 42, "nice place")
        .await
        .unwrap();

    assert_eq!(
        backend.requests()[1..],
        [
            Recorded {
                method: "POST",
                path: "/reviews/42/replies".to_string(),
                auth: Some("Bearer tok-9".to_string()),
                body: Some(json!({ "content": "nice place" })),
            },
            tree_fetch(),
        ]
    );
}

#[tokio::test]
async fn test_reply_to_reply_uses_child_endpoint() {
    let (backend, store) = setup(sample_tree()).await;

    store
        .submit_reply(ParentType::Reply, 43, "me too")
        .await
        .unwrap();

    let requests = backend.requests();
    assert_eq!(requests[1].method, "POST");
    assert_eq!(requests[1].path, "/replies/43/child");
    assert_eq!(requests[1].body, Some(json!({ "content": "me too" })));
}

#[tokio::test]
async fn test_submit_review_creates_with_rating_and_content() {
    let (backend, store) = setup(sample_tree()).await;

    store.submit_review(5, "Spotless").await.unwrap();

    let requests = backend.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].method, "POST");
    assert_eq!(requests[1].path, "/posts/5/reviews");
    assert_eq!(requests[1].auth.as_deref(), Some("Bearer tok-9"));
    assert_eq!(requests[1].body, Some(json!({ "rating": 5, "content": "Spotless" })));
    assert_eq!(requests[2], tree_fetch());
}

#[tokio::test]
async fn test_edit_review_issues_put() {
    let (backend, store) = setup(sample_tree()).await;

    store
        .edit_review(7, ReviewInput::new(3, "updated"))
        .await
        .unwrap();

    let requests = backend.requests();
    assert_eq!(requests[1].method, "PUT");
    assert_eq!(requests[1].path, "/reviews/7");
    assert_eq!(requests[1].body, Some(json!({ "rating": 3, "content": "updated" })));
    assert_eq!(requests[2], tree_fetch());
}

#[tokio::test]
async fn test_delete_review_issues_delete() {
    let (backend, store) = setup(sample_tree()).await;

    store.delete_review(42).await.unwrap();

    let requests = backend.requests();
    assert_eq!(requests[1].method, "DELETE");
    assert_eq!(requests[1].path, "/reviews/42");
    assert_eq!(requests[1].auth.as_deref(), Some("Bearer tok-9"));
    assert_eq!(requests[2], tree_fetch());
}

#[tokio::test]
async fn test_422_surfaces_first_field_error() {
    let (backend, store) = setup(sample_tree()).await;
    let before = store.snapshot();

    let err = store
        .submit_reply(ParentType::Review, 42, "server-says-no")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ReviewError::ServerValidation {
            status: 422,
            message: "required".to_string()
        }
    );
    assert_eq!(store.last_error().as_deref(), Some("required"));
    assert!(Arc::ptr_eq(&before, &store.snapshot()));
    // No re-fetch after the failed mutation
    assert_eq!(backend.requests().len(), 2);
}

#[tokio::test]
async fn test_500_is_transport_error() {
    let (backend, store) = setup(sample_tree()).await;

    let err = store.delete_review(500).await.unwrap_err();

    assert!(matches!(err, ReviewError::Transport(_)));
    assert_eq!(store.last_error().as_deref(), Some(TRANSPORT_MESSAGE));
    assert_eq!(backend.requests().len(), 2);
}

#[tokio::test]
async fn test_unreachable_backend() {
    // Bind and release a port so nothing listens on it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = ReviewThreadStore::new(
        Arc::new(HttpReviewApi::new(format!("http://{}", addr))),
        session(),
        5,
    );

    store.load_tree().await;
    assert!(store.snapshot().is_empty());
    assert_eq!(store.last_error(), None);

    let err = store.submit_review(4, "hello").await.unwrap_err();
    assert!(matches!(err, ReviewError::Transport(_)));
    assert_eq!(store.last_error().as_deref(), Some(TRANSPORT_MESSAGE));
}

#[tokio::test]
async fn test_fetch_post_summary_over_http() {
    let backend = Backend::new(json!([]));
    let base_url = spawn_backend(backend.clone()).await;
    let api = HttpReviewApi::new(base_url);

    let post = api.fetch_post(5).await.unwrap();
    assert_eq!(post.title.as_deref(), Some("Dormitory bed"));
    assert_eq!(
        post.cover_image_url("https://cdn.test").as_deref(),
        Some("https://img.test/bed.jpg")
    );

    let summary = post.rating_summary();
    assert_eq!(summary.count, 3);
    assert_eq!(summary.average, Some(4.3));
}
