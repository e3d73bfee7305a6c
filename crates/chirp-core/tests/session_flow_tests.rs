//! Session lifecycle tests against a stub backend.
//!
//! The stub speaks the same contract as the real service: bearer tokens on
//! authorized routes, `{"detail": ...}` error bodies, 401 for bad or
//! expired tokens.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use chirp_core::store::MemoryStore;
use chirp_core::{ApiClient, ApiError, KeyValueStore, Session, SessionManager, SessionState};

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

#[derive(Clone, Default)]
struct Backend {
    hits: Arc<AtomicUsize>,
    auth_headers: Arc<Mutex<Vec<String>>>,
}

impl Backend {
    fn check(&self, headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        let value = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.auth_headers.lock().unwrap().push(value.clone());
        match value.as_str() {
            "Bearer tok-valid" | "Bearer tok-signup" => Ok(()),
            _ => Err(detail(StatusCode::UNAUTHORIZED, "Token has expired")),
        }
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

fn detail(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "detail": message })))
}

async fn login(State(backend): State<Backend>, Json(body): Json<Value>) -> Reply {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    if body["password"] == "password123" {
        Ok(Json(json!({"message": "Login successful", "token": "tok-valid"})))
    } else {
        Err(detail(StatusCode::UNAUTHORIZED, "Invalid email or password."))
    }
}

async fn signup(State(backend): State<Backend>, Json(body): Json<Value>) -> Reply {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    match body["username"].as_str() {
        Some("taken") => Err(detail(StatusCode::BAD_REQUEST, "Email is already registered.")),
        Some("legacy") => Ok(Json(
            json!({"message": "User registered successfully", "user_id": "65a1f0c2"}),
        )),
        _ => Ok(Json(
            json!({"message": "User registered successfully", "token": "tok-signup"}),
        )),
    }
}

async fn profile(State(backend): State<Backend>, headers: HeaderMap) -> Reply {
    backend.check(&headers)?;
    Ok(Json(json!({"username": "alice", "followers": ["bob"], "following": []})))
}

async fn feed(State(backend): State<Backend>, headers: HeaderMap) -> Reply {
    backend.check(&headers)?;
    Ok(Json(json!([
        {"id": "1", "username": "bob", "content": "first", "timestamp": "2025-03-04T14:05:00Z"},
        {"id": 2, "username": "carol", "content": "second", "timestamp": "2025-03-04T15:00:00"}
    ])))
}

#[derive(serde::Deserialize)]
struct SearchParams {
    prefix: String,
}

async fn search(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Reply {
    backend.check(&headers)?;
    let names: Vec<&str> = ["alice", "alicia", "bob"]
        .into_iter()
        .filter(|n| n.starts_with(&params.prefix))
        .collect();
    Ok(Json(json!(names)))
}

async fn tweet(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    backend.check(&headers)?;
    if body["content"].as_str().unwrap_or_default().is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": [{"loc": ["body", "content"], "msg": "field required"}]})),
        ));
    }
    Ok(Json(json!({"message": "Tweet posted"})))
}

async fn follow(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    backend.check(&headers)?;
    match body["target_username"].as_str() {
        Some("ghost") => Err(detail(StatusCode::NOT_FOUND, "User not found")),
        Some(target) => Ok(Json(json!({"message": format!("Now following {}", target)}))),
        None => Err(detail(StatusCode::BAD_REQUEST, "target_username required")),
    }
}

async fn unfollow(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    backend.check(&headers)?;
    let target = body["target_username"].as_str().unwrap_or_default();
    Ok(Json(json!({"message": format!("Unfollowed {}", target)})))
}

async fn spawn_backend() -> (String, Backend) {
    let backend = Backend::default();
    let router = Router::new()
        .route("/login", post(login))
        .route("/signup", post(signup))
        .route("/profile", get(profile))
        .route("/feed", get(feed))
        .route("/search", get(search))
        .route("/tweet", post(tweet))
        .route("/follow", post(follow))
        .route("/unfollow", post(unfollow))
        .with_state(backend.clone());
    (serve(router).await, backend)
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client_for(base: &str, store: Arc<MemoryStore>) -> ApiClient {
    let session = Arc::new(SessionManager::new(store));
    ApiClient::with_timeout(base, Duration::from_secs(5), session).unwrap()
}

#[tokio::test]
async fn test_login_then_authorized_calls() {
    let (base, backend) = spawn_backend().await;
    let api = client_for(&base, Arc::new(MemoryStore::new()));

    let message = api.login("alice@example.com", "password123").await.unwrap();
    assert_eq!(message, "Login successful");
    assert_eq!(
        api.session().current(),
        Some(Session::new("tok-valid", "alice@example.com"))
    );

    let profile = api.profile().await.unwrap();
    assert_eq!(profile.username, "alice");
    assert_eq!(profile.follower_count(), Some(1));

    let feed = api.feed().await.unwrap();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[1].id, "2");

    let hits = api.search("ali").await.unwrap();
    let names: Vec<&str> = hits.iter().map(|h| h.username()).collect();
    assert_eq!(names, vec!["alice", "alicia"]);

    assert_eq!(api.tweet("hello world").await.unwrap(), "Tweet posted");
    assert_eq!(api.follow("bob").await.unwrap(), "Now following bob");
    assert_eq!(api.unfollow("bob").await.unwrap(), "Unfollowed bob");

    // Every authorized request used the same header convention
    let headers = backend.auth_headers.lock().unwrap().clone();
    assert_eq!(headers.len(), 6);
    assert!(headers.iter().all(|h| h == "Bearer tok-valid"));
}

#[tokio::test]
async fn test_bad_login_keeps_existing_session() {
    let (base, _backend) = spawn_backend().await;
    let api = client_for(&base, Arc::new(MemoryStore::new()));
    api.session().store("tok-valid", "alice@example.com");

    let err = api.login("alice@example.com", "wrong").await.unwrap_err();
    assert!(err.is_auth_failure());
    assert!(!err.requires_login());
    assert_eq!(err.to_string(), "Invalid email or password.");
    assert_eq!(
        api.session().current(),
        Some(Session::new("tok-valid", "alice@example.com"))
    );
}

#[tokio::test]
async fn test_signup_variants() {
    let (base, _backend) = spawn_backend().await;

    let api = client_for(&base, Arc::new(MemoryStore::new()));
    let message = api.signup("alice", Some("alice@example.com"), "password123").await.unwrap();
    assert_eq!(message, "User registered successfully");
    assert_eq!(api.session().current(), Some(Session::new("tok-signup", "alice")));
    assert!(api.profile().await.is_ok());

    // No token in the response: registered but still logged out
    let legacy = client_for(&base, Arc::new(MemoryStore::new()));
    legacy.signup("legacy", None, "password123").await.unwrap();
    assert_eq!(legacy.session().state(), SessionState::Unauthenticated);

    let err = legacy.signup("taken", None, "password123").await.unwrap_err();
    assert_eq!(err.to_string(), "Email is already registered.");
}

#[tokio::test]
async fn test_rejected_token_expires_session() {
    let (base, backend) = spawn_backend().await;
    let store = Arc::new(MemoryStore::new());
    let api = client_for(&base, store.clone());
    api.session().store("tok-stale", "alice");

    let err = api.feed().await.unwrap_err();
    assert!(matches!(err, ApiError::SessionExpired));
    assert_eq!(api.session().current(), None);
    assert!(store.is_empty());

    // Nothing else reaches the server until the user logs in again
    let hits = backend.hits();
    assert!(matches!(api.tweet("hi").await, Err(ApiError::Unauthenticated)));
    assert_eq!(backend.hits(), hits);
}

#[tokio::test]
async fn test_concurrent_home_load_on_expiry() {
    let (base, backend) = spawn_backend().await;
    let api = client_for(&base, Arc::new(MemoryStore::new()));
    api.session().store("tok-stale", "alice");

    let err = api.home().await.unwrap_err();
    assert!(matches!(err, ApiError::SessionExpired));
    assert_eq!(api.session().current(), None);
    assert!(backend.hits() >= 1);
}

#[tokio::test]
async fn test_home_loads_profile_and_feed() {
    let (base, _backend) = spawn_backend().await;
    let api = client_for(&base, Arc::new(MemoryStore::new()));
    api.login("alice@example.com", "password123").await.unwrap();

    let (profile, feed) = api.home().await.unwrap();
    assert_eq!(profile.username, "alice");
    assert_eq!(feed[0].content, "first");
}

#[tokio::test]
async fn test_request_errors_pass_through_unchanged() {
    let (base, _backend) = spawn_backend().await;
    let api = client_for(&base, Arc::new(MemoryStore::new()));
    api.login("alice@example.com", "password123").await.unwrap();
    let before = api.session().current();

    let err = api.follow("ghost").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(err.to_string(), "Not found: User not found");

    let err = api.tweet("").await.unwrap_err();
    assert_eq!(err.to_string(), "field required");

    assert_eq!(api.session().current(), before);
}

#[tokio::test]
async fn test_timeout_is_not_an_auth_error() {
    let router = Router::new().route(
        "/profile",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({"username": "alice"}))
        }),
    );
    let base = serve(router).await;

    let session = Arc::new(SessionManager::new(MemoryStore::new()));
    session.store("tok-valid", "alice");
    let api = ApiClient::with_timeout(&base, Duration::from_millis(200), session).unwrap();

    let err = api.profile().await.unwrap_err();
    assert!(err.is_timeout());
    assert!(!err.requires_login());
    assert!(api.session().is_authenticated());
}

#[tokio::test]
async fn test_session_survives_restart() {
    let (base, _backend) = spawn_backend().await;
    let store = Arc::new(MemoryStore::new());

    let first = client_for(&base, store.clone());
    first.login("alice@example.com", "password123").await.unwrap();
    assert_eq!(store.get("token").unwrap().as_deref(), Some("tok-valid"));

    let second = client_for(&base, store.clone());
    assert!(second.session().load());
    assert_eq!(second.profile().await.unwrap().username, "alice");

    second.logout();
    second.logout();
    assert!(store.is_empty());
    assert!(!client_for(&base, store).session().load());
}

#[tokio::test]
async fn test_invalid_json_is_reported() {
    let router = Router::new().route("/feed", get(|| async { "definitely not json" }));
    let base = serve(router).await;
    let api = client_for(&base, Arc::new(MemoryStore::new()));
    api.session().store("tok-valid", "alice");

    let err = api.feed().await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
    assert!(api.session().is_authenticated());
}
