use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use popcorn::app::{build_router, pump_completions, AppState};
use popcorn::controller::{Snapshot, View};
use popcorn::error::FetchError;
use popcorn::models::{MovieDetail, MovieSummary, SessionStatus};
use popcorn::omdb::MovieApi;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tower::util::ServiceExt;

type SearchOutcome = Result<Vec<MovieSummary>, FetchError>;

#[derive(Default)]
struct FakeOmdb {
    searches: Mutex<HashMap<String, SearchOutcome>>,
    held: Mutex<HashMap<String, oneshot::Receiver<SearchOutcome>>>,
    details: Mutex<HashMap<String, MovieDetail>>,
    detail_calls: Mutex<Vec<String>>,
}

impl FakeOmdb {
    fn with_search(self, query: &str, outcome: SearchOutcome) -> Self {
        self.searches
            .lock()
            .unwrap()
            .insert(query.to_string(), outcome);
        self
    }

    fn with_detail(self, detail: MovieDetail) -> Self {
        self.details
            .lock()
            .unwrap()
            .insert(detail.id.clone(), detail);
        self
    }

    /// The search for `query` stays pending until the returned sender fires.
    fn hold_search(&self, query: &str) -> oneshot::Sender<SearchOutcome> {
        let (tx, rx) = oneshot::channel();
        self.held.lock().unwrap().insert(query.to_string(), rx);
        tx
    }
}

#[async_trait::async_trait]
impl MovieApi for FakeOmdb {
    async fn search(&self, query: &str) -> Result<Vec<MovieSummary>, FetchError> {
        let held = self.held.lock().unwrap().remove(query);
        if let Some(rx) = held {
            return rx.await.unwrap_or(Err(FetchError::Cancelled));
        }
        self.searches
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Transport(format!("unexpected query {query}"))))
    }

    async fn get_detail(&self, id: &str) -> Result<MovieDetail, FetchError> {
        self.detail_calls.lock().unwrap().push(id.to_string());
        self.details
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound("Incorrect IMDb ID.".to_string()))
    }
}

fn summary(id: &str, title: &str, year: &str) -> MovieSummary {
    MovieSummary {
        id: id.to_string(),
        title: title.to_string(),
        year: year.to_string(),
        poster_url: format!("https://example.com/{id}.jpg"),
    }
}

fn inception() -> MovieDetail {
    MovieDetail {
        id: "tt1375666".to_string(),
        title: "Inception".to_string(),
        poster_url: "https://example.com/tt1375666.jpg".to_string(),
        year: "2010".to_string(),
        runtime_minutes: popcorn::omdb::parse_runtime("148 min"),
        critic_rating: 8.8,
        plot: "A thief who steals corporate secrets through dream-sharing.".to_string(),
        release_date: "16 Jul 2010".to_string(),
        actors: "Leonardo DiCaprio, Joseph Gordon-Levitt".to_string(),
        genre: "Action, Adventure, Sci-Fi".to_string(),
        director: "Christopher Nolan".to_string(),
    }
}

fn app_with(api: Arc<FakeOmdb>) -> Router {
    let (state, completions) = AppState::new(api);
    tokio::spawn(pump_completions(state.clone(), completions));
    build_router(state)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("failed to build request")
}

async fn state(app: &Router) -> Snapshot {
    let (status, body) = send(app, empty_request("GET", "/state")).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_value(body).expect("snapshot json")
}

async fn wait_for(app: &Router, what: &str, done: impl Fn(&Snapshot) -> bool) -> Snapshot {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let snap = state(app).await;
        if done(&snap) {
            return snap;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for {} (last state {:?})", what, snap);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn health_is_ok() {
    let app = app_with(Arc::new(FakeOmdb::default()));
    let (status, body) = send(&app, empty_request("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn search_select_rate_and_commit() {
    let api = Arc::new(
        FakeOmdb::default()
            .with_search("Inception", Ok(vec![summary("tt1375666", "Inception", "2010")]))
            .with_detail(inception()),
    );
    let app = app_with(api.clone());

    let (status, body) = send(&app, json_request("PUT", "/query", json!({"query": "Inception"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "Inception");

    let snap = wait_for(&app, "search results", |s| s.search.status == SessionStatus::Ready).await;
    assert_eq!(snap.search.result_count, 1);
    assert_eq!(snap.search.results[0].id, "tt1375666");

    let (status, _) = send(&app, empty_request("POST", "/select/tt1375666")).await;
    assert_eq!(status, StatusCode::OK);
    let snap = wait_for(&app, "detail", |s| s.detail.status == SessionStatus::Ready).await;
    assert_eq!(snap.view, View::ViewingDetail);
    assert_eq!(snap.detail.detail.as_ref().map(|d| d.runtime_minutes), Some(148));

    let (status, _) = send(&app, json_request("POST", "/rating", json!({"rating": 8}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, empty_request("POST", "/watched")).await;
    assert_eq!(status, StatusCode::CREATED);
    let snap: Snapshot = serde_json::from_value(body).unwrap();
    assert_eq!(snap.watched.len(), 1);
    assert_eq!(snap.watched[0].id, "tt1375666");
    assert_eq!(snap.watched[0].user_rating, 8);
    assert_eq!(snap.selected_id, None);
    assert_eq!(snap.view, View::Browsing);
    assert_eq!(snap.summary.count, 1);
    assert!((snap.summary.avg_runtime - 148.0).abs() < 1e-9);

    assert_eq!(*api.detail_calls.lock().unwrap(), vec!["tt1375666".to_string()]);
}

#[tokio::test]
async fn not_found_message_comes_from_service() {
    let api = Arc::new(FakeOmdb::default().with_search(
        "xyz123nomatch",
        Err(FetchError::NotFound("Movie not found!".to_string())),
    ));
    let app = app_with(api);

    send(&app, json_request("PUT", "/query", json!({"query": "xyz123nomatch"}))).await;
    let snap = wait_for(&app, "failure", |s| s.search.status == SessionStatus::Failed).await;
    assert_eq!(snap.search.error.as_deref(), Some("Movie not found!"));
    assert!(snap.search.results.is_empty());
}

#[tokio::test]
async fn superseded_search_never_lands() {
    let api = Arc::new(FakeOmdb::default().with_search(
        "superman",
        Ok(vec![summary("tt0078346", "Superman", "1978")]),
    ));
    let batman = api.hold_search("batman");
    let app = app_with(api);

    send(&app, json_request("PUT", "/query", json!({"query": "batman"}))).await;
    let snap = state(&app).await;
    assert_eq!(snap.search.status, SessionStatus::Loading);

    send(&app, json_request("PUT", "/query", json!({"query": "superman"}))).await;
    let snap = wait_for(&app, "superman", |s| s.search.status == SessionStatus::Ready).await;
    assert_eq!(snap.search.results[0].title, "Superman");

    let _ = batman.send(Ok(vec![summary("tt0096895", "Batman", "1989")]));
    tokio::time::sleep(Duration::from_millis(50)).await;
    let snap = state(&app).await;
    assert_eq!(snap.query, "superman");
    assert_eq!(snap.search.results.len(), 1);
    assert_eq!(snap.search.results[0].id, "tt0078346");
}

#[tokio::test]
async fn clearing_query_closes_detail() {
    let api = Arc::new(
        FakeOmdb::default()
            .with_search("Inception", Ok(vec![summary("tt1375666", "Inception", "2010")]))
            .with_detail(inception()),
    );
    let app = app_with(api);

    send(&app, json_request("PUT", "/query", json!({"query": "Inception"}))).await;
    wait_for(&app, "results", |s| s.search.status == SessionStatus::Ready).await;
    send(&app, empty_request("POST", "/select/tt1375666")).await;
    wait_for(&app, "detail", |s| s.detail.status == SessionStatus::Ready).await;

    let (_, body) = send(&app, json_request("PUT", "/query", json!({"query": ""}))).await;
    let snap: Snapshot = serde_json::from_value(body).unwrap();
    assert_eq!(snap.search.status, SessionStatus::Idle);
    assert!(snap.search.results.is_empty());
    assert_eq!(snap.search.error, None);
    assert_eq!(snap.view, View::Browsing);
    assert_eq!(snap.detail.status, SessionStatus::Idle);
}

#[tokio::test]
async fn toggling_selection_returns_to_list() {
    let api = Arc::new(
        FakeOmdb::default()
            .with_search("Inception", Ok(vec![summary("tt1375666", "Inception", "2010")]))
            .with_detail(inception()),
    );
    let app = app_with(api);

    send(&app, json_request("PUT", "/query", json!({"query": "Inception"}))).await;
    wait_for(&app, "results", |s| s.search.status == SessionStatus::Ready).await;

    let (_, body) = send(&app, empty_request("POST", "/select/tt1375666")).await;
    assert_eq!(body["view"], "viewing_detail");
    let (_, body) = send(&app, empty_request("POST", "/select/tt1375666")).await;
    assert_eq!(body["view"], "browsing");
    assert_eq!(body["selected_id"], Value::Null);
}

#[tokio::test]
async fn commit_errors_map_to_status_codes() {
    let api = Arc::new(
        FakeOmdb::default()
            .with_search("Inception", Ok(vec![summary("tt1375666", "Inception", "2010")]))
            .with_detail(inception()),
    );
    let app = app_with(api);

    let (status, _) = send(&app, empty_request("POST", "/watched")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    send(&app, json_request("PUT", "/query", json!({"query": "Inception"}))).await;
    wait_for(&app, "results", |s| s.search.status == SessionStatus::Ready).await;
    send(&app, empty_request("POST", "/select/tt1375666")).await;
    wait_for(&app, "detail", |s| s.detail.status == SessionStatus::Ready).await;

    let (status, _) = send(&app, json_request("POST", "/rating", json!({"rating": 11}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) = send(&app, empty_request("POST", "/watched")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    send(&app, json_request("POST", "/rating", json!({"rating": 9}))).await;
    let (status, _) = send(&app, empty_request("POST", "/watched")).await;
    assert_eq!(status, StatusCode::CREATED);

    send(&app, empty_request("POST", "/select/tt1375666")).await;
    let snap = wait_for(&app, "detail again", |s| s.detail.status == SessionStatus::Ready).await;
    assert_eq!(snap.detail.watched_rating, Some(9));
    let (status, body) = send(&app, json_request("POST", "/rating", json!({"rating": 2}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "error");
    let (status, _) = send(&app, empty_request("POST", "/watched")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(&app, empty_request("DELETE", "/watched/tt1375666")).await;
    assert_eq!(status, StatusCode::OK);
    let snap: Snapshot = serde_json::from_value(body).unwrap();
    assert!(snap.watched.is_empty());
    assert_eq!(snap.summary.count, 0);
    assert_eq!(snap.summary.avg_user_rating, 0.0);
}
