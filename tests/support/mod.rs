//! Purpose: In-process fake Pop store for integration tests.
//! Exports: `FakeStore`, `Recorded`, `TestResult`.
//! Role: Loopback axum server mimicking the remote collection endpoint shapes.
//! Invariants: Each store owns its own port, runtime thread, and state.
//! Invariants: The server shuts down and its thread is joined on drop.
#![allow(dead_code)]

use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use tokio::sync::oneshot;

pub type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Clone, Debug, PartialEq)]
pub struct Recorded {
    pub method: String,
    pub uri: String,
    pub content_type: Option<String>,
}

#[derive(Default)]
struct StoreState {
    pops: Vec<Value>,
    next_id: u64,
    requests: Vec<Recorded>,
    failing: bool,
}

type Shared = Arc<Mutex<StoreState>>;

pub struct FakeStore {
    base_url: String,
    state: Shared,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl FakeStore {
    pub fn start() -> TestResult<Self> {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;
        let state: Shared = Arc::new(Mutex::new(StoreState {
            next_id: 1,
            ..StoreState::default()
        }));
        let app = router(state.clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).expect("listener");
                let _ = axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await;
            });
        });

        Ok(Self {
            base_url: format!("http://{addr}/pops"),
            state,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Inserts a record directly, assigning the next key.
    pub fn seed(&self, mut pop: Value) -> u64 {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        pop["popid"] = json!(id);
        state.pops.push(pop);
        id
    }

    pub fn pops(&self) -> Vec<Value> {
        self.lock().pops.clone()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.lock().requests.clone()
    }

    /// While set, every request answers 500.
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        lock(&self.state)
    }
}

impl Drop for FakeStore {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// A base URL on a loopback port nothing is listening on.
pub fn unreachable_base_url() -> TestResult<String> {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        listener.local_addr()?.port()
    };
    Ok(format!("http://127.0.0.1:{port}/pops"))
}

fn lock(state: &Shared) -> MutexGuard<'_, StoreState> {
    state.lock().unwrap_or_else(|poison| poison.into_inner())
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/pops", get(list_pops).post(create_pop).put(update_pop))
        .route("/pops/", get(list_pops))
        .route("/pops/:id", get(get_pop).delete(delete_pop))
        .layer(middleware::from_fn_with_state(state.clone(), record_request))
        .with_state(state)
}

async fn record_request(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let failing = {
        let mut guard = lock(&state);
        guard.requests.push(Recorded {
            method: request.method().to_string(),
            uri: request.uri().to_string(),
            content_type: request
                .headers()
                .get("content-type")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
        });
        guard.failing
    };
    if failing {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "store unavailable"})),
        )
            .into_response();
    }
    next.run(request).await
}

#[derive(Deserialize)]
struct ListQuery {
    id: Option<u64>,
    name: Option<String>,
}

async fn list_pops(State(state): State<Shared>, Query(query): Query<ListQuery>) -> Json<Value> {
    let guard = lock(&state);
    let needle = query.name.map(|name| name.to_lowercase());
    let pops: Vec<Value> = guard
        .pops
        .iter()
        .filter(|pop| query.id.is_none_or(|id| pop["popid"] == json!(id)))
        .filter(|pop| {
            needle.as_ref().is_none_or(|needle| {
                pop["popName"]
                    .as_str()
                    .is_some_and(|name| name.to_lowercase().contains(needle.as_str()))
            })
        })
        .cloned()
        .collect();
    Json(Value::Array(pops))
}

async fn get_pop(State(state): State<Shared>, Path(id): Path<u64>) -> Response {
    let guard = lock(&state);
    match guard.pops.iter().find(|pop| pop["popid"] == json!(id)) {
        Some(pop) => Json(pop.clone()).into_response(),
        None => not_found(),
    }
}

async fn create_pop(State(state): State<Shared>, Json(mut pop): Json<Value>) -> Response {
    let mut guard = lock(&state);
    let id = guard.next_id;
    guard.next_id += 1;
    pop["popid"] = json!(id);
    guard.pops.push(pop.clone());
    (StatusCode::CREATED, Json(pop)).into_response()
}

async fn update_pop(State(state): State<Shared>, Json(pop): Json<Value>) -> Response {
    let mut guard = lock(&state);
    match guard
        .pops
        .iter_mut()
        .find(|existing| existing["popid"] == pop["popid"])
    {
        Some(existing) => {
            *existing = pop;
            StatusCode::OK.into_response()
        }
        None => not_found(),
    }
}

async fn delete_pop(State(state): State<Shared>, Path(id): Path<u64>) -> Response {
    let mut guard = lock(&state);
    let before = guard.pops.len();
    guard.pops.retain(|pop| pop["popid"] != json!(id));
    if guard.pops.len() == before {
        not_found()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"message": "pop not found"})),
    )
        .into_response()
}
