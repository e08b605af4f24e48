// In-process stub of the QuizHub backend for integration tests.
//
// Serves the handful of routes the client exercises, with canned bodies
// that cover both wire shapes (the `{data, message, success}` envelope and
// bare arrays) plus switchable failure modes. Every request is recorded so
// tests can assert on observed headers.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};

pub const LOGIN_EMAIL: &str = "a@b.c";
pub const LOGIN_PASSWORD: &str = "P@ssw0rd";
pub const DRIFTED_SCHEDULE: &str = "2025-01-01T10:00:00Z";

/// Per-test behavior switches
#[derive(Debug, Clone, Default)]
pub struct StubOptions {
    /// Status to fail GET /quiz/completed with (e.g. 500)
    pub fail_completed_with: Option<u16>,
    /// GET /group answers 401 "jwt expired"
    pub group_unauthorized: bool,
    /// Artificial latency on GET /quiz/incomming, for timeout coverage
    pub incoming_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

pub struct StubState {
    pub options: StubOptions,
    pub seen: Mutex<Vec<RecordedRequest>>,
}

pub struct StubServer {
    pub base_url: String,
    pub port: u16,
    pub state: Arc<StubState>,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl StubServer {
    pub async fn spawn(options: StubOptions) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let addr: SocketAddr = ([127, 0, 0, 1], port).into();
        let state = Arc::new(StubState {
            options,
            seen: Mutex::new(Vec::new()),
        });

        // Run the stub on its own current-thread runtime. `axum::serve` spawns
        // a detached task per connection, so merely aborting the accept loop
        // would leave reqwest's pooled keep-alive connection alive and
        // serviceable. Owning the runtime lets Drop tear down every connection
        // synchronously (graceful shutdown + join), so a dropped server really
        // is gone for the next request.
        let app_state = state.clone();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), String>>();
        let thread = std::thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = ready_tx.send(Err(format!("failed to build stub runtime: {e}")));
                    return;
                }
            };
            rt.block_on(async move {
                let app = Router::new()
                    .route("/api/auth/login", post(login))
                    .route("/api/auth/register", post(register))
                    .route("/api/quiz/incomming", get(incoming_quizzes))
                    .route("/api/quiz/completed", get(completed_quizzes))
                    .route("/api/group", get(groups))
                    .route("/api/student/top-five", get(top_students))
                    .fallback(not_found)
                    .layer(middleware::from_fn_with_state(app_state.clone(), record))
                    .with_state(app_state);

                let listener = match tokio::net::TcpListener::bind(addr).await {
                    Ok(listener) => listener,
                    Err(e) => {
                        let _ = ready_tx.send(Err(format!("failed to bind stub server: {e}")));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                let _ = axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown_rx.await;
                    })
                    .await;
            });
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(anyhow::anyhow!(e)),
            Err(_) => return Err(anyhow::anyhow!("stub server thread exited before binding")),
        }

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}/api", port),
            port,
            state,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn requests_for(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        // Signal graceful shutdown, then block until the server's runtime
        // thread has fully torn down every connection. After this returns the
        // port is released and any pooled connection is closed.
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

async fn record(
    State(state): State<Arc<StubState>>,
    request: Request,
    next: Next,
) -> Response {
    let entry = RecordedRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        authorization: request
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    state
        .seen
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .push(entry);
    next.run(request).await
}

fn envelope(data: Value) -> Json<Value> {
    Json(json!({ "data": data, "message": "ok", "success": true }))
}

fn failure(status: u16, message: &str) -> Response {
    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (code, Json(json!({ "message": message, "success": false }))).into_response()
}

fn credential_for(role: &str, email: &str) -> Value {
    json!({
        "accessToken": "T",
        "refreshToken": "R",
        "profile": {
            "_id": "u1",
            "first_name": "Aya",
            "last_name": "Mostafa",
            "email": email,
            "role": role
        }
    })
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    if email == LOGIN_EMAIL && password == LOGIN_PASSWORD {
        envelope(credential_for("Student", email)).into_response()
    } else {
        failure(401, "Invalid credentials")
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    let role = body["role"].as_str().unwrap_or("Student");
    let email = body["email"].as_str().unwrap_or("new@example.com");
    envelope(credential_for(role, email)).into_response()
}

/// Served BARE (no envelope) and with the drifted `schadule` spelling,
/// exactly as the real backend does on this route.
async fn incoming_quizzes(State(state): State<Arc<StubState>>) -> Response {
    if state.options.incoming_delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(state.options.incoming_delay_ms)).await;
    }
    Json(json!([
        {
            "_id": "q1",
            "title": "Schema drift check",
            "schadule": DRIFTED_SCHEDULE,
            "status": "published",
            "questions_number": 5,
            "score_per_question": 2
        }
    ]))
    .into_response()
}

async fn completed_quizzes(State(state): State<Arc<StubState>>) -> Response {
    if let Some(status) = state.options.fail_completed_with {
        return failure(status, "internal server error");
    }
    envelope(json!([
        {
            "_id": "q2",
            "title": "Already done",
            "schedule": "2024-12-01T09:00:00Z",
            "status": "completed"
        }
    ]))
    .into_response()
}

async fn groups(State(state): State<Arc<StubState>>) -> Response {
    if state.options.group_unauthorized {
        return failure(401, "jwt expired");
    }
    envelope(json!([
        { "_id": "g1", "name": "Group A", "students": [] },
        { "_id": "g2", "name": "Group B", "students": [] }
    ]))
    .into_response()
}

async fn top_students() -> Response {
    envelope(json!([
        { "_id": "s1", "first_name": "Lina", "last_name": "Saad", "email": "lina@example.com" }
    ]))
    .into_response()
}

async fn not_found() -> Response {
    failure(404, "Resource not found")
}
