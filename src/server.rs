//! Local HTTP surface for the practice board.
//!
//! Serves the embedded page, accepts user actions as JSON POSTs, and fans
//! widget commands out to connected pages over server-sent events. Remote
//! call failures never become HTTP errors here — the handlers mirror the
//! absent-result / silent-no-op policy of the fetcher and player.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::info;

use crate::gemini::GeminiClient;
use crate::shell::{AppShell, ShellSnapshot};
use crate::speech::SpeechPlayer;
use crate::widget::WidgetCommand;

const INDEX_HTML: &str = include_str!("../assets/index.html");

#[derive(Clone)]
pub struct AppState {
    pub shell: Arc<Mutex<AppShell>>,
    pub gemini: Arc<GeminiClient>,
    pub speech: Arc<SpeechPlayer>,
    pub widget_tx: broadcast::Sender<WidgetCommand>,
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct GenerateRequest {
    text: String,
}

#[derive(Deserialize)]
struct SpeakRequest {
    text: String,
    voice: Option<String>,
}

#[derive(Serialize)]
struct SimpleResponse {
    status: &'static str,
}

impl SimpleResponse {
    fn ok(status: &'static str) -> Json<Self> {
        Json(Self { status })
    }
}

/// Build the axum router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/api/state", get(handle_state))
        .route("/api/generate", post(handle_generate))
        .route("/api/animate", post(handle_animate))
        .route("/api/quiz", post(handle_quiz))
        .route("/api/speak", post(handle_speak))
        .route("/api/events", get(handle_events))
        .with_state(state)
}

/// Bind and serve until shutdown. A bind failure is the one fatal error.
pub async fn serve(state: AppState, bind: &str, port: u16) -> std::io::Result<()> {
    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Practice board listening on http://{addr}");
    axum::serve(listener, router(state)).await
}

/// Submit the configured default character so the UI is never empty.
/// Called once at startup, before the listener is bound.
pub fn submit_initial(state: &AppState, text: &str) {
    spawn_submission(state, text);
}

/// Shell transition plus the spawned fetch that eventually completes it.
/// The fetch task re-locks the shell; the identity check in `complete`
/// discards the result if a newer submission has taken over meanwhile.
/// Returns false when the input was empty and no transition happened.
fn spawn_submission(state: &AppState, text: &str) -> bool {
    let Some(character) = state.shell.lock().unwrap().submit(text) else {
        return false;
    };

    let shell = state.shell.clone();
    let gemini = state.gemini.clone();
    tokio::spawn(async move {
        let result = gemini.fetch_details(character).await;
        shell.lock().unwrap().complete(character, result);
    });
    true
}

// --- Handlers ---

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn handle_state(State(state): State<AppState>) -> Json<ShellSnapshot> {
    Json(state.shell.lock().unwrap().snapshot())
}

async fn handle_generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Json<SimpleResponse> {
    if spawn_submission(&state, &req.text) {
        SimpleResponse::ok("loading")
    } else {
        SimpleResponse::ok("ignored")
    }
}

async fn handle_animate(State(state): State<AppState>) -> Json<SimpleResponse> {
    state.shell.lock().unwrap().animate();
    SimpleResponse::ok("ok")
}

async fn handle_quiz(State(state): State<AppState>) -> Json<SimpleResponse> {
    state.shell.lock().unwrap().quiz();
    SimpleResponse::ok("ok")
}

/// Awaited on purpose: the page keeps its play button disabled until this
/// responds, which is the caller-side gate against overlapping requests.
async fn handle_speak(
    State(state): State<AppState>,
    Json(req): Json<SpeakRequest>,
) -> Json<SimpleResponse> {
    state.speech.speak(&req.text, req.voice.as_deref()).await;
    SimpleResponse::ok("ok")
}

/// Widget command stream. New subscribers first receive a `Create` for the
/// currently active character so a late-joining page renders the board.
async fn handle_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    // Subscribe before snapshotting: a submit landing in between is seen
    // twice (replay + broadcast) but never missed. The page's `Create`
    // handler rebuilds the container, so the duplicate is idempotent.
    let rx = state.widget_tx.subscribe();

    let replay = {
        let shell = state.shell.lock().unwrap();
        let snapshot = shell.snapshot();
        snapshot.active_character.map(|character| WidgetCommand::Create {
            character,
            size: snapshot.widget_size,
        })
    };

    let stream = tokio_stream::iter(replay)
        .chain(BroadcastStream::new(rx).filter_map(|recv| recv.ok()))
        .map(|command| Event::default().json_data(&command));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
