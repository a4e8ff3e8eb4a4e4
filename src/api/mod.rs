// HTTP API routes: game lifecycle, submissions, history, and summary.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::engine::game::{summarize, GameSession, RoundRecord};
use crate::engine::story::{CorrectionGenerator, StoryGenerator};
use crate::session::{mint_token, SessionStore, SessionToken, SESSION_COOKIE};

// ── Request types ─────────────────────────────────────────────────────

/// Body of both submission endpoints. Empty player text is accepted as
/// given; it is stored verbatim and never fed back into prompts.
#[derive(Deserialize)]
pub struct SubmitStoryRequest {
    #[serde(default)]
    pub story_content: String,
    #[serde(default)]
    pub political_significance: String,
}

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub stories: StoryGenerator,
    pub corrections: CorrectionGenerator,
}

// ── Error helper ──────────────────────────────────────────────────────

const NO_SESSION_MSG: &str = "no active game session; call /start_game first";

fn json_error(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "error": msg }))).into_response()
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/start_game", get(start_game))
        .route("/submit_story", post(submit_story))
        .route("/submit_corrected_story", post(submit_corrected_story))
        .route("/get_game_history", get(get_game_history))
        .route("/get_game_summary", get(get_game_summary))
        .route("/generate_story", get(generate_story))
        .with_state(state)
}

// ── Game lifecycle handlers ───────────────────────────────────────────

/// Start a new game session. Always succeeds: a failed generation serves
/// the fixed opening story instead.
async fn start_game(State(state): State<AppState>, jar: CookieJar) -> Response {
    let story = state.stories.new_story().await;
    let session = GameSession::start(story.value.clone());
    let round = session.round;

    // Reuse the client's token when present so restarting replaces the old
    // session instead of stranding it until expiry.
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .unwrap_or_else(mint_token);
    state.sessions.put(&token, session);

    let jar = jar.add(Cookie::build((SESSION_COOKIE, token)).path("/").build());
    (
        jar,
        Json(json!({ "story": story.value, "round": round })),
    )
        .into_response()
}

/// Submit the player's rewrite of the opening story; replies with the first
/// correction, generated from the story the player just rewrote.
async fn submit_story(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Json(req): Json<SubmitStoryRequest>,
) -> Response {
    // Snapshot the seed first; the generation call must not hold the lock.
    let seed = match state.sessions.with(&token, |s| s.current_story.clone()) {
        Some(seed) => seed,
        None => return json_error(StatusCode::BAD_REQUEST, NO_SESSION_MSG),
    };

    let correction = state.corrections.new_correction(&seed).await;

    let round = state.sessions.with(&token, |s| {
        s.record_initial(
            req.story_content,
            req.political_significance,
            correction.value.clone(),
            Utc::now(),
        )
    });
    let Some(round) = round else {
        return json_error(StatusCode::BAD_REQUEST, NO_SESSION_MSG);
    };

    Json(json!({
        "success": true,
        "round": round,
        "message": "Story submitted successfully!",
        "correction": correction.value,
    }))
    .into_response()
}

/// Submit the player's rewrite of a corrected story, then serve another
/// correction that subverts the previous one. The loop never ends:
/// `game_over` is a literal `false`.
async fn submit_corrected_story(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Json(req): Json<SubmitStoryRequest>,
) -> Response {
    let seed = match state.sessions.with(&token, |s| s.next_seed()) {
        Some(seed) => seed,
        None => return json_error(StatusCode::BAD_REQUEST, NO_SESSION_MSG),
    };

    let correction = state.corrections.new_correction(&seed).await;

    let round = state.sessions.with(&token, |s| {
        s.record_corrected(
            req.story_content,
            req.political_significance,
            seed.clone(),
            correction.value.clone(),
            Utc::now(),
        )
    });
    let Some(round) = round else {
        return json_error(StatusCode::BAD_REQUEST, NO_SESSION_MSG);
    };

    Json(json!({
        "success": true,
        "round": round,
        "message": "Corrected story submitted successfully! Here is another correction that subverts the previous one.",
        "correction": correction.value,
        "game_over": false,
    }))
    .into_response()
}

// ── Read-side handlers ────────────────────────────────────────────────

/// Game history for display. A client without a live session gets the
/// empty defaults rather than an error.
async fn get_game_history(State(state): State<AppState>, jar: CookieJar) -> Response {
    let snapshot: Option<(Vec<RoundRecord>, u32)> = jar
        .get(SESSION_COOKIE)
        .and_then(|c| state.sessions.with(c.value(), |s| (s.history.clone(), s.round)));

    let (history, current_round) = snapshot.unwrap_or_else(|| (Vec::new(), 1));
    Json(json!({ "history": history, "current_round": current_round })).into_response()
}

/// Summary of the game session so far.
async fn get_game_summary(State(state): State<AppState>, jar: CookieJar) -> Response {
    let history: Vec<RoundRecord> = jar
        .get(SESSION_COOKIE)
        .and_then(|c| state.sessions.with(c.value(), |s| s.history.clone()))
        .unwrap_or_default();

    Json(summarize(&history)).into_response()
}

/// Stateless story generation; does not touch the session.
async fn generate_story(State(state): State<AppState>) -> Response {
    let story = state.stories.new_story().await;
    Json(json!({ "story": story.value })).into_response()
}
