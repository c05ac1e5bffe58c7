use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use kbcore::normalize::expect_str;
use kbcore::persist::DataPaths;
use kbcore::session::{record, username_or_default, Chat, ChatEntry, User};
use kbcore::{Answer, NormalizeError, Retriever};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: impl std::fmt::Display) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.to_string() })))
}

#[derive(Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: Value,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub answer: Option<String>,
    pub doc_id: String,
    pub took_s: f64,
}

#[derive(Deserialize)]
pub struct CreateChatRequest {
    pub username: Option<String>,
}

#[derive(Serialize)]
pub struct ChatCreated {
    pub chat_id: Uuid,
}

/// In-memory chats, listed in creation order, and the users that own them.
/// A user's question history spans all of their chats.
#[derive(Default)]
pub struct ChatStore {
    order: Vec<Uuid>,
    chats: HashMap<Uuid, Chat>,
    users: HashMap<String, User>,
}

impl ChatStore {
    fn create(&mut self, username: Option<String>) -> Uuid {
        let username = username_or_default(username);
        self.users.entry(username.clone()).or_insert_with(|| User::new(username.clone()));
        let id = Uuid::new_v4();
        self.order.push(id);
        self.chats.insert(id, Chat::new(username));
        id
    }

    fn contains(&self, chat_id: &Uuid) -> bool {
        self.chats.contains_key(chat_id)
    }

    /// Append an already answered question to a chat and its user.
    fn record(&mut self, chat_id: &Uuid, question: &str, answer: &Answer) -> bool {
        let Some(chat) = self.chats.get_mut(chat_id) else {
            return false;
        };
        let user = self
            .users
            .entry(chat.username.clone())
            .or_insert_with(|| User::new(chat.username.clone()));
        record(user, &mut chat.conversation, question, answer);
        true
    }
}

#[derive(Clone)]
pub struct AppState {
    pub retriever: Arc<Retriever>,
    pub chats: Arc<RwLock<ChatStore>>,
}

/// Load the knowledge base from `paths` and build the router around it.
pub fn build_app(paths: &DataPaths) -> Result<Router> {
    let retriever = Retriever::load(paths)?;
    Ok(router(Arc::new(retriever)))
}

pub fn router(retriever: Arc<Retriever>) -> Router {
    let state = AppState { retriever, chats: Arc::new(RwLock::new(ChatStore::default())) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let origins: Vec<_> = std::env::var("CORS_ALLOW_ORIGIN")
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    let cors = if origins.is_empty() {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    }
    .allow_methods(Any)
    .allow_headers(Any);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/ask", post(ask_handler))
        .route("/chats", get(list_chats).post(create_chat))
        .route("/chats/:chat_id/ask", post(chat_ask))
        .route("/chats/:chat_id/history", get(chat_history).delete(clear_history))
        .route("/users/:username/history", get(user_history).delete(clear_user_history))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn bad_input(err: NormalizeError) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, err)
}

fn chat_not_found(chat_id: Uuid) -> ApiError {
    api_error(StatusCode::NOT_FOUND, format!("no chat {chat_id}"))
}

fn user_not_found(username: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, format!("no user {username}"))
}

pub async fn ask_handler(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let start = std::time::Instant::now();
    let found = state.retriever.find_answer_value(&req.question).map_err(bad_input)?;
    let took_s = start.elapsed().as_secs_f64();
    Ok(Json(AskResponse { answer: found.answer, doc_id: found.doc_id, took_s }))
}

async fn create_chat(State(state): State<AppState>, body: Option<Json<CreateChatRequest>>) -> Json<ChatCreated> {
    let username = body.and_then(|Json(b)| b.username);
    let chat_id = state.chats.write().create(username);
    tracing::debug!(%chat_id, "chat created");
    Json(ChatCreated { chat_id })
}

async fn list_chats(State(state): State<AppState>) -> Json<Vec<Uuid>> {
    Json(state.chats.read().order.clone())
}

async fn chat_ask(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let start = std::time::Instant::now();
    let question = expect_str(&req.question).map_err(bad_input)?;
    if !state.chats.read().contains(&chat_id) {
        return Err(chat_not_found(chat_id));
    }
    // Retrieval runs unlocked; only the bookkeeping takes the write lock.
    let found = state.retriever.find_answer(question);
    if !state.chats.write().record(&chat_id, question, &found) {
        return Err(chat_not_found(chat_id));
    }
    let took_s = start.elapsed().as_secs_f64();
    Ok(Json(AskResponse { answer: found.answer, doc_id: found.doc_id, took_s }))
}

async fn chat_history(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Vec<ChatEntry>>, ApiError> {
    let chats = state.chats.read();
    let chat = chats.chats.get(&chat_id).ok_or_else(|| chat_not_found(chat_id))?;
    Ok(Json(chat.conversation.entries().to_vec()))
}

async fn clear_history(State(state): State<AppState>, Path(chat_id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    let mut chats = state.chats.write();
    let chat = chats.chats.get_mut(&chat_id).ok_or_else(|| chat_not_found(chat_id))?;
    chat.clear();
    Ok(StatusCode::NO_CONTENT)
}

async fn user_history(State(state): State<AppState>, Path(username): Path<String>) -> Result<Json<Vec<String>>, ApiError> {
    let chats = state.chats.read();
    let user = chats.users.get(&username).ok_or_else(|| user_not_found(&username))?;
    Ok(Json(user.history().to_vec()))
}

async fn clear_user_history(State(state): State<AppState>, Path(username): Path<String>) -> Result<StatusCode, ApiError> {
    let mut chats = state.chats.write();
    let user = chats.users.get_mut(&username).ok_or_else(|| user_not_found(&username))?;
    user.clear_history();
    Ok(StatusCode::NO_CONTENT)
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<String>) -> Result<Json<Value>, ApiError> {
    match state.retriever.answer_for(&doc_id) {
        Some(answer) => Ok(Json(serde_json::json!({ "doc_id": doc_id, "answer": answer }))),
        None => Err(api_error(StatusCode::NOT_FOUND, "not found")),
    }
}
