use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::service::InboundMessage;
use crate::state::AppState;

pub const DEFAULT_SESSION_ID: &str = "default";

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question: String,
    #[serde(default)]
    pub chat_session_id: Option<String>,
}

/// Shape expected by embeddable chat widgets
#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub sources: Vec<String>,
    pub is_plausible: bool,
}

/// Answer a question outside Discord.
///
/// Every call gets a fresh message id, so it is never treated as a
/// duplicate. Generation failures come back as the `answer` text.
pub async fn answer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnswerRequest>,
) -> ApiResult<Json<AnswerResponse>> {
    if req.question.trim().is_empty() {
        return Err(ApiError::BadRequest("question must not be empty".to_string()));
    }

    let session_id = req
        .chat_session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());

    let message = InboundMessage {
        session_id,
        message_id: uuid::Uuid::new_v4().to_string(),
        author: "web".to_string(),
        text: req.question,
        replied_to: None,
    };

    let answer = state.conversations.respond(&message).await.unwrap_or_default();

    Ok(Json(AnswerResponse {
        answer,
        sources: Vec::new(),
        is_plausible: true,
    }))
}
