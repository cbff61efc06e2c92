use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct BotStatusResponse {
    pub status: String,
}

/// Start the Discord gateway. Starting a running bot is a no-op.
pub async fn start_bot(State(state): State<Arc<AppState>>) -> ApiResult<Json<BotStatusResponse>> {
    let started = state
        .gateway
        .start()
        .await
        .map_err(|e| ApiError::Gateway(format!("{:#}", e)))?;

    if started {
        tracing::info!("Bot started");
    }

    Ok(Json(BotStatusResponse {
        status: "Bot started".to_string(),
    }))
}

/// Stop the Discord gateway. Stopping a stopped bot is a no-op.
pub async fn stop_bot(State(state): State<Arc<AppState>>) -> Json<BotStatusResponse> {
    if state.gateway.stop().await {
        tracing::info!("Bot stopped");
    }

    Json(BotStatusResponse {
        status: "Bot stopped".to_string(),
    })
}
