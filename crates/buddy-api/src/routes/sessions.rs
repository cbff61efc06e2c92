use axum::{
    extract::{Path, Query, State},
    Json,
};
use buddy_persist::{Block, BlockRole};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const MAX_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
pub struct ListBlocksQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlockResponse {
    pub role: BlockRole,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListBlocksResponse {
    pub session_id: String,
    pub blocks: Vec<BlockResponse>,
    /// Blocks stored for the session, including those not returned
    pub total: usize,
}

/// Newest `limit` blocks of a session, oldest first
pub async fn list_blocks(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Query(query): Query<ListBlocksQuery>,
) -> ApiResult<Json<ListBlocksResponse>> {
    let record = state
        .persist
        .get_record(&session_id)
        .await?
        .ok_or_else(|| ApiError::SessionNotFound(session_id.clone()))?;

    let limit = query.limit.min(MAX_LIMIT);
    let total = record.blocks.len();
    let blocks = record
        .blocks
        .iter()
        .skip(total.saturating_sub(limit))
        .map(block_to_response)
        .collect();

    Ok(Json(ListBlocksResponse {
        session_id,
        blocks,
        total,
    }))
}

fn block_to_response(block: &Block) -> BlockResponse {
    BlockResponse {
        role: block.role(),
        text: block.text().to_string(),
        message_id: block.message_id().map(str::to_string),
        created_at: block.created_at(),
    }
}
