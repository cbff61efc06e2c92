use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::block::Block;

/// Full block history of one chat session.
///
/// The first block is the persona block written at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub blocks: Vec<Block>,
}

impl ConversationRecord {
    pub fn new(session_id: impl Into<String>, system_block: Block) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            created_at: now,
            updated_at: now,
            blocks: vec![system_block],
        }
    }

    pub fn system_block(&self) -> Option<&Block> {
        self.blocks.first().filter(|b| b.is_system())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
