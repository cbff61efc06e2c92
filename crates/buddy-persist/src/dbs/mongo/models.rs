use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::{PersistError, Result};
use crate::models::{Block, Tag};

/// `records` collection document, keyed by session id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRecord {
    #[serde(rename = "_id")]
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Position handed to the next appended block. The persona takes 0.
    #[serde(default)]
    pub next_position: i64,
}

/// `blocks` collection document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoBlock {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub session_id: String,
    /// Append position within the session, starting at 0
    pub position: i64,
    pub text: String,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
}

impl MongoBlock {
    pub fn new(session_id: &str, position: i64, block: &Block) -> Self {
        Self {
            id: ObjectId::new(),
            session_id: session_id.to_string(),
            position,
            text: block.text().to_string(),
            tags: block.tags(),
            created_at: block.created_at(),
        }
    }
}

impl TryFrom<MongoBlock> for Block {
    type Error = PersistError;

    fn try_from(doc: MongoBlock) -> Result<Self> {
        Block::from_tags(doc.text, doc.tags, doc.created_at)
    }
}
