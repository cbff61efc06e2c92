use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::models::{Block, ConversationRecord};
use crate::trait_client::PersistenceClient;

/// Process-local storage. History is lost on restart.
#[derive(Default)]
pub struct InMemoryPersistenceClient {
    records: RwLock<HashMap<String, ConversationRecord>>,
}

impl InMemoryPersistenceClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn session_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl PersistenceClient for InMemoryPersistenceClient {
    async fn get_record(&self, session_id: &str) -> Result<Option<ConversationRecord>> {
        Ok(self.records.read().await.get(session_id).cloned())
    }

    async fn create_record(&self, session_id: &str, system_block: Block) -> Result<ConversationRecord> {
        let mut records = self.records.write().await;
        let record = records
            .entry(session_id.to_string())
            .or_insert_with(|| ConversationRecord::new(session_id, system_block));
        Ok(record.clone())
    }

    async fn append_block(&self, session_id: &str, block: Block) -> Result<Block> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(session_id)
            .ok_or_else(|| PersistError::RecordNotFound(session_id.to_string()))?;
        record.blocks.push(block.clone());
        record.updated_at = Utc::now();
        Ok(block)
    }

    async fn list_blocks(&self, session_id: &str) -> Result<Vec<Block>> {
        self.records
            .read()
            .await
            .get(session_id)
            .map(|r| r.blocks.clone())
            .ok_or_else(|| PersistError::RecordNotFound(session_id.to_string()))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
