use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Block, ConversationRecord};

/// Storage operations for conversation records
///
/// Implementations only ever append; blocks come back in append order.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Get a record with all of its blocks
    async fn get_record(&self, session_id: &str) -> Result<Option<ConversationRecord>>;

    /// Create a record seeded with `system_block`.
    ///
    /// If the record already exists it is returned unchanged, so the persona
    /// block is never written twice.
    async fn create_record(&self, session_id: &str, system_block: Block) -> Result<ConversationRecord>;

    /// Append a block to an existing record
    async fn append_block(&self, session_id: &str, block: Block) -> Result<Block>;

    /// All blocks of a record, oldest first
    async fn list_blocks(&self, session_id: &str) -> Result<Vec<Block>>;

    /// Liveness check used by the health endpoint
    async fn ping(&self) -> Result<()>;

    /// Find the record for a session or create it with the persona block
    async fn get_or_create(&self, session_id: &str, persona: &str) -> Result<ConversationRecord> {
        if let Some(record) = self.get_record(session_id).await? {
            return Ok(record);
        }
        tracing::info!(session_id = %session_id, "Creating conversation record");
        self.create_record(session_id, Block::system(persona)).await
    }
}
