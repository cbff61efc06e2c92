use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};

use super::models::{MongoBlock, MongoRecord};
use crate::error::{PersistError, Result};
use crate::models::{Block, ConversationRecord};
use crate::trait_client::PersistenceClient;

const DUPLICATE_KEY: i32 = 11000;

/// Position of the persona block in every record
const PERSONA_POSITION: i64 = 0;

pub struct MongoPersistenceClient {
    database: Database,
    records: Collection<MongoRecord>,
    blocks: Collection<MongoBlock>,
}

impl MongoPersistenceClient {
    /// Connect to MongoDB, create client and ensure indexes
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        let database = client.database(database);
        let persist = Self {
            records: database.collection("records"),
            blocks: database.collection("blocks"),
            database,
        };
        persist.ensure_indexes().await?;
        Ok(persist)
    }

    /// One block per position within a session
    async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "session_id": 1, "position": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.blocks.create_index(index).await?;
        Ok(())
    }

    async fn load_blocks(&self, session_id: &str) -> Result<Vec<Block>> {
        let docs: Vec<MongoBlock> = self
            .blocks
            .find(doc! { "session_id": session_id })
            .sort(doc! { "position": 1 })
            .await?
            .try_collect()
            .await?;

        docs.into_iter().map(Block::try_from).collect()
    }

    /// Reserve the next append position; `None` when the record is missing
    async fn reserve_position(&self, session_id: &str) -> Result<Option<i64>> {
        let update = doc! {
            "$inc": { "next_position": 1_i64 },
            "$set": { "updated_at": bson::to_bson(&Utc::now())? },
        };
        let before = self
            .records
            .find_one_and_update(doc! { "_id": session_id }, update)
            .return_document(ReturnDocument::Before)
            .await?;
        Ok(before.map(|record| record.next_position))
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl PersistenceClient for MongoPersistenceClient {
    async fn get_record(&self, session_id: &str) -> Result<Option<ConversationRecord>> {
        let Some(record) = self.records.find_one(doc! { "_id": session_id }).await? else {
            return Ok(None);
        };

        let blocks = self.load_blocks(session_id).await?;
        Ok(Some(ConversationRecord {
            session_id: record.session_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
            blocks,
        }))
    }

    async fn create_record(&self, session_id: &str, system_block: Block) -> Result<ConversationRecord> {
        let now = Utc::now();
        let record = MongoRecord {
            session_id: session_id.to_string(),
            created_at: now,
            updated_at: now,
            // appends start after the persona even while it is being written
            next_position: PERSONA_POSITION + 1,
        };

        match self.records.insert_one(&record).await {
            Ok(_) => {}
            // Another writer created it first; keep theirs
            Err(e) if is_duplicate_key(&e) => {
                return self
                    .get_record(session_id)
                    .await?
                    .ok_or_else(|| PersistError::RecordNotFound(session_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        let persona = MongoBlock::new(session_id, PERSONA_POSITION, &system_block);
        if let Err(e) = self.blocks.insert_one(persona).await {
            tracing::error!(session_id = %session_id, "Persona insert failed, removing record: {}", e);
            if let Err(cleanup) = self.records.delete_one(doc! { "_id": session_id }).await {
                tracing::error!(session_id = %session_id, "Record cleanup failed: {}", cleanup);
            }
            return Err(e.into());
        }

        Ok(ConversationRecord::new(session_id, system_block))
    }

    async fn append_block(&self, session_id: &str, block: Block) -> Result<Block> {
        let position = self
            .reserve_position(session_id)
            .await?
            .ok_or_else(|| PersistError::RecordNotFound(session_id.to_string()))?;

        self.blocks
            .insert_one(MongoBlock::new(session_id, position, &block))
            .await?;
        Ok(block)
    }

    async fn list_blocks(&self, session_id: &str) -> Result<Vec<Block>> {
        if self.records.find_one(doc! { "_id": session_id }).await?.is_none() {
            return Err(PersistError::RecordNotFound(session_id.to_string()));
        }
        self.load_blocks(session_id).await
    }

    async fn ping(&self) -> Result<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
