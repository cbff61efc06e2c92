pub mod models;
pub mod error;
pub mod trait_client;
pub mod memory;
pub mod dbs;

pub use models::{Block, BlockRole, ConversationRecord, Tag, TagKind, TaggedBlock};
pub use error::PersistError;
pub use trait_client::PersistenceClient;
pub use memory::InMemoryPersistenceClient;

#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoPersistenceClient;
