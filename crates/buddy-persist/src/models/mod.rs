mod block;
mod record;

pub use block::{Block, BlockRole, Tag, TagKind, TaggedBlock};
pub use record::ConversationRecord;
