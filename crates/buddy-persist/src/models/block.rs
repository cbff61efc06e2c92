use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PersistError, Result};

/// Who produced a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockRole {
    System,
    User,
    Assistant,
}

impl BlockRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockRole::System => "system",
            BlockRole::User => "user",
            BlockRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for BlockRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockRole {
    type Err = PersistError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "system" => Ok(BlockRole::System),
            "user" => Ok(BlockRole::User),
            "assistant" => Ok(BlockRole::Assistant),
            other => Err(PersistError::InvalidTag(format!("unknown role '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Role,
    MessageId,
}

impl TagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagKind::Role => "role",
            TagKind::MessageId => "message_id",
        }
    }
}

impl FromStr for TagKind {
    type Err = PersistError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "role" => Ok(TagKind::Role),
            "message_id" => Ok(TagKind::MessageId),
            other => Err(PersistError::InvalidTag(format!("unknown tag kind '{}'", other))),
        }
    }
}

/// Metadata attached to a stored block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    kind: TagKind,
    name: String,
}

impl Tag {
    /// Build a tag from its storage strings, validating kind and role names
    pub fn new(kind: &str, name: impl Into<String>) -> Result<Self> {
        let kind: TagKind = kind.parse()?;
        let name = name.into();
        match kind {
            TagKind::Role => {
                name.parse::<BlockRole>()?;
            }
            TagKind::MessageId if name.is_empty() => {
                return Err(PersistError::InvalidTag("empty message id".to_string()));
            }
            TagKind::MessageId => {}
        }
        Ok(Self { kind, name })
    }

    pub fn role(role: BlockRole) -> Self {
        Self {
            kind: TagKind::Role,
            name: role.as_str().to_string(),
        }
    }

    pub fn message_id(id: impl Into<String>) -> Self {
        Self {
            kind: TagKind::MessageId,
            name: id.into(),
        }
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Storage shape of a block: text plus a tag list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggedBlock {
    pub text: String,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
}

/// One turn of dialogue or the persona instruction.
///
/// Immutable once built. Serializes through [`TaggedBlock`], so anything read
/// back from storage is validated the same way as [`Block::from_tags`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TaggedBlock", into = "TaggedBlock")]
pub struct Block {
    text: String,
    role: BlockRole,
    message_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl Block {
    pub fn system(text: impl Into<String>) -> Self {
        Self::build(text.into(), BlockRole::System, None)
    }

    pub fn user(text: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self::build(text.into(), BlockRole::User, Some(message_id.into()))
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::build(text.into(), BlockRole::Assistant, None)
    }

    fn build(text: String, role: BlockRole, message_id: Option<String>) -> Self {
        Self {
            text,
            role,
            message_id,
            created_at: Utc::now(),
        }
    }

    /// Rebuild a block from stored tags.
    ///
    /// Requires exactly one role tag and at most one message id tag.
    pub fn from_tags(text: impl Into<String>, tags: Vec<Tag>, created_at: DateTime<Utc>) -> Result<Self> {
        let mut role = None;
        let mut message_id = None;

        for tag in tags {
            match tag.kind {
                TagKind::Role => {
                    if role.is_some() {
                        return Err(PersistError::InvalidBlock("multiple role tags".to_string()));
                    }
                    role = Some(tag.name.parse::<BlockRole>()?);
                }
                TagKind::MessageId => {
                    if message_id.is_some() {
                        return Err(PersistError::InvalidBlock("multiple message id tags".to_string()));
                    }
                    message_id = Some(tag.name);
                }
            }
        }

        let role = role.ok_or_else(|| PersistError::InvalidBlock("missing role tag".to_string()))?;

        Ok(Self {
            text: text.into(),
            role,
            message_id,
            created_at,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn role(&self) -> BlockRole {
        self.role
    }

    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_system(&self) -> bool {
        self.role == BlockRole::System
    }

    pub fn tags(&self) -> Vec<Tag> {
        let mut tags = vec![Tag::role(self.role)];
        if let Some(id) = &self.message_id {
            tags.push(Tag::message_id(id.clone()));
        }
        tags
    }
}

impl TryFrom<TaggedBlock> for Block {
    type Error = PersistError;

    fn try_from(stored: TaggedBlock) -> Result<Self> {
        Block::from_tags(stored.text, stored.tags, stored.created_at)
    }
}

impl From<Block> for TaggedBlock {
    fn from(block: Block) -> Self {
        let tags = block.tags();
        Self {
            text: block.text,
            tags,
            created_at: block.created_at,
        }
    }
}

impl From<&Block> for buddy_llm::Message {
    fn from(block: &Block) -> Self {
        match block.role {
            BlockRole::System => buddy_llm::Message::system(block.text.clone()),
            BlockRole::User => buddy_llm::Message::human(block.text.clone()),
            BlockRole::Assistant => buddy_llm::Message::ai(block.text.clone()),
        }
    }
}
