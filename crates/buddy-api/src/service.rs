use std::sync::Arc;

use anyhow::{anyhow, Result};
use buddy_context::{already_processed, ContextStrategy, ReplyTemplates};
use buddy_llm::{ChatClient, ChatOptions, ChatRequest};
use buddy_persist::{Block, PersistenceClient};

use crate::config::Config;

/// A chat message addressed to the bot, independent of the gateway it came from
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub session_id: String,
    pub message_id: String,
    pub author: String,
    pub text: String,
    pub replied_to: Option<RepliedMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepliedMessage {
    pub author: String,
    pub text: String,
}

impl InboundMessage {
    /// Text stored and sent to the model. Replies carry the message they
    /// answer so the model sees both sides.
    pub fn prompt_text(&self) -> String {
        match &self.replied_to {
            Some(replied) => format!(
                "{} said: {}\n{} replied: {}",
                replied.author, replied.text, self.author, self.text
            ),
            None => self.text.clone(),
        }
    }
}

/// Generation parameters shared by every conversation
#[derive(Debug, Clone)]
pub struct ResponderSettings {
    pub persona: String,
    pub model: String,
    pub temperature: f32,
    pub replies: ReplyTemplates,
}

impl ResponderSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            persona: config.persona(),
            model: config.model(),
            temperature: config.llm.temperature,
            replies: config.replies.clone(),
        }
    }
}

/// Turns inbound messages into model replies, keeping the stored history in
/// step: user block first, assistant block once the model answers.
pub struct ConversationService {
    persist: Arc<dyn PersistenceClient>,
    llm: Arc<dyn ChatClient>,
    strategy: Arc<dyn ContextStrategy>,
    settings: ResponderSettings,
}

impl ConversationService {
    pub fn new(
        persist: Arc<dyn PersistenceClient>,
        llm: Arc<dyn ChatClient>,
        strategy: Arc<dyn ContextStrategy>,
        settings: ResponderSettings,
    ) -> Self {
        Self {
            persist,
            llm,
            strategy,
            settings,
        }
    }

    pub fn settings(&self) -> &ResponderSettings {
        &self.settings
    }

    /// Generate a reply to `text`.
    ///
    /// Returns `Ok(None)` when `message_id` was already handled for this
    /// session; nothing is stored or generated in that case.
    pub async fn prepare_response(&self, session_id: &str, message_id: &str, text: &str) -> Result<Option<String>> {
        let record = self.persist.get_or_create(session_id, &self.settings.persona).await?;

        if already_processed(&record.blocks, message_id) {
            tracing::debug!(session_id = %session_id, message_id = %message_id, "Skipping duplicate message");
            return Ok(None);
        }

        self.persist
            .append_block(session_id, Block::user(text, message_id))
            .await?;

        let blocks = self.persist.list_blocks(session_id).await?;
        let window = self.strategy.context_window(&blocks)?;

        let max_output = self.strategy.budget().max_output_tokens;
        let options = ChatOptions::new()
            .temperature(self.settings.temperature)
            .max_tokens(u32::try_from(max_output).unwrap_or(u32::MAX));

        tracing::info!(
            session_id = %session_id,
            model = %self.settings.model,
            blocks = window.selected.len(),
            dropped = window.dropped(),
            estimated_tokens = window.estimated_tokens,
            "Requesting completion"
        );

        let request = ChatRequest::new(self.settings.model.clone(), window.messages).with_options(options);

        let response = self.llm.chat(request).await?;
        let reply = response
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| anyhow!("model returned an empty response"))?;

        self.persist
            .append_block(session_id, Block::assistant(reply.clone()))
            .await?;

        Ok(Some(reply))
    }

    /// [`prepare_response`](Self::prepare_response) with failures turned into
    /// a reply for the user. `None` only for duplicates.
    pub async fn respond(&self, message: &InboundMessage) -> Option<String> {
        match self
            .prepare_response(&message.session_id, &message.message_id, &message.prompt_text())
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    session_id = %message.session_id,
                    message_id = %message.message_id,
                    "Failed to generate reply: {:#}",
                    e
                );
                Some(self.settings.replies.format(Some(&e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(replied_to: Option<RepliedMessage>) -> InboundMessage {
        InboundMessage {
            session_id: "c1".to_string(),
            message_id: "m1".to_string(),
            author: "Bob".to_string(),
            text: "why?".to_string(),
            replied_to,
        }
    }

    #[test]
    fn test_prompt_text_plain() {
        assert_eq!(message(None).prompt_text(), "why?");
    }

    #[test]
    fn test_prompt_text_reply() {
        let msg = message(Some(RepliedMessage {
            author: "Buddy".to_string(),
            text: "The sky is blue.".to_string(),
        }));
        assert_eq!(msg.prompt_text(), "Buddy said: The sky is blue.\nBob replied: why?");
    }
}
