use std::sync::Arc;

use buddy_llm::Message;
use buddy_persist::Block;

use crate::budget::ContextBudget;
use crate::error::{ContextError, Result};
use crate::estimator::TokenEstimator;
use crate::strategy::{ContextStrategy, ContextWindow};
use crate::trimmer::HistoryTrimmer;

/// Trailing-window strategy: newest blocks that fit the prompt budget
pub struct DefaultContextStrategy {
    trimmer: HistoryTrimmer,
    budget: ContextBudget,
}

impl DefaultContextStrategy {
    pub fn new(estimator: Arc<dyn TokenEstimator>, budget: ContextBudget) -> Self {
        Self {
            trimmer: HistoryTrimmer::new(estimator),
            budget,
        }
    }

    pub fn trimmer(&self) -> &HistoryTrimmer {
        &self.trimmer
    }
}

impl ContextStrategy for DefaultContextStrategy {
    fn context_window(&self, blocks: &[Block]) -> Result<ContextWindow> {
        let newest = blocks.last().ok_or(ContextError::EmptyHistory)?;
        let max_tokens = self.budget.prompt_tokens();

        let selected = self.trimmer.trim(blocks, max_tokens);
        if selected.is_empty() {
            return Err(ContextError::MessageTooLarge {
                tokens: self.trimmer.estimator().estimate_block(newest),
                budget: max_tokens,
            });
        }

        let start = selected[0];
        let estimated_tokens = self.trimmer.total_cost(&blocks[start..]);
        let messages: Vec<Message> = blocks[start..].iter().map(Message::from).collect();

        if start > 0 {
            tracing::debug!(
                dropped = start,
                kept = selected.len(),
                estimated_tokens,
                max_tokens,
                "Trimmed conversation history"
            );
        }

        Ok(ContextWindow {
            messages,
            selected,
            estimated_tokens,
        })
    }

    fn budget(&self) -> ContextBudget {
        self.budget
    }
}
