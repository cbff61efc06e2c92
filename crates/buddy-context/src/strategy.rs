use buddy_llm::Message;
use buddy_persist::Block;

use crate::budget::ContextBudget;
use crate::error::Result;

/// Messages to send for one generation
#[derive(Debug, Clone)]
pub struct ContextWindow {
    pub messages: Vec<Message>,
    /// Indices of the blocks behind `messages`, ascending
    pub selected: Vec<usize>,
    pub estimated_tokens: usize,
}

impl ContextWindow {
    /// Count of older blocks left out of the window
    pub fn dropped(&self) -> usize {
        self.selected.first().copied().unwrap_or(0)
    }
}

/// Strategy for building the model context from stored history
pub trait ContextStrategy: Send + Sync {
    fn context_window(&self, blocks: &[Block]) -> Result<ContextWindow>;

    fn budget(&self) -> ContextBudget;
}
