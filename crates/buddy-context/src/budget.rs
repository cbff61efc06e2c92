use serde::Deserialize;

/// Context window used for GPT-4 models, kept under the nominal 8192 as a
/// margin for estimation drift
pub const GPT4_CONTEXT_WINDOW: usize = 7800;

/// Context window of gpt-3.5-turbo
pub const DEFAULT_CONTEXT_WINDOW: usize = 4097;

pub const DEFAULT_MAX_OUTPUT_TOKENS: usize = 256;

/// Token arithmetic for one model: what is left for the prompt once the
/// reply's reservation is taken out of the context window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ContextBudget {
    pub context_window: usize,
    pub max_output_tokens: usize,
}

impl ContextBudget {
    pub fn new(context_window: usize, max_output_tokens: usize) -> Self {
        Self {
            context_window,
            max_output_tokens,
        }
    }

    /// Default window for a model name
    pub fn for_model(model: &str, max_output_tokens: usize) -> Self {
        let context_window = if model.starts_with("gpt-4") {
            GPT4_CONTEXT_WINDOW
        } else {
            DEFAULT_CONTEXT_WINDOW
        };
        Self::new(context_window, max_output_tokens)
    }

    /// Tokens available for history. Zero when the output reservation
    /// swallows the whole window.
    pub fn prompt_tokens(&self) -> usize {
        self.context_window.saturating_sub(self.max_output_tokens)
    }
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_WINDOW, DEFAULT_MAX_OUTPUT_TOKENS)
    }
}
