use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContextError {
    /// The newest block alone does not fit the prompt budget
    #[error("message is too long to answer ({tokens} estimated tokens, budget is {budget})")]
    MessageTooLarge { tokens: usize, budget: usize },

    #[error("no conversation history to send")]
    EmptyHistory,

    #[error("tokenizer error: {0}")]
    Tokenizer(String),
}

pub type Result<T> = std::result::Result<T, ContextError>;
