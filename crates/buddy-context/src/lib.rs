//! Context assembly for LLM calls: token estimation, trailing-window
//! trimming, message dedup and user-facing failure replies.

mod budget;
mod dedup;
mod default;
mod error;
mod estimator;
mod failure;
mod strategy;
mod trimmer;

pub use budget::{ContextBudget, DEFAULT_CONTEXT_WINDOW, DEFAULT_MAX_OUTPUT_TOKENS, GPT4_CONTEXT_WINDOW};
pub use dedup::already_processed;
pub use default::DefaultContextStrategy;
pub use error::ContextError;
pub use estimator::{
    CharRatioEstimator, EstimatorKind, TiktokenEstimator, TokenEstimator, WordRatioEstimator,
    DEFAULT_BLOCK_OVERHEAD, MIN_BLOCK_OVERHEAD,
};
pub use failure::{format_error, FailureKind, ReplyTemplates};
pub use strategy::{ContextStrategy, ContextWindow};
pub use trimmer::{trim, HistoryTrimmer};
