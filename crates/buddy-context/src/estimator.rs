use std::sync::Arc;

use buddy_persist::Block;
use serde::Deserialize;
use tiktoken_rs::{cl100k_base, CoreBPE};

use crate::error::{ContextError, Result};

/// Tokens charged per block for role and message framing
pub const DEFAULT_BLOCK_OVERHEAD: usize = 4;

/// Lowest overhead the shipped estimators accept. Keeps every block's cost
/// above zero.
pub const MIN_BLOCK_OVERHEAD: usize = 1;

/// Approximate token cost of stored blocks.
///
/// Estimates only need to be stable and roughly proportional to what the
/// model's tokenizer reports; the prompt budget leaves headroom for drift.
pub trait TokenEstimator: Send + Sync {
    /// Tokens for the text content alone
    fn count_text(&self, text: &str) -> usize;

    /// Fixed cost added to every block
    fn block_overhead(&self) -> usize {
        DEFAULT_BLOCK_OVERHEAD
    }

    fn estimate_block(&self, block: &Block) -> usize {
        self.count_text(block.text()).saturating_add(self.block_overhead())
    }
}

/// `ceil(chars / chars_per_token) + block_overhead`.
///
/// Counts Unicode scalar values, not bytes. Four characters per token is the
/// usual figure for English text on GPT tokenizers.
#[derive(Debug, Clone)]
pub struct CharRatioEstimator {
    chars_per_token: usize,
    block_overhead: usize,
}

impl CharRatioEstimator {
    pub fn new(chars_per_token: usize, block_overhead: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
            block_overhead: block_overhead.max(MIN_BLOCK_OVERHEAD),
        }
    }
}

impl Default for CharRatioEstimator {
    fn default() -> Self {
        Self::new(4, DEFAULT_BLOCK_OVERHEAD)
    }
}

impl TokenEstimator for CharRatioEstimator {
    fn count_text(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chars_per_token)
    }

    fn block_overhead(&self) -> usize {
        self.block_overhead
    }
}

/// `ceil(words * tokens_per_word) + block_overhead`, words split on whitespace
#[derive(Debug, Clone)]
pub struct WordRatioEstimator {
    tokens_per_word: f64,
    block_overhead: usize,
}

impl WordRatioEstimator {
    pub fn new(tokens_per_word: f64, block_overhead: usize) -> Self {
        let tokens_per_word = if tokens_per_word.is_finite() && tokens_per_word > 0.0 {
            tokens_per_word
        } else {
            1.0
        };
        Self {
            tokens_per_word,
            block_overhead: block_overhead.max(MIN_BLOCK_OVERHEAD),
        }
    }
}

impl Default for WordRatioEstimator {
    fn default() -> Self {
        Self::new(1.34, DEFAULT_BLOCK_OVERHEAD)
    }
}

impl TokenEstimator for WordRatioEstimator {
    fn count_text(&self, text: &str) -> usize {
        let words = text.split_whitespace().count();
        (words as f64 * self.tokens_per_word).ceil() as usize
    }

    fn block_overhead(&self) -> usize {
        self.block_overhead
    }
}

/// BPE count with the cl100k_base encoding used by GPT-3.5 and GPT-4
pub struct TiktokenEstimator {
    bpe: CoreBPE,
    block_overhead: usize,
}

impl TiktokenEstimator {
    pub fn cl100k(block_overhead: usize) -> Result<Self> {
        let bpe = cl100k_base().map_err(|e| ContextError::Tokenizer(e.to_string()))?;
        Ok(Self {
            bpe,
            block_overhead: block_overhead.max(MIN_BLOCK_OVERHEAD),
        })
    }
}

impl TokenEstimator for TiktokenEstimator {
    fn count_text(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }

    fn block_overhead(&self) -> usize {
        self.block_overhead
    }
}

/// Estimator selection as written in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorKind {
    #[default]
    Chars,
    Words,
    Tiktoken,
}

impl EstimatorKind {
    pub fn build(self, block_overhead: usize) -> Result<Arc<dyn TokenEstimator>> {
        Ok(match self {
            EstimatorKind::Chars => Arc::new(CharRatioEstimator::new(4, block_overhead)),
            EstimatorKind::Words => Arc::new(WordRatioEstimator::new(1.34, block_overhead)),
            EstimatorKind::Tiktoken => Arc::new(TiktokenEstimator::cl100k(block_overhead)?),
        })
    }
}
