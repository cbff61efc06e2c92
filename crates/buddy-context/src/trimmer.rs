use std::sync::Arc;

use buddy_persist::Block;

use crate::estimator::TokenEstimator;

/// Select the longest trailing run of `blocks` whose estimated cost fits
/// `max_tokens`.
///
/// Walks from the newest block backwards and stops at the first block that
/// would overflow the budget; nothing older than that block is considered.
/// Returned indices are ascending and contiguous, ending at the last block.
/// An empty result means even the newest block does not fit. The shipped
/// estimators charge at least one token per block, so a zero budget always
/// selects nothing; a custom estimator that prices a block at 0 opts out of
/// that.
pub fn trim(blocks: &[Block], max_tokens: usize, estimator: &dyn TokenEstimator) -> Vec<usize> {
    let mut used = 0usize;
    let mut start = blocks.len();

    for (idx, block) in blocks.iter().enumerate().rev() {
        let cost = estimator.estimate_block(block);
        match used.checked_add(cost) {
            Some(total) if total <= max_tokens => {
                used = total;
                start = idx;
            }
            _ => break,
        }
    }

    (start..blocks.len()).collect()
}

/// [`trim`] bound to a shared estimator
#[derive(Clone)]
pub struct HistoryTrimmer {
    estimator: Arc<dyn TokenEstimator>,
}

impl HistoryTrimmer {
    pub fn new(estimator: Arc<dyn TokenEstimator>) -> Self {
        Self { estimator }
    }

    pub fn estimator(&self) -> &dyn TokenEstimator {
        self.estimator.as_ref()
    }

    pub fn trim(&self, blocks: &[Block], max_tokens: usize) -> Vec<usize> {
        trim(blocks, max_tokens, self.estimator.as_ref())
    }

    pub fn total_cost(&self, blocks: &[Block]) -> usize {
        blocks.iter().map(|b| self.estimator.estimate_block(b)).sum()
    }
}
