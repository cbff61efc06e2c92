use buddy_context::{already_processed, trim, TokenEstimator};
use buddy_persist::Block;
use proptest::prelude::*;

/// One token per byte, no framing cost
struct ByteEstimator;

impl TokenEstimator for ByteEstimator {
    fn count_text(&self, text: &str) -> usize {
        text.len()
    }

    fn block_overhead(&self) -> usize {
        0
    }
}

fn blocks_for(costs: &[usize]) -> Vec<Block> {
    costs.iter().map(|c| Block::assistant("a".repeat(*c))).collect()
}

proptest! {
    #[test]
    fn whole_history_fits_generous_budget(costs in prop::collection::vec(0usize..64, 0..32), extra in 0usize..100) {
        let blocks = blocks_for(&costs);
        let total: usize = costs.iter().sum();
        let selected = trim(&blocks, total + extra, &ByteEstimator);
        prop_assert_eq!(selected, (0..blocks.len()).collect::<Vec<_>>());
    }

    #[test]
    fn selection_is_trailing_and_within_budget(costs in prop::collection::vec(0usize..64, 0..32), max in 0usize..400) {
        let blocks = blocks_for(&costs);
        let selected = trim(&blocks, max, &ByteEstimator);

        if let Some(&first) = selected.first() {
            prop_assert_eq!(selected.clone(), (first..blocks.len()).collect::<Vec<_>>());
            let used: usize = costs[first..].iter().sum();
            prop_assert!(used <= max);
            // the block just before the window would have overflowed
            if first > 0 {
                prop_assert!(used + costs[first - 1] > max);
            }
        } else if let Some(&newest) = costs.last() {
            prop_assert!(newest > max);
        }
    }

    #[test]
    fn trimming_is_deterministic(costs in prop::collection::vec(0usize..64, 0..32), max in 0usize..400) {
        let blocks = blocks_for(&costs);
        prop_assert_eq!(trim(&blocks, max, &ByteEstimator), trim(&blocks, max, &ByteEstimator));
    }

    #[test]
    fn zero_budget_selects_nothing(costs in prop::collection::vec(1usize..64, 1..16)) {
        let blocks = blocks_for(&costs);
        prop_assert!(trim(&blocks, 0, &ByteEstimator).is_empty());
    }

    #[test]
    fn dedup_matches_any_block(ids in prop::collection::vec("[a-z0-9]{1,8}", 0..16), needle in "[a-z0-9]{1,8}") {
        let blocks: Vec<Block> = ids.iter().map(|id| Block::user("hi", id.clone())).collect();
        prop_assert_eq!(already_processed(&blocks, &needle), ids.contains(&needle));
    }
}

#[test]
fn four_equal_blocks_keep_the_last_two() {
    let blocks = blocks_for(&[5, 5, 5, 5]);
    assert_eq!(trim(&blocks, 12, &ByteEstimator), vec![2, 3]);
}

#[test]
fn empty_record_has_nothing_processed() {
    assert!(!already_processed(&[], "123"));
}
