use buddy_persist::Block;

/// Whether a block tagged with `message_id` is already stored.
///
/// Gateways redeliver events; a hit means the message was handled before and
/// the caller should not generate again.
pub fn already_processed(blocks: &[Block], message_id: &str) -> bool {
    blocks.iter().any(|b| b.message_id() == Some(message_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record() {
        assert!(!already_processed(&[], "1"));
    }

    #[test]
    fn test_matches_only_message_id_tags() {
        let blocks = vec![
            Block::system("1"),
            Block::user("hello", "1001"),
            Block::assistant("1002"),
        ];
        assert!(already_processed(&blocks, "1001"));
        // text equal to the id does not count
        assert!(!already_processed(&blocks, "1002"));
        assert!(!already_processed(&blocks, "1"));
    }
}
