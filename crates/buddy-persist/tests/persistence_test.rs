use std::collections::HashSet;
use std::sync::Arc;

use buddy_persist::{Block, BlockRole, InMemoryPersistenceClient, PersistenceClient};

#[tokio::test]
async fn test_trait_object_round_trip() {
    let store: Arc<dyn PersistenceClient> = Arc::new(InMemoryPersistenceClient::new());

    let record = store.get_or_create("123456789", "Your name is Buddy. Your personality is cheerful.").await.unwrap();
    assert_eq!(record.session_id, "123456789");
    assert_eq!(record.blocks[0].role(), BlockRole::System);

    store.append_block("123456789", Block::user("hi", "m-1")).await.unwrap();
    store.append_block("123456789", Block::assistant("hello!")).await.unwrap();

    let record = store.get_record("123456789").await.unwrap().unwrap();
    assert_eq!(record.len(), 3);
    assert_eq!(record.blocks[1].message_id(), Some("m-1"));
    assert!(record.updated_at >= record.created_at);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let store = InMemoryPersistenceClient::new();
    store.get_or_create("a", "persona").await.unwrap();
    store.get_or_create("b", "persona").await.unwrap();
    store.append_block("a", Block::user("only in a", "1")).await.unwrap();

    assert_eq!(store.list_blocks("a").await.unwrap().len(), 2);
    assert_eq!(store.list_blocks("b").await.unwrap().len(), 1);
    assert!(store.get_record("c").await.unwrap().is_none());
}

/// Each writer appends two blocks in order; all must land, after the persona,
/// with each writer's pair in the order it was written.
async fn assert_concurrent_appends_keep_order(store: Arc<dyn PersistenceClient>, session_id: &str) {
    const WRITERS: usize = 16;

    store.get_or_create(session_id, "persona").await.unwrap();

    let tasks: Vec<_> = (0..WRITERS)
        .map(|i| {
            let store = store.clone();
            let session_id = session_id.to_string();
            tokio::spawn(async move {
                store.append_block(&session_id, Block::user("first", format!("{i}-a"))).await.unwrap();
                store.append_block(&session_id, Block::user("second", format!("{i}-b"))).await.unwrap();
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let blocks = store.list_blocks(session_id).await.unwrap();
    assert_eq!(blocks.len(), 1 + 2 * WRITERS);
    assert_eq!(blocks[0].role(), BlockRole::System);
    assert!(blocks[1..].iter().all(|b| b.role() == BlockRole::User));

    let ids: Vec<&str> = blocks.iter().filter_map(|b| b.message_id()).collect();
    let unique: HashSet<&str> = ids.iter().copied().collect();
    assert_eq!(unique.len(), 2 * WRITERS);

    for i in 0..WRITERS {
        let first = ids.iter().position(|id| *id == format!("{i}-a")).unwrap();
        let second = ids.iter().position(|id| *id == format!("{i}-b")).unwrap();
        assert!(first < second, "writer {i} blocks out of order");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_keep_order() {
    let store: Arc<dyn PersistenceClient> = Arc::new(InMemoryPersistenceClient::new());
    assert_concurrent_appends_keep_order(store, "concurrent").await;
}

#[cfg(feature = "mongodb")]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires MONGODB_URI pointing at a running MongoDB"]
async fn test_mongo_concurrent_appends_keep_order() {
    use buddy_persist::MongoPersistenceClient;

    let uri = std::env::var("MONGODB_URI").unwrap();
    let store = MongoPersistenceClient::connect(&uri, "buddy_persist_test").await.unwrap();
    let session_id = format!("concurrent-{}", chrono::Utc::now().timestamp_nanos_opt().unwrap());
    assert_concurrent_appends_keep_order(Arc::new(store), &session_id).await;
}
