//! Integration tests for chanmap: single-caller behaviour against a reference map

use chanmap::{BasicMap, ChannelConcurrentMap, ConcurrentMap};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn test_typed_matches_reference_map() {
    let cm = ConcurrentMap::new(BasicMap::new());
    let mut reference: HashMap<u32, u64> = HashMap::new();
    let mut rng = StdRng::seed_from_u64(7);

    for step in 0..2_000u64 {
        let key = rng.gen_range(0..32u32);
        match rng.gen_range(0..4) {
            0 | 1 => {
                reference.insert(key, step);
                assert_eq!(cm.set(key, step).await.unwrap(), reference.len());
            }
            2 => {
                reference.remove(&key);
                assert_eq!(cm.delete(key).await.unwrap(), reference.len());
            }
            _ => {
                assert_eq!(cm.get(key).await.unwrap(), reference.get(&key).copied());
                assert_eq!(cm.contains(key).await.unwrap(), reference.contains_key(&key));
            }
        }
        assert_eq!(cm.len().await.unwrap(), reference.len());
    }

    assert_eq!(cm.underlying_storage().await.unwrap(), reference);
}

#[tokio::test]
async fn test_uniform_matches_reference_map() {
    let cm = ChannelConcurrentMap::new(BasicMap::new());
    let mut reference: HashMap<u32, u64> = HashMap::new();
    let mut rng = StdRng::seed_from_u64(11);

    for step in 0..2_000u64 {
        let key = rng.gen_range(0..32u32);
        match rng.gen_range(0..4) {
            0 | 1 => {
                assert_eq!(cm.set(key, step).await.unwrap(), reference.insert(key, step));
            }
            2 => {
                assert_eq!(cm.delete(key).await.unwrap(), reference.remove(&key));
            }
            _ => {
                assert_eq!(cm.get(key).await.unwrap(), reference.get(&key).copied());
                assert_eq!(cm.contains(key).await.unwrap(), reference.contains_key(&key));
            }
        }
        assert_eq!(cm.len().await.unwrap(), reference.len());
    }

    let mut keys = cm.keys().await.unwrap();
    keys.sort_unstable();
    let mut expected: Vec<u32> = reference.keys().copied().collect();
    expected.sort_unstable();
    assert_eq!(keys, expected);
}

#[tokio::test]
async fn test_wraps_prefilled_map() {
    let seeded: BasicMap<String, i32> = [("one".to_string(), 1), ("two".to_string(), 2)]
        .into_iter()
        .collect();

    let typed = ConcurrentMap::new(seeded.clone());
    assert_eq!(typed.len().await.unwrap(), 2);
    assert_eq!(typed.get("two".to_string()).await.unwrap(), Some(2));

    let uniform = ChannelConcurrentMap::new(seeded);
    assert_eq!(uniform.render().await.unwrap(), "map[one:1 two:2]");
}

#[tokio::test]
async fn test_set_async_does_not_block_caller() {
    let cm = ConcurrentMap::new_basic();
    cm.set("a", 1).await.unwrap();
    let fired = Arc::new(AtomicBool::new(false));

    let flag = fired.clone();
    let handle = cm.set_async("b", 2, move |len| {
        assert_eq!(len.unwrap(), 2);
        flag.store(true, Ordering::SeqCst);
    });

    // Single-threaded test runtime: the spawned task cannot have run yet.
    assert!(!fired.load(Ordering::SeqCst));
    handle.await.unwrap();
    assert!(fired.load(Ordering::SeqCst));

    // Same answer the synchronous call gives on the same state.
    assert_eq!(cm.set("b", 2).await.unwrap(), 2);
}
