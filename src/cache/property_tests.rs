//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check capacity, eviction order, expiry and statistics
//! over arbitrary operation sequences. Time is driven by a manual clock so
//! no test sleeps.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::CacheStore;
use crate::clock::ManualClock;

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const TEST_TTL: Duration = Duration::from_secs(60);

// == Strategies ==
/// Generates cache keys from a small alphabet so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-h]{1,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = u32> {
    any::<u32>()
}

/// A cache operation, or a clock advance in milliseconds
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: u32 },
    Get { key: String },
    Delete { key: String },
    Advance { millis: u64 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
        (0u64..30_000).prop_map(|millis| CacheOp::Advance { millis }),
    ]
}

fn manual_store(max_size: usize) -> (CacheStore<u32>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    (CacheStore::with_clock(max_size, TEST_TTL, clock.clone()), clock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Property 1: Statistics Accuracy
    // Hits and misses reported by stats() match what get() returned.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let (mut store, clock) = manual_store(TEST_MAX_ENTRIES);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;
        let mut written = HashSet::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    written.insert(key.clone());
                    store.set(key, value);
                }
                CacheOp::Get { key } => match store.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Delete { key } => {
                    store.delete(&key);
                }
                CacheOp::Advance { millis } => clock.advance(Duration::from_millis(millis)),
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_requests, expected_hits + expected_misses);
        let live = written.iter().filter(|key| store.has(key)).count();
        prop_assert_eq!(stats.current_size, live, "Size mismatch");
    }

    // Property 2: Capacity Enforcement
    // current_size never exceeds max_size, whatever the write sequence.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec((key_strategy(), value_strategy()), 1..200),
        max_size in 1usize..20
    ) {
        let (mut store, clock) = manual_store(max_size);

        for (key, value) in entries {
            store.set(key, value);
            clock.advance(Duration::from_millis(1));
            let stats = store.stats();
            prop_assert!(
                stats.current_size <= max_size,
                "Cache size {} exceeds max {}",
                stats.current_size,
                max_size
            );
        }
    }

    // Property 3: LRU Eviction Order
    // When a new key is written into a full cache, the evicted key is the one
    // with the oldest last access among the current entries. The TTL is long
    // enough that nothing expires during the run.
    #[test]
    fn prop_lru_evicts_oldest_access(
        ops in prop::collection::vec(cache_op_strategy(), 1..120),
        max_size in 1usize..6
    ) {
        let clock = Arc::new(ManualClock::new());
        let mut store: CacheStore<u32> =
            CacheStore::with_clock(max_size, Duration::from_secs(86_400), clock.clone());
        // key -> touch order; access instants never decrease, so touch order
        // is last-access order with ties broken by the earlier touch
        let mut model: HashMap<String, u64> = HashMap::new();
        let mut touches: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    let victim = if !model.contains_key(&key) && model.len() >= max_size {
                        model
                            .iter()
                            .min_by_key(|(_, order)| **order)
                            .map(|(k, _)| k.clone())
                    } else {
                        None
                    };

                    store.set(key.clone(), value);
                    touches += 1;
                    model.insert(key, touches);

                    if let Some(victim) = victim {
                        prop_assert!(!store.has(&victim), "Expected '{}' to be evicted", victim);
                        model.remove(&victim);
                    }
                }
                CacheOp::Get { key } => {
                    let hit = store.get(&key).is_some();
                    prop_assert_eq!(hit, model.contains_key(&key));
                    if hit {
                        touches += 1;
                        model.insert(key, touches);
                    }
                }
                CacheOp::Delete { key } => {
                    prop_assert_eq!(store.delete(&key), model.remove(&key).is_some());
                }
                CacheOp::Advance { millis } => clock.advance(Duration::from_millis(millis)),
            }
            prop_assert_eq!(store.len(), model.len());
            prop_assert!(store.len() <= max_size);
        }
    }

    // Property 4: TTL Expiration Behavior
    // An entry written at T is a hit before T + ttl and a miss from T + ttl on.
    #[test]
    fn prop_ttl_expiration_behavior(
        key in key_strategy(),
        value in value_strategy(),
        probe_millis in 0u64..120_000
    ) {
        let (mut store, clock) = manual_store(TEST_MAX_ENTRIES);
        store.set(key.clone(), value);

        clock.advance(Duration::from_millis(probe_millis));
        let result = store.get(&key);

        if Duration::from_millis(probe_millis) < TEST_TTL {
            prop_assert_eq!(result, Some(value));
        } else {
            prop_assert_eq!(result, None);
        }
    }

    // Property 5: Overwrite Semantics
    // Writing V1 then V2 under one key leaves a single entry holding V2.
    #[test]
    fn prop_overwrite_semantics(key in key_strategy(), v1 in value_strategy(), v2 in value_strategy()) {
        let (mut store, _) = manual_store(TEST_MAX_ENTRIES);

        store.set(key.clone(), v1);
        store.set(key.clone(), v2);

        prop_assert_eq!(store.get(&key), Some(v2));
        prop_assert_eq!(store.len(), 1);
    }

    // Property 6: Clear Is Idempotent
    // clear() always yields zeroed counters, however many times it runs.
    #[test]
    fn prop_clear_resets(ops in prop::collection::vec(cache_op_strategy(), 0..50), repeats in 1usize..3) {
        let (mut store, clock) = manual_store(TEST_MAX_ENTRIES);
        for op in ops {
            match op {
                CacheOp::Set { key, value } => store.set(key, value),
                CacheOp::Get { key } => { store.get(&key); }
                CacheOp::Delete { key } => { store.delete(&key); }
                CacheOp::Advance { millis } => clock.advance(Duration::from_millis(millis)),
            }
        }

        for _ in 0..repeats {
            store.clear();
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, 0);
        prop_assert_eq!(stats.misses, 0);
        prop_assert_eq!(stats.total_requests, 0);
        prop_assert_eq!(stats.current_size, 0);
    }
}

// == Concurrent Access ==
// Shared access through Arc<RwLock<CacheStore>> keeps the cache consistent.

proptest! {
    #![proptest_config(ProptestConfig::with_cases(25))]

    // Property 7: Concurrent Operation Correctness
    #[test]
    fn prop_concurrent_operation_correctness(
        operations in prop::collection::vec(cache_op_strategy(), 10..50)
    ) {
        use tokio::sync::RwLock;

        let rt = tokio::runtime::Runtime::new().unwrap();

        rt.block_on(async {
            let store = Arc::new(RwLock::new(CacheStore::<u32>::new(8, TEST_TTL)));
            let mut handles = vec![];

            for op in operations {
                let store = Arc::clone(&store);
                handles.push(tokio::spawn(async move {
                    let mut cache = store.write().await;
                    match op {
                        CacheOp::Set { key, value } => cache.set(key, value),
                        CacheOp::Get { key } => { cache.get(&key); }
                        CacheOp::Delete { key } => { cache.delete(&key); }
                        CacheOp::Advance { .. } => {}
                    }
                }));
            }

            for handle in handles {
                handle.await.expect("Task should not panic");
            }

            let stats = store.read().await.stats();
            prop_assert!(stats.current_size <= 8, "Cache should not exceed max entries");
            let hit_rate = stats.hit_rate();
            prop_assert!((0.0..=1.0).contains(&hit_rate), "Hit rate out of range: {}", hit_rate);
            Ok(())
        })?;
    }
}

// == Scenario Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_entry_lifecycle() {
        let (mut store, clock) = manual_store(TEST_MAX_ENTRIES);

        store.set("u:1", 1);

        clock.set_elapsed(Duration::from_millis(30_000));
        assert_eq!(store.get("u:1"), Some(1));

        clock.set_elapsed(Duration::from_millis(61_000));
        assert_eq!(store.get("u:1"), None);
    }

    #[test]
    fn test_evicts_oldest_last_access_not_oldest_insert() {
        let (mut store, clock) = manual_store(3);

        store.set("a", 1);
        clock.advance(Duration::from_secs(1));
        store.set("b", 2);
        clock.advance(Duration::from_secs(1));
        store.set("c", 3);
        clock.advance(Duration::from_secs(1));

        store.get("a");
        store.get("b");
        clock.advance(Duration::from_secs(1));
        store.set("d", 4);

        assert!(!store.has("c"));
        assert!(store.has("a"));
        assert!(store.has("b"));
        assert!(store.has("d"));
    }
}
