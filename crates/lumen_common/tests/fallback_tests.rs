//! Fallback coordinator behaviour under a paused clock.
//!
//! Covers TTL caching across the expiry boundary, priority fallback with
//! attribution, and the cache flush when a better provider shows up.

use lumen_common::provider::{FakeOutcome, FakeProvider, FallbackCoordinator};
use lumen_common::AugmentError;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Cache
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_nba_fetched_once_within_ttl_and_again_after() {
    let coordinator = FallbackCoordinator::<u32>::new("sports");
    let espn = Arc::new(FakeProvider::returning("espn", 0, 7));
    coordinator.register(espn.clone()).await;

    let first = coordinator.fetch("nba").await.unwrap();
    assert!(!first.from_cache);

    tokio::time::advance(Duration::from_secs(10)).await;
    let second = coordinator.fetch("nba").await.unwrap();
    assert!(second.from_cache);
    assert_eq!(second.provider, "espn");
    assert_eq!(espn.call_count(), 1);

    tokio::time::advance(Duration::from_secs(51)).await;
    let third = coordinator.fetch("nba").await.unwrap();
    assert!(!third.from_cache);
    assert_eq!(espn.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_keys_are_cached_independently() {
    let coordinator = FallbackCoordinator::<u32>::new("sports");
    let espn = Arc::new(FakeProvider::returning("espn", 0, 1));
    coordinator.register(espn.clone()).await;

    coordinator.fetch("nba").await.unwrap();
    coordinator.fetch("nfl").await.unwrap();
    coordinator.fetch("nba").await.unwrap();
    assert_eq!(espn.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_custom_ttl() {
    let coordinator = FallbackCoordinator::<u32>::with_cache("weather", Duration::from_secs(5), 8);
    let provider = Arc::new(FakeProvider::returning("open-meteo", 0, 20));
    coordinator.register(provider.clone()).await;

    coordinator.fetch("boston").await.unwrap();
    tokio::time::advance(Duration::from_secs(4)).await;
    assert!(coordinator.fetch("boston").await.unwrap().from_cache);
    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(!coordinator.fetch("boston").await.unwrap().from_cache);
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_fetches_share_one_provider_call() {
    let coordinator = FallbackCoordinator::<u32>::new("sports");
    let espn = Arc::new(FakeProvider::returning("espn", 0, 9).with_delay(Duration::from_millis(100)));
    coordinator.register(espn.clone()).await;

    let (first, second) = tokio::join!(coordinator.fetch("nba"), coordinator.fetch("nba"));
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(espn.call_count(), 1);
    assert_eq!(first.value, 9);
    assert_eq!(second.value, 9);
    assert_ne!(first.from_cache, second.from_cache);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_fetches_for_different_keys_both_reach_provider() {
    let coordinator = FallbackCoordinator::<u32>::new("sports");
    let espn = Arc::new(FakeProvider::returning("espn", 0, 3).with_delay(Duration::from_millis(50)));
    coordinator.register(espn.clone()).await;

    let (nba, nfl) = tokio::join!(coordinator.fetch("nba"), coordinator.fetch("nfl"));
    assert!(!nba.unwrap().from_cache);
    assert!(!nfl.unwrap().from_cache);
    assert_eq!(espn.call_count(), 2);
}

// ============================================================================
// Fallback
// ============================================================================

#[tokio::test]
async fn test_primary_failure_attributes_to_backup_and_caches_it() {
    let coordinator = FallbackCoordinator::<&'static str>::new("sports");
    let primary = Arc::new(FakeProvider::failing("espn", 0, "503"));
    let backup = Arc::new(FakeProvider::returning("thesportsdb", 10, "backup board"));
    coordinator.register(backup.clone()).await;
    coordinator.register(primary.clone()).await;

    let fetched = coordinator.fetch("nba").await.unwrap();
    assert_eq!(fetched.value, "backup board");
    assert_eq!(fetched.provider, "thesportsdb");
    assert_eq!(primary.call_count(), 1);
    assert_eq!(backup.call_count(), 1);

    let cached = coordinator.fetch("nba").await.unwrap();
    assert!(cached.from_cache);
    assert_eq!(cached.provider, "thesportsdb");
    assert_eq!(primary.call_count(), 1);
}

#[tokio::test]
async fn test_recovered_primary_used_after_cache_cleared() {
    let coordinator = FallbackCoordinator::<u32>::new("sports");
    let primary = Arc::new(FakeProvider::failing("espn", 0, "down"));
    let backup = Arc::new(FakeProvider::returning("thesportsdb", 10, 2));
    coordinator.register(primary.clone()).await;
    coordinator.register(backup.clone()).await;

    assert_eq!(coordinator.fetch("nba").await.unwrap().provider, "thesportsdb");

    primary.set_outcome(FakeOutcome::Value(1));
    coordinator.clear_cache_for("nba").await;
    let fetched = coordinator.fetch("nba").await.unwrap();
    assert_eq!(fetched.provider, "espn");
    assert_eq!(fetched.value, 1);
}

#[tokio::test]
async fn test_all_unavailable_is_no_results() {
    let coordinator = FallbackCoordinator::<u32>::new("sports");
    let offline = Arc::new(FakeProvider::returning("espn", 0, 1).unavailable());
    coordinator.register(offline.clone()).await;

    let err = coordinator.fetch("nba").await.unwrap_err();
    assert!(matches!(err, AugmentError::NoResults));
    assert_eq!(err.reason(), "No data available");
    assert_eq!(offline.call_count(), 0);
}

#[tokio::test]
async fn test_registration_keeps_equal_priorities_in_insertion_order() {
    let coordinator = FallbackCoordinator::<u32>::new("sports");
    coordinator
        .register(Arc::new(FakeProvider::returning("a", 5, 1)))
        .await;
    coordinator
        .register(Arc::new(FakeProvider::returning("b", 5, 2)))
        .await;
    coordinator
        .register(Arc::new(FakeProvider::returning("c", 1, 3)))
        .await;
    assert_eq!(coordinator.providers().await, vec!["c", "a", "b"]);
    assert_eq!(coordinator.fetch("nba").await.unwrap().provider, "c");
}
