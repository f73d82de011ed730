use std::sync::Arc;
use std::thread;
use std::time::Duration;
use storefront_forms::infrastructure::mocks::{FailingStore, MockClock};
use storefront_forms::{
    KeyValueStore, LimiterMetrics, MemoryStore, RateLimitConfig, RateLimiterBuilder,
};

const T0: u64 = 1_700_000_000_000;

#[test]
fn test_checkout_limit_recovers_after_window() {
    let clock = MockClock::new(T0);
    let limiter = RateLimiterBuilder::new("checkout")
        .with_max_attempts(3)
        .with_window(Duration::from_millis(300_000))
        .with_clock(Arc::new(clock.clone()))
        .build(Arc::new(MemoryStore::new()))
        .unwrap();

    for _ in 0..3 {
        assert!(limiter.attempt());
    }
    assert!(!limiter.attempt());

    let status = limiter.check();
    assert!(!status.allowed);
    assert!(status.reset_in > Duration::ZERO);

    clock.advance(Duration::from_millis(300_000));
    assert!(limiter.check().allowed);
}

#[test]
fn test_state_survives_new_limiter_instance() {
    // a page reload builds a new limiter over the same storage
    let clock = MockClock::new(T0);
    let store = Arc::new(MemoryStore::new());
    let build = || {
        RateLimiterBuilder::new("login")
            .with_config(RateLimitConfig::login())
            .with_clock(Arc::new(clock.clone()))
            .build(store.clone())
            .unwrap()
    };

    let first = build();
    for _ in 0..5 {
        assert!(first.attempt());
    }
    drop(first);

    let second = build();
    assert!(!second.attempt());
    assert_eq!(second.check().remaining, 0);
}

#[test]
fn test_window_slides_per_attempt() {
    let clock = MockClock::new(T0);
    let limiter = RateLimiterBuilder::new("newsletter")
        .with_max_attempts(2)
        .with_window(Duration::from_secs(10))
        .with_clock(Arc::new(clock.clone()))
        .build(Arc::new(MemoryStore::new()))
        .unwrap();

    assert!(limiter.attempt());
    clock.advance(Duration::from_secs(6));
    assert!(limiter.attempt());
    assert!(!limiter.attempt());

    // only the first attempt has aged out
    clock.advance(Duration::from_secs(4));
    let status = limiter.check();
    assert_eq!(status.remaining, 1);
    assert_eq!(status.reset_in, Duration::from_secs(6));
}

#[test]
fn test_failing_store_never_blocks() {
    let store = FailingStore::new();
    let limiter = RateLimiterBuilder::new("login")
        .with_max_attempts(1)
        .with_clock(Arc::new(MockClock::new(T0)))
        .build(store.clone())
        .unwrap();

    for _ in 0..10 {
        assert!(limiter.attempt());
    }
    assert!(store.calls() >= 20);
    assert_eq!(limiter.metrics().attempts_blocked(), 0);
}

#[test]
fn test_shared_metrics_across_limiters() {
    let metrics = LimiterMetrics::new();
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(MockClock::new(T0));

    let limiters: Vec<_> = ["login", "checkout"]
        .iter()
        .map(|name| {
            RateLimiterBuilder::new(*name)
                .with_max_attempts(1)
                .with_clock(clock.clone())
                .with_metrics(metrics.clone())
                .build(store.clone())
                .unwrap()
        })
        .collect();

    for limiter in &limiters {
        limiter.attempt();
        limiter.attempt();
    }

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.attempts_allowed, 2);
    assert_eq!(snapshot.attempts_blocked, 2);
    assert!((snapshot.block_rate() - 0.5).abs() < f64::EPSILON);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_concurrent_limiters_share_store() {
    let store = Arc::new(MemoryStore::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let limiter = RateLimiterBuilder::new(format!("user-{i}"))
                    .with_max_attempts(5)
                    .with_clock(Arc::new(MockClock::new(T0)))
                    .build(store)
                    .unwrap();
                (0..10).filter(|_| limiter.attempt()).count()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 5);
    }
    assert_eq!(store.len(), 8);
    assert_eq!(
        store.get("ratelimit_user-3").unwrap(),
        Some(format!("[{T0},{T0},{T0},{T0},{T0}]"))
    );
}
