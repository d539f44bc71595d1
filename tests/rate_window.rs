//! Sliding-window behavior against real time.

use std::time::Duration;

use custos::{ClientKey, FailureLimiter, RateDecision, RateWindowStore, VolumeLimiter};

fn key() -> ClientKey {
    ClientKey::Ip("203.0.113.7".to_string())
}

#[tokio::test]
async fn ceiling_of_five_blocks_the_sixth() {
    let limiter = VolumeLimiter::new(
        Duration::from_secs(60),
        5,
        5,
        Duration::from_millis(500),
    );
    for _ in 0..5 {
        assert_eq!(limiter.register(&key()), RateDecision::Allowed);
    }
    assert!(limiter.register(&key()).is_limited());
}

#[tokio::test]
async fn window_resets_after_its_full_duration() {
    let store = RateWindowStore::new(Duration::from_secs(1));
    for _ in 0..5 {
        store.increment(&key());
    }
    assert_eq!(store.total(&key()), 5);

    // A one-bucket window clears entirely once the bucket rotates out.
    tokio::time::sleep(Duration::from_millis(2200)).await;
    assert_eq!(store.total(&key()), 0);
    assert_eq!(store.increment(&key()), 1);
}

#[tokio::test]
async fn successful_attempts_do_not_trip_bruteforce_protection() {
    let limiter = FailureLimiter::new(Duration::from_secs(60), 3);
    let key = ClientKey::Ip("198.51.100.2".to_string());

    for _ in 0..20 {
        assert_eq!(limiter.register(&key), RateDecision::Allowed);
        limiter.report_success(&key);
    }
    for _ in 0..3 {
        assert_eq!(limiter.register(&key), RateDecision::Allowed);
    }
    assert!(limiter.register(&key).is_limited());
}

#[tokio::test]
async fn instance_and_ip_keys_are_independent() {
    let limiter = VolumeLimiter::new(
        Duration::from_secs(60),
        1,
        1,
        Duration::from_millis(100),
    );
    let instance = ClientKey::from_request(Some(uuid::Uuid::new_v4()), Some("203.0.113.7"))
        .expect("instance key");
    let ip = ClientKey::from_request(None, Some("203.0.113.7")).expect("ip key");

    assert_eq!(limiter.register(&instance), RateDecision::Allowed);
    assert_eq!(limiter.register(&ip), RateDecision::Allowed);
    assert!(limiter.register(&instance).is_limited());
}
