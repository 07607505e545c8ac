//! # In-Flight Counter Tests

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use dtp_transport::InFlightCounter;

#[test]
fn test_increment_decrement() {
    let counter = InFlightCounter::new();
    assert_eq!(counter.current(), 0);

    counter.increment();
    counter.increment();
    assert_eq!(counter.current(), 2);

    counter.decrement();
    counter.decrement();
    assert_eq!(counter.current(), 0);
}

/// Answering a request twice is a bug, not a silent wraparound.
#[test]
#[should_panic(expected = "decrement called at 0")]
fn test_decrement_at_zero_panics() {
    InFlightCounter::new().decrement();
}

#[test]
fn test_wait_for_zero_returns_immediately_when_idle() {
    let t = Instant::now();
    InFlightCounter::new().wait_for_zero();
    assert!(t.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_wait_for_zero_wakes_on_last_decrement() {
    let counter = Arc::new(InFlightCounter::new());
    for _ in 0..8 {
        counter.increment();
    }

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let counter = counter.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(5 * i));
                counter.decrement();
            })
        })
        .collect();

    counter.wait_for_zero();
    assert_eq!(counter.current(), 0);

    for w in workers {
        w.join().unwrap();
    }
}

#[test]
fn test_wait_for_zero_timeout() {
    let counter = Arc::new(InFlightCounter::new());
    counter.increment();

    assert!(!counter.wait_for_zero_timeout(Duration::from_millis(20)));
    assert_eq!(counter.current(), 1);

    let releaser = {
        let counter = counter.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            counter.decrement();
        })
    };
    assert!(counter.wait_for_zero_timeout(Duration::from_secs(5)));
    releaser.join().unwrap();
}
