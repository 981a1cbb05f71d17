//! Keyed single-flight coalescing for expensive asynchronous lookups.
//!
//! Under N concurrent callers for the same key, the producer runs exactly
//! once; every caller receives a clone of the same settled value. The
//! in-flight slot is removed the instant the producer settles, so a failed
//! attempt never poisons the next call for that key.
//!
//! Slot bookkeeping (lookup, insertion, removal) happens inside a mutex
//! critical section that is never held across an await point.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use tokio::sync::broadcast;

/// Coalesces concurrent calls per key into one producer invocation.
///
/// `T` is typically a `Result` whose error type is `Clone`, so failures
/// are shared with every waiting caller the same way successes are.
pub struct SingleFlight<T> {
    inflight: Mutex<HashMap<String, broadcast::Sender<T>>>,
}

enum Role<T> {
    Leader,
    Follower(broadcast::Receiver<T>),
}

impl<T: Clone> SingleFlight<T> {
    pub fn new() -> Self {
        Self { inflight: Mutex::new(HashMap::new()) }
    }

    /// Run `producer` for `key`, or attach to the in-flight invocation.
    ///
    /// The first caller for a key becomes the leader and invokes
    /// `producer`; callers arriving before the leader settles subscribe to
    /// its outcome instead. If the leader's future is dropped before
    /// publishing, waiting followers fall back to their own attempt.
    pub async fn run<F, Fut>(&self, key: &str, producer: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let role = {
            let mut inflight = self.inflight.lock().expect("singleflight mutex poisoned");
            match inflight.get(key) {
                Some(tx) => Role::Follower(tx.subscribe()),
                None => {
                    let (tx, _) = broadcast::channel(1);
                    inflight.insert(key.to_owned(), tx);
                    Role::Leader
                }
            }
        };

        match role {
            Role::Follower(mut rx) => match rx.recv().await {
                Ok(value) => value,
                Err(_) => producer().await,
            },
            Role::Leader => {
                let slot = SlotGuard { flight: self, key, armed: true };
                let value = producer().await;
                if let Some(tx) = slot.publish() {
                    let _ = tx.send(value.clone());
                }
                value
            }
        }
    }

    /// Number of keys currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inflight.lock().expect("singleflight mutex poisoned").len()
    }
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes the slot even when the leader is cancelled mid-producer, so
/// followers observe a closed channel instead of waiting forever.
struct SlotGuard<'a, T> {
    flight: &'a SingleFlight<T>,
    key: &'a str,
    armed: bool,
}

impl<T> SlotGuard<'_, T> {
    fn publish(mut self) -> Option<broadcast::Sender<T>> {
        self.armed = false;
        self.flight
            .inflight
            .lock()
            .expect("singleflight mutex poisoned")
            .remove(self.key)
    }
}

impl<T> Drop for SlotGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed
            && let Ok(mut inflight) = self.flight.inflight.lock()
        {
            inflight.remove(self.key);
        }
    }
}
