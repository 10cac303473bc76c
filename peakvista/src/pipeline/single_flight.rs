//! Request coalescing.
//!
//! Concurrent callers asking for the same key share one execution of the
//! underlying future. The entry is dropped once any caller observes the
//! result, so a later call starts fresh (and will see a cache hit instead).

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

type SharedTask<T> = Shared<BoxFuture<'static, T>>;

/// Per-key map of in-flight shared futures.
pub struct SingleFlight<K, T: Clone> {
    in_flight: Mutex<HashMap<K, (u64, SharedTask<T>)>>,
    generation: AtomicU64,
}

impl<K, T> SingleFlight<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Runs the future built by `make`, or joins the one already running
    /// for `key`. `make` is only called when no execution is in flight.
    pub async fn run<F, Fut>(&self, key: K, make: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (generation, task) = {
            let mut in_flight = self.in_flight.lock();
            match in_flight.get(&key) {
                Some(existing) => existing.clone(),
                None => {
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                    let task = make().boxed().shared();
                    in_flight.insert(key.clone(), (generation, task.clone()));
                    (generation, task)
                }
            }
        };

        let output = task.await;

        let mut in_flight = self.in_flight.lock();
        if in_flight.get(&key).is_some_and(|(g, _)| *g == generation) {
            in_flight.remove(&key);
        }
        output
    }

    /// Number of keys currently in flight.
    pub fn len(&self) -> usize {
        self.in_flight.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, T> Default for SingleFlight<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_calls_share_one_execution() {
        let flight: SingleFlight<u32, u32> = SingleFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let make = || {
            let calls = Arc::clone(&calls);
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                42
            }
        };

        let (a, b, c) = tokio::join!(
            flight.run(1, make()),
            flight.run(1, make()),
            flight.run(1, make()),
        );

        assert_eq!((a, b, c), (42, 42, 42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(flight.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_keys_run_separately() {
        let flight: SingleFlight<u32, u32> = SingleFlight::new();
        let (a, b) = tokio::join!(
            flight.run(1, || async { 1 }),
            flight.run(2, || async { 2 })
        );
        assert_eq!((a, b), (1, 2));
    }

    #[tokio::test]
    async fn test_sequential_calls_run_again() {
        let flight: SingleFlight<u32, usize> = SingleFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            flight
                .run(7, move || async move { calls.fetch_add(1, Ordering::SeqCst) })
                .await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
