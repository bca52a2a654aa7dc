//! Per-key single-flight deduplication.
//!
//! The first task to request a key runs the underlying future; concurrent
//! requesters for the same key await that same shared future instead of
//! duplicating the work. Used to guarantee that a cache miss for a given
//! coordinate triggers exactly one network fetch no matter how many
//! branches of the dependency graph need it.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

type SharedFlight<T> = Shared<BoxFuture<'static, T>>;

/// A keyed map of in-flight shared futures.
pub struct Flight<T: Clone> {
    inflight: Mutex<HashMap<String, SharedFlight<T>>>,
}

impl<T: Clone + Send + Sync + 'static> Flight<T> {
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Run `work` for `key`, joining an existing in-flight run if present.
    pub async fn run<F>(&self, key: &str, work: F) -> T
    where
        F: Future<Output = T> + Send + 'static,
    {
        let (shared, leader) = {
            let mut inflight = self.inflight.lock().unwrap();
            match inflight.get(key) {
                Some(existing) => (existing.clone(), false),
                None => {
                    let shared = work.boxed().shared();
                    inflight.insert(key.to_string(), shared.clone());
                    (shared, true)
                }
            }
        };

        let result = shared.await;

        if leader {
            self.inflight.lock().unwrap().remove(key);
        }

        result
    }

    /// Number of keys currently in flight.
    pub fn len(&self) -> usize {
        self.inflight.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync + 'static> Default for Flight<T> {
    fn default() -> Self {
        Self::new()
    }
}
