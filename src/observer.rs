//! Resolution observers.
//!
//! Observers receive a callback around every resolution that goes through a
//! provider or scope. The container ships [`TracingObserver`], which turns
//! those callbacks into `tracing` events; tests plug in their own to count
//! constructions or record lifetimes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::DiError;
use crate::key::Key;
use crate::lifetime::Lifetime;

/// Hook for observing service resolution.
///
/// # Examples
///
/// ```
/// use opscope::{DiObserver, DiError, Key, Lifetime, ServiceCollection, Resolver};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Counting(AtomicUsize);
///
/// impl DiObserver for Counting {
///     fn resolving(&self, _key: &Key, _lifetime: Lifetime) {}
///     fn resolved(&self, _key: &Key, _lifetime: Lifetime, _elapsed: Duration) {
///         self.0.fetch_add(1, Ordering::SeqCst);
///     }
///     fn resolution_failed(&self, _key: &Key, _error: &DiError) {}
/// }
///
/// let counting = Arc::new(Counting::default());
/// let mut services = ServiceCollection::new();
/// services.add_singleton(7u8);
/// services.add_observer(counting.clone());
///
/// let provider = services.build();
/// provider.get_required::<u8>();
/// assert_eq!(counting.0.load(Ordering::SeqCst), 1);
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before the lifetime policy is applied.
    fn resolving(&self, key: &Key, lifetime: Lifetime);

    /// Called after an instance was produced (constructed or taken from a cache).
    fn resolved(&self, key: &Key, lifetime: Lifetime, elapsed: Duration);

    /// Called when resolution fails, including for unregistered keys.
    fn resolution_failed(&self, key: &Key, error: &DiError);
}

/// Observer that emits `tracing` events for every resolution.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TracingObserver {
    pub fn new() -> Self {
        Self
    }
}

impl DiObserver for TracingObserver {
    fn resolving(&self, key: &Key, lifetime: Lifetime) {
        tracing::trace!(service = key.display_name(), %lifetime, "resolving");
    }

    fn resolved(&self, key: &Key, lifetime: Lifetime, elapsed: Duration) {
        tracing::trace!(service = key.display_name(), %lifetime, ?elapsed, "resolved");
    }

    fn resolution_failed(&self, key: &Key, error: &DiError) {
        tracing::warn!(service = key.display_name(), error = %error, "resolution failed");
    }
}

/// Registered observers, invoked in registration order.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline(always)]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    /// Wraps a resolution with `resolving` / `resolved` / `resolution_failed`.
    pub(crate) fn observe<T, F>(&self, key: &Key, lifetime: Lifetime, f: F) -> Result<T, DiError>
    where
        F: FnOnce() -> Result<T, DiError>,
    {
        if !self.has_observers() {
            return f();
        }

        for observer in &self.observers {
            observer.resolving(key, lifetime);
        }
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        match &result {
            Ok(_) => {
                for observer in &self.observers {
                    observer.resolved(key, lifetime, elapsed);
                }
            }
            Err(error) => self.failed(key, error),
        }
        result
    }

    pub(crate) fn failed(&self, key: &Key, error: &DiError) {
        for observer in &self.observers {
            observer.resolution_failed(key, error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Resolver, ServiceCollection};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        events: Mutex<Vec<String>>,
    }

    impl DiObserver for Recording {
        fn resolving(&self, _key: &Key, lifetime: Lifetime) {
            self.events.lock().unwrap().push(format!("resolving {lifetime}"));
        }

        fn resolved(&self, _key: &Key, lifetime: Lifetime, _elapsed: Duration) {
            self.events.lock().unwrap().push(format!("resolved {lifetime}"));
        }

        fn resolution_failed(&self, _key: &Key, error: &DiError) {
            self.events.lock().unwrap().push(format!("failed {error}"));
        }
    }

    #[test]
    fn observers_see_successful_and_failed_resolutions() {
        let recording = Arc::new(Recording::default());
        let mut services = ServiceCollection::new();
        services.add_transient_factory::<u8, _>(|_| 1);
        services.add_observer(recording.clone());

        let provider = services.build();
        provider.get_required::<u8>();
        assert!(provider.get::<u16>().is_err());

        let events = recording.events.lock().unwrap();
        assert_eq!(events[0], "resolving Transient");
        assert_eq!(events[1], "resolved Transient");
        assert_eq!(events[2], "failed Service not found: u16");
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn observers_are_told_about_cycles() {
        struct Looping;

        let recording = Arc::new(Recording::default());
        let mut services = ServiceCollection::new();
        services.register::<Looping, _>(Lifetime::Transient, |r| {
            r.get::<Looping>()?;
            Ok(Looping)
        });
        services.add_observer(recording.clone());

        let provider = services.build();
        assert!(provider.get::<Looping>().is_err());

        let events = recording.events.lock().unwrap();
        let cycles = events
            .iter()
            .filter(|e| e.starts_with("failed Circular dependency"))
            .count();
        // Once where the cycle is detected, once for the outer resolution.
        assert_eq!(cycles, 2, "{events:?}");
    }

    #[test]
    fn observe_without_observers_runs_the_resolution() {
        let observers = Observers::new();
        assert!(!observers.has_observers());
        let key = crate::key_of_type::<u8>();
        assert_eq!(observers.observe(&key, Lifetime::Singleton, || Ok(5)), Ok(5));
    }
}
