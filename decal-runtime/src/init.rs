//! Cooperative dependency waits.
//!
//! Subsystems publish their products into a [`DependencyRegistry`] as they
//! come up; consumers wait for named dependencies with [`Initializer::wait_for`],
//! which polls once per rendered frame rather than sleeping for fixed
//! delays. A wait either resolves with the published value or fails with a
//! [`InitError::Timeout`]; either way the outcome is memoized, so repeated
//! waits for the same name return the same result without re-polling.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Result type for initializer operations.
pub type InitResult<T> = Result<T, InitError>;

/// Errors produced while bringing the editor up.
#[derive(Debug, Error)]
pub enum InitError {
    /// A dependency never became ready within the allotted window.
    #[error("dependency '{name}' not ready after {waited:?}")]
    Timeout {
        /// The dependency that never resolved.
        name: String,
        /// How long the wait lasted.
        waited: Duration,
    },

    /// A dependency resolved earlier with a different type than the one
    /// requested now.
    #[error("dependency '{name}' resolved with an unexpected type")]
    TypeMismatch {
        /// The dependency with conflicting waiters.
        name: String,
    },

    /// A required startup stage failed, halting the sequence.
    #[error("startup stage '{stage}' failed")]
    Stage {
        /// The stage that failed.
        stage: String,
        /// The underlying failure.
        #[source]
        source: anyhow::Error,
    },
}

/// Per-frame tick source.
///
/// The embedding render loop calls [`FrameClock::tick`] once per rendered
/// frame; dependency waits poll on each tick. Embedders without a render
/// loop can spawn a driver task instead.
#[derive(Clone)]
pub struct FrameClock {
    frames: Arc<watch::Sender<u64>>,
}

impl FrameClock {
    /// Create a clock at frame zero.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self {
            frames: Arc::new(tx),
        }
    }

    /// Advance the clock by one frame, waking every waiter.
    pub fn tick(&self) {
        self.frames.send_modify(|frame| *frame += 1);
    }

    /// The current frame number.
    #[must_use]
    pub fn frame(&self) -> u64 {
        *self.frames.borrow()
    }

    /// Subscribe to frame ticks.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.frames.subscribe()
    }

    /// Spawn a task that ticks the clock at a fixed period, for embedders
    /// that have no render loop of their own.
    pub fn spawn_driver(&self, period: Duration) -> JoinHandle<()> {
        let clock = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                clock.tick();
            }
        })
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Named runtime dependencies published by subsystems as they become
/// ready.
#[derive(Clone, Default)]
pub struct DependencyRegistry {
    inner: Arc<RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>>,
}

impl DependencyRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a dependency under a name, making it visible to waiters on
    /// the next frame tick. Re-publishing replaces the value.
    pub fn publish<T: Send + Sync + 'static>(&self, name: impl Into<String>, value: Arc<T>) {
        let name = name.into();
        if let Ok(mut map) = self.inner.write() {
            tracing::debug!(dependency = %name, "dependency published");
            map.insert(name, value);
        }
    }

    /// Fetch a published dependency by name and type.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        self.get_untyped(name)?.downcast::<T>().ok()
    }

    /// Fetch a published dependency by name only.
    #[must_use]
    pub fn get_untyped(&self, name: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.inner.read().ok()?.get(name).cloned()
    }

    /// Whether a dependency has been published.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner
            .read()
            .map(|map| map.contains_key(name))
            .unwrap_or(false)
    }
}

/// The memoized outcome of a named wait.
enum Outcome {
    Ready(Arc<dyn Any + Send + Sync>),
    TimedOut(Duration),
}

/// Waits for named dependencies, one poll per rendered frame.
pub struct Initializer {
    registry: DependencyRegistry,
    clock: FrameClock,
    outcomes: Mutex<HashMap<String, Outcome>>,
}

impl Initializer {
    /// Create an initializer over a registry and frame clock.
    #[must_use]
    pub fn new(registry: DependencyRegistry, clock: FrameClock) -> Self {
        Self {
            registry,
            clock,
            outcomes: Mutex::new(HashMap::new()),
        }
    }

    /// The registry dependencies are published into.
    #[must_use]
    pub fn registry(&self) -> &DependencyRegistry {
        &self.registry
    }

    /// Wait until the named dependency is published with type `T`, failing
    /// with [`InitError::Timeout`] if `timeout` elapses first.
    ///
    /// The outcome is memoized per name: later waits return the same value
    /// or the same timeout failure without polling again.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if the dependency never appears, or
    /// `TypeMismatch` if it resolved earlier under a different type.
    pub async fn wait_for<T: Send + Sync + 'static>(
        &self,
        name: &str,
        timeout: Duration,
    ) -> InitResult<Arc<T>> {
        let registry = self.registry.clone();
        let key = name.to_string();
        self.wait_for_with(name, move || registry.get_untyped(&key), timeout)
            .await?
            .downcast::<T>()
            .map_err(|_| InitError::TypeMismatch {
                name: name.to_string(),
            })
    }

    /// Wait until `poll` yields a value, polling once per frame tick.
    /// The outcome is memoized per name, exactly as with
    /// [`Initializer::wait_for`].
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if `poll` never yields within `timeout`.
    pub async fn wait_for_with<F>(
        &self,
        name: &str,
        mut poll: F,
        timeout: Duration,
    ) -> InitResult<Arc<dyn Any + Send + Sync>>
    where
        F: FnMut() -> Option<Arc<dyn Any + Send + Sync>>,
    {
        if let Some(outcome) = self.recorded(name) {
            return outcome;
        }

        let mut ticks = self.clock.watch();
        let waited = tokio::time::timeout(timeout, async {
            loop {
                if let Some(value) = poll() {
                    return value;
                }
                if ticks.changed().await.is_err() {
                    // The clock is gone; nothing will ever wake us again,
                    // so sit out the rest of the timeout.
                    futures::future::pending::<()>().await;
                }
            }
        })
        .await;

        match waited {
            Ok(value) => {
                self.record(name, Outcome::Ready(value.clone()));
                tracing::debug!(dependency = %name, "dependency ready");
                Ok(value)
            }
            Err(_) => {
                self.record(name, Outcome::TimedOut(timeout));
                Err(InitError::Timeout {
                    name: name.to_string(),
                    waited: timeout,
                })
            }
        }
    }

    /// Wait for every named dependency, failing on the first timeout.
    ///
    /// # Errors
    ///
    /// Returns the first `Timeout` among the waits.
    pub async fn wait_for_all(&self, names: &[&str], timeout: Duration) -> InitResult<()> {
        let waits = names.iter().map(|&name| {
            let registry = self.registry.clone();
            let key = name.to_string();
            self.wait_for_with(name, move || registry.get_untyped(&key), timeout)
        });
        futures::future::try_join_all(waits).await.map(|_| ())
    }

    fn recorded(&self, name: &str) -> Option<InitResult<Arc<dyn Any + Send + Sync>>> {
        let outcomes = self.outcomes.lock().ok()?;
        match outcomes.get(name)? {
            Outcome::Ready(value) => Some(Ok(value.clone())),
            Outcome::TimedOut(waited) => Some(Err(InitError::Timeout {
                name: name.to_string(),
                waited: *waited,
            })),
        }
    }

    fn record(&self, name: &str, outcome: Outcome) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.insert(name.to_string(), outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn harness() -> (DependencyRegistry, FrameClock, Initializer) {
        let registry = DependencyRegistry::new();
        let clock = FrameClock::new();
        let init = Initializer::new(registry.clone(), clock.clone());
        (registry, clock, init)
    }

    #[test]
    fn test_registry_publish_and_get() {
        let registry = DependencyRegistry::new();
        assert!(!registry.contains("greeting"));

        registry.publish("greeting", Arc::new("hello".to_string()));
        assert!(registry.contains("greeting"));
        assert_eq!(*registry.get::<String>("greeting").unwrap(), "hello");
        // Wrong type yields nothing rather than a panic.
        assert!(registry.get::<u64>("greeting").is_none());
    }

    #[test]
    fn test_frame_clock_ticks() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        clock.tick();
        clock.tick();
        assert_eq!(clock.frame(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_resolves_when_published() {
        let (registry, clock, init) = harness();
        let _driver = clock.spawn_driver(Duration::from_millis(16));

        let publisher = tokio::spawn({
            let registry = registry.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(40)).await;
                registry.publish("value", Arc::new(7_u32));
            }
        });

        let value = init
            .wait_for::<u32>("value", Duration::from_secs(1))
            .await
            .expect("should resolve");
        assert_eq!(*value, 7);
        publisher.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_times_out() {
        let (_registry, clock, init) = harness();
        let _driver = clock.spawn_driver(Duration::from_millis(16));

        let started = tokio::time::Instant::now();
        let result = init
            .wait_for::<u32>("never", Duration::from_millis(50))
            .await;
        let elapsed = started.elapsed();

        assert!(matches!(
            result,
            Err(InitError::Timeout { ref name, .. }) if name == "never"
        ));
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_outcome_is_memoized() {
        let (registry, clock, init) = harness();
        let _driver = clock.spawn_driver(Duration::from_millis(16));

        let first = init
            .wait_for::<u32>("late", Duration::from_millis(50))
            .await;
        assert!(first.is_err());

        // The dependency shows up after the wait already failed; the
        // recorded outcome wins over re-polling.
        registry.publish("late", Arc::new(9_u32));
        let second = init
            .wait_for::<u32>("late", Duration::from_millis(50))
            .await;
        assert!(matches!(second, Err(InitError::Timeout { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_memoized_value_with_wrong_type_is_rejected() {
        let (registry, clock, init) = harness();
        let _driver = clock.spawn_driver(Duration::from_millis(16));
        registry.publish("value", Arc::new("text".to_string()));

        init.wait_for::<String>("value", Duration::from_millis(50))
            .await
            .expect("should resolve");
        let mismatch = init.wait_for::<u32>("value", Duration::from_millis(50)).await;
        assert!(matches!(mismatch, Err(InitError::TypeMismatch { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_all_resolves_once_every_entry_does() {
        let (registry, clock, init) = harness();
        let _driver = clock.spawn_driver(Duration::from_millis(16));

        tokio::spawn({
            let registry = registry.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                registry.publish("a", Arc::new(1_u32));
                tokio::time::sleep(Duration::from_millis(20)).await;
                registry.publish("b", Arc::new(2_u32));
            }
        });

        init.wait_for_all(&["a", "b"], Duration::from_secs(1))
            .await
            .expect("both published");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_all_fails_on_first_timeout() {
        let (registry, clock, init) = harness();
        let _driver = clock.spawn_driver(Duration::from_millis(16));
        registry.publish("a", Arc::new(1_u32));

        let result = init
            .wait_for_all(&["a", "missing"], Duration::from_millis(50))
            .await;
        assert!(matches!(
            result,
            Err(InitError::Timeout { ref name, .. }) if name == "missing"
        ));
    }
}
