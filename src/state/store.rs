use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

type Subscriber<T> = Arc<dyn Fn(&T) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Shared value with explicit change subscriptions.
///
/// Clones share the same value and subscriber list, so a store is handed to
/// whichever components need it instead of living in a global.
pub struct Store<T> {
    inner: Arc<StoreInner<T>>,
}

struct StoreInner<T> {
    value: RwLock<T>,
    subscribers: Mutex<BTreeMap<SubscriptionId, Subscriber<T>>>,
    next_id: AtomicU64,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Store<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                value: RwLock::new(initial),
                subscribers: Mutex::new(BTreeMap::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.read(T::clone)
    }

    /// Reads through the lock without cloning the value.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self
            .inner
            .value
            .read()
            .unwrap_or_else(|err| err.into_inner());
        f(&guard)
    }

    pub fn set(&self, value: T) {
        self.update(|current| *current = value);
    }

    /// Mutates the value in place and notifies subscribers with the result.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let snapshot = {
            let mut guard = self
                .inner
                .value
                .write()
                .unwrap_or_else(|err| err.into_inner());
            f(&mut guard);
            guard.clone()
        };
        self.notify(&snapshot);
    }

    /// Registers `callback` to run after every change. It does not run for
    /// the current value.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers().insert(id, Arc::new(callback));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers().remove(&id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }

    fn subscribers(&self) -> std::sync::MutexGuard<'_, BTreeMap<SubscriptionId, Subscriber<T>>> {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(|err| err.into_inner())
    }

    // Callbacks run outside both locks so they may read or update the store.
    fn notify(&self, value: &T) {
        let callbacks: Vec<Subscriber<T>> = self.subscribers().values().cloned().collect();
        for callback in callbacks {
            callback(value);
        }
    }
}
