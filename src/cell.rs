//! Whole-value reactive cell.
//!
//! A cell holds one value. Mutation is replacement: the new value goes in,
//! the version counter is bumped, and every subscriber is invoked
//! synchronously on the committing thread with a reference to the committed
//! value. There is no diffing and no partial mutation; concurrent writers
//! race last-write-wins, which the version counter makes observable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

type Subscriber<T> = Box<dyn Fn(&T) + Send + Sync>;

struct CellInner<T> {
    value: RwLock<T>,
    version: AtomicU64,
    subscribers: RwLock<Vec<Subscriber<T>>>,
}

pub struct StateCell<T> {
    inner: Arc<CellInner<T>>,
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> StateCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(CellInner {
                value: RwLock::new(value),
                version: AtomicU64::new(0),
                subscribers: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.inner.value.read().unwrap().clone()
    }

    /// Number of commits so far. Starts at zero.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }

    /// Commit a new value, returning the new version. The value lock is
    /// released before subscribers run, so a subscriber may read the cell.
    pub fn replace(&self, value: T) -> u64 {
        let committed = {
            let mut guard = self.inner.value.write().unwrap();
            *guard = value;
            guard.clone()
        };
        let version = self.inner.version.fetch_add(1, Ordering::SeqCst) + 1;
        for subscriber in self.inner.subscribers.read().unwrap().iter() {
            subscriber(&committed);
        }
        version
    }

    /// Commit the result of applying `f` to a clone of the current value.
    ///
    /// Read and write are two separate lock acquisitions; two concurrent
    /// updates race last-write-wins.
    pub fn update(&self, f: impl FnOnce(T) -> T) -> u64 {
        self.replace(f(self.get()))
    }

    /// Register a subscriber invoked on every subsequent commit.
    pub fn subscribe(&self, subscriber: impl Fn(&T) + Send + Sync + 'static) {
        self.inner
            .subscribers
            .write()
            .unwrap()
            .push(Box::new(subscriber));
    }
}
