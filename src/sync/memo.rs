use super::MemoBuilder;
use crate::{
    common::{
        entry::Publisher,
        stats_counter::StatsCounter,
        table::{EntryTable, Lookup},
    },
    MemoError, MemoStats,
};

use std::{
    borrow::Borrow,
    collections::hash_map::RandomState,
    fmt,
    hash::{BuildHasher, Hash},
    sync::Arc,
};

pub(crate) type InitFn<K, V, E> = Arc<dyn Fn(&K) -> Result<V, E> + Send + Sync + 'static>;

/// A thread-safe memoizing cache that runs each key's computation at most once.
///
/// A `Memo` wraps a computation `Fn(&K) -> Result<V, E>`. The first
/// [`get`](#method.get) of a key runs the computation on the calling thread and
/// publishes its result; every other `get` of that key, concurrent or later,
/// receives a clone of the same result without running the computation again.
/// Lookups of different keys never wait for each other's computations.
///
/// Errors are memoized too: once the computation for a key has failed, every
/// `get` of that key returns the same error. There is no eviction, expiration
/// or retry; entries live as long as the memo.
///
/// # Example
///
/// ```rust
/// use memocache::sync::Memo;
/// use std::{
///     sync::atomic::{AtomicUsize, Ordering},
///     sync::Arc,
///     thread,
/// };
///
/// let calls = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&calls);
///
/// let memo: Memo<String, usize, String> = Memo::new(move |key: &String| {
///     counter.fetch_add(1, Ordering::Relaxed);
///     Ok(key.len())
/// });
///
/// let threads: Vec<_> = (0..4)
///     .map(|_| {
///         let memo = memo.clone();
///         thread::spawn(move || memo.get("hello").unwrap())
///     })
///     .collect();
///
/// for t in threads {
///     assert_eq!(t.join().unwrap(), 5);
/// }
/// assert_eq!(calls.load(Ordering::Relaxed), 1);
/// ```
///
/// # Sharing a memo across threads
///
/// Cloning is a cheap operation for `Memo` as it only clones a reference-counted
/// pointer; all clones share the same entries and the same computation.
///
/// # Thread Safety
///
/// - `Memo<K, V, E, S>` requires trait bounds `Send`, `Sync` and `'static` for
///   `K` (key), `V` (value), `E` (error) and `S` (hasher state).
/// - `Memo<K, V, E, S>` will implement `Send` and `Sync`.
///
/// If you want to store values that will be expensive to clone, wrap them by
/// `std::sync::Arc` before returning them from the computation.
pub struct Memo<K, V, E, S = RandomState> {
    inner: Arc<Inner<K, V, E, S>>,
}

struct Inner<K, V, E, S> {
    name: Option<String>,
    table: EntryTable<K, V, E, S>,
    init: InitFn<K, V, E>,
    stats: StatsCounter,
}

impl<K, V, E, S> Clone for Memo<K, V, E, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V, E, S> fmt::Debug for Memo<K, V, E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("name", &self.inner.name)
            .field("entry_count", &self.inner.table.len())
            .finish()
    }
}

impl<K, V, E> Memo<K, V, E, RandomState>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Constructs a new `Memo` around the `init` computation.
    ///
    /// No computation runs until the first `get`. To give the memo a name or
    /// a custom hasher, use the [`MemoBuilder`][builder-struct].
    ///
    /// [builder-struct]: ./struct.MemoBuilder.html
    pub fn new<F>(init: F) -> Self
    where
        F: Fn(&K) -> Result<V, E> + Send + Sync + 'static,
    {
        Self::builder().build(init)
    }

    /// Returns a [`MemoBuilder`][builder-struct], which can build a `Memo` with
    /// various configuration knobs.
    ///
    /// [builder-struct]: ./struct.MemoBuilder.html
    pub fn builder() -> MemoBuilder<K, V, E> {
        MemoBuilder::default()
    }
}

impl<K, V, E, S> Memo<K, V, E, S>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
    S: BuildHasher + Send + Sync + 'static,
{
    pub(crate) fn with_everything(
        name: Option<String>,
        initial_capacity: Option<usize>,
        build_hasher: S,
        init: InitFn<K, V, E>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                table: EntryTable::with_capacity_and_hasher(
                    initial_capacity.unwrap_or_default(),
                    build_hasher,
                ),
                init,
                stats: StatsCounter::default(),
            }),
        }
    }

    /// Returns the name of this memo, if one was given at build time.
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Returns a _clone_ of the result of the computation for `key`, running
    /// the computation if no caller has asked for this key before.
    ///
    /// - If the key has never been seen, the calling thread runs the
    ///   computation, stores its result and wakes any thread that arrived for
    ///   the same key in the meantime.
    /// - If another thread is running the key's computation, the calling thread
    ///   blocks until that result is published. There is no timeout.
    /// - If the result is already published, it is returned without blocking
    ///   and without taking any lock besides the table lookup.
    ///
    /// The table lock is released before the computation runs, so a slow key
    /// never delays lookups of other keys.
    ///
    /// The key may be any borrowed form of the memo's key type, but `Hash` and
    /// `Eq` on the borrowed form _must_ match those for the key type.
    ///
    /// # Errors
    ///
    /// - `MemoError::Computation` with the error the computation returned. All
    ///   callers of the key share the same `Arc`.
    /// - `MemoError::InitPanicked` if the computation for this key panicked.
    ///
    /// # Panics
    ///
    /// If the computation panics, the panic propagates to the thread that ran
    /// it. The entry is marked as panicked before unwinding continues, so every
    /// other caller of that key (waiting or future) gets
    /// `Err(MemoError::InitPanicked)` instead of blocking forever.
    pub fn get<Q>(&self, key: &Q) -> Result<V, MemoError<E>>
    where
        K: Borrow<Q>,
        Q: ToOwned<Owned = K> + Hash + Eq + ?Sized,
    {
        let inner = &*self.inner;
        match inner.table.get_or_insert(key) {
            Lookup::Ready(entry) => {
                inner.stats.record_hit();
                entry.wait_blocking().to_result()
            }
            Lookup::Pending(entry) => {
                inner.stats.record_join();
                entry.wait_blocking().to_result()
            }
            Lookup::Inserted(entry) => {
                inner.stats.record_miss();
                let publisher = Publisher::new(&entry, &inner.stats, inner.name.as_deref());
                let key = key.to_owned();
                let result = (inner.init)(&key);
                publisher.publish(result).to_result()
            }
        }
    }

    /// Returns a _clone_ of the key's result if it has already been computed.
    ///
    /// Never blocks and never starts a computation. Returns `None` if the key
    /// has not been asked for yet, or if its computation is still running.
    pub fn peek<Q>(&self, key: &Q) -> Option<Result<V, MemoError<E>>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entry = self.inner.table.get(key)?;
        let result = entry.outcome()?.to_result();
        self.inner.stats.record_hit();
        Some(result)
    }

    /// Returns `true` if the key has been asked for, whether or not its
    /// computation has finished.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.table.contains_key(key)
    }

    /// Returns the number of keys in this memo, including the ones still being
    /// computed.
    pub fn entry_count(&self) -> usize {
        self.inner.table.len()
    }

    /// Returns a snapshot of the statistics of this memo.
    pub fn stats(&self) -> MemoStats {
        self.inner.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::Memo;
    use crate::MemoError;

    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Barrier,
        },
        thread,
        time::Duration,
    };

    #[test]
    fn basic_single_thread() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let memo = Memo::new(move |key: &String| {
            counter.fetch_add(1, Ordering::AcqRel);
            if key.is_empty() {
                Err("empty key")
            } else {
                Ok(key.to_uppercase())
            }
        });

        assert_eq!(memo.entry_count(), 0);
        assert!(memo.peek("a").is_none());

        assert_eq!(memo.get("a").ok(), Some("A".to_string()));
        assert_eq!(memo.get("a").ok(), Some("A".to_string()));
        assert_eq!(memo.get("b").ok(), Some("B".to_string()));
        assert!(matches!(memo.peek("a"), Some(Ok(v)) if v == "A"));

        let e1 = memo.get("").unwrap_err();
        let e2 = memo.get("").unwrap_err();
        assert_eq!(**e1.computation_error().unwrap(), "empty key");
        assert!(Arc::ptr_eq(
            e1.computation_error().unwrap(),
            e2.computation_error().unwrap()
        ));

        assert_eq!(calls.load(Ordering::Acquire), 3);
        assert_eq!(memo.entry_count(), 3);
        assert!(memo.contains_key("b"));
        assert!(!memo.contains_key("c"));

        let stats = memo.stats();
        assert_eq!(stats.miss_count(), 3);
        assert_eq!(stats.hit_count(), 3); // two `get`s and one `peek`
        assert_eq!(stats.load_success_count(), 2);
        assert_eq!(stats.load_failure_count(), 1);
    }

    #[test]
    fn clones_share_entries() {
        let memo = Memo::new(|key: &u32| Ok::<_, ()>(key * 2));
        let other = memo.clone();

        assert_eq!(memo.get(&21).ok(), Some(42));
        assert!(other.contains_key(&21));
        assert_eq!(other.entry_count(), 1);
        assert_eq!(other.stats().miss_count(), 1);
    }

    #[test]
    fn waiters_join_a_slow_computation() {
        const NUM_THREADS: usize = 8;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let memo = Memo::new(move |_key: &String| {
            counter.fetch_add(1, Ordering::AcqRel);
            thread::sleep(Duration::from_millis(100));
            Ok::<_, String>(Arc::new(vec![1u8; 1024]))
        });
        let barrier = Arc::new(Barrier::new(NUM_THREADS));

        let threads: Vec<_> = (0..NUM_THREADS)
            .map(|_| {
                let memo = memo.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    memo.get("blob").unwrap()
                })
            })
            .collect();

        let values: Vec<_> = threads
            .into_iter()
            .map(|t| t.join().expect("thread failed"))
            .collect();

        assert_eq!(calls.load(Ordering::Acquire), 1);
        assert!(values.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));

        let stats = memo.stats();
        assert_eq!(stats.miss_count(), 1);
        assert_eq!(stats.request_count(), NUM_THREADS as u64);
        assert_eq!(stats.load_count(), 1);
    }

    #[test]
    fn panicking_computation_releases_waiters() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let memo: Memo<String, u32, ()> = Memo::new(move |key: &String| {
            counter.fetch_add(1, Ordering::AcqRel);
            if key == "bad" {
                thread::sleep(Duration::from_millis(100));
                panic!("computation for {key} panicked");
            }
            Ok(1)
        });

        let owner = {
            let memo = memo.clone();
            thread::spawn(move || memo.get("bad"))
        };
        // Let the owner insert the entry first.
        while !memo.contains_key("bad") {
            thread::yield_now();
        }
        let waiter = {
            let memo = memo.clone();
            thread::spawn(move || memo.get("bad"))
        };

        assert!(owner.join().is_err());
        assert!(matches!(
            waiter.join().expect("waiter panicked"),
            Err(MemoError::InitPanicked)
        ));

        // Later callers get the same outcome, and nothing is recomputed.
        assert!(matches!(memo.get("bad"), Err(MemoError::InitPanicked)));
        assert_eq!(memo.get("good").ok(), Some(1));
        assert_eq!(calls.load(Ordering::Acquire), 2);
        assert_eq!(memo.stats().load_incomplete_count(), 1);
    }

    #[test]
    fn key_is_cloned_only_on_a_miss() {
        static CLONES: AtomicUsize = AtomicUsize::new(0);

        #[derive(PartialEq, Eq, Hash)]
        struct Key(u32);

        impl Clone for Key {
            fn clone(&self) -> Self {
                CLONES.fetch_add(1, Ordering::AcqRel);
                Key(self.0)
            }
        }

        let memo = Memo::new(|key: &Key| Ok::<_, ()>(key.0 + 1));

        // One clone for the table, one for the computation.
        assert_eq!(memo.get(&Key(1)).ok(), Some(2));
        assert_eq!(CLONES.load(Ordering::Acquire), 2);

        assert_eq!(memo.get(&Key(1)).ok(), Some(2));
        assert!(memo.peek(&Key(1)).is_some());
        assert!(memo.contains_key(&Key(1)));
        assert_eq!(CLONES.load(Ordering::Acquire), 2);
    }

    #[test]
    fn debug_shows_name_and_entry_count() {
        let memo = Memo::builder()
            .name("lengths")
            .build(|key: &String| Ok::<_, ()>(key.len()));
        memo.get("abc").unwrap();

        assert_eq!(memo.name(), Some("lengths"));
        assert_eq!(
            format!("{memo:?}"),
            r#"Memo { name: Some("lengths"), entry_count: 1 }"#
        );
    }
}
