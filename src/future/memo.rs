use super::MemoBuilder;
use crate::{
    common::{
        entry::Publisher,
        stats_counter::StatsCounter,
        table::{EntryTable, Lookup},
    },
    MemoError, MemoStats,
};

use futures_util::future::BoxFuture;
use std::{
    borrow::Borrow,
    collections::hash_map::RandomState,
    fmt,
    future::Future,
    hash::{BuildHasher, Hash},
    sync::Arc,
};

pub(crate) type InitFn<K, V, E> =
    Arc<dyn Fn(K) -> BoxFuture<'static, Result<V, E>> + Send + Sync + 'static>;

/// A thread-safe, futures-aware memoizing cache that resolves each key's
/// computation at most once.
///
/// A `Memo` wraps an asynchronous computation `Fn(K) -> impl Future<Output =
/// Result<V, E>>`. The first [`get`](#method.get) of a key creates the
/// computation's future and drives it inside that `get`; every other `get` of
/// the key, concurrent or later, awaits the published result instead of
/// creating another future. Lookups of different keys never wait for each other.
///
/// Results, including errors, are kept for the lifetime of the memo.
///
/// To use this type, enable a crate feature called "future".
///
/// # Example
///
/// ```rust
/// // Cargo.toml
/// //
/// // [dependencies]
/// // memocache = { version = "0.1", features = ["future"] }
/// // tokio = { version = "1", features = ["rt-multi-thread", "macros" ] }
/// // futures-util = "0.3"
///
/// use memocache::future::Memo;
/// use std::sync::{
///     atomic::{AtomicUsize, Ordering},
///     Arc,
/// };
///
/// #[tokio::main]
/// async fn main() {
///     let calls = Arc::new(AtomicUsize::new(0));
///     let counter = Arc::clone(&calls);
///
///     let memo: Memo<String, usize, String> = Memo::new(move |key: String| {
///         counter.fetch_add(1, Ordering::Relaxed);
///         async move { Ok(key.len()) }
///     });
///
///     let gets = (0..4).map(|_| memo.get("hello"));
///     let values = futures_util::future::join_all(gets).await;
///
///     assert!(values.iter().all(|v| matches!(v, Ok(5))));
///     assert_eq!(calls.load(Ordering::Relaxed), 1);
/// }
/// ```
///
/// # Cancellation
///
/// The computation is driven by the `get` call that created the key's entry.
/// If that call's future is dropped before the computation finishes (for
/// example, it lost a `select!` or hit a timeout), the computation is dropped
/// with it, and the key is permanently marked as aborted: every caller of the
/// key gets `Err(MemoError::InitAborted)`. Dropping a `get` that was only
/// waiting for another caller's computation has no effect on the key.
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
    /// `init` is called with an owned key, once per key, and the future it
    /// returns is awaited by the first `get` of that key.
    pub fn new<F, Fut>(init: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
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

    /// Returns a _clone_ of the result of the computation for `key`, resolving
    /// the computation if no caller has asked for this key before.
    ///
    /// If another task is resolving the key's computation, this waits for its
    /// result without blocking the executor thread. There is no timeout; wrap
    /// the call in one (e.g. `tokio::time::timeout`) to give up waiting. See
    /// the [cancellation](#cancellation) notes for what giving up means for
    /// the caller that is resolving the computation.
    ///
    /// # Errors
    ///
    /// - `MemoError::Computation` with the error the computation returned. All
    ///   callers of the key share the same `Arc`.
    /// - `MemoError::InitPanicked` if the computation for this key panicked.
    /// - `MemoError::InitAborted` if the `get` resolving the computation was
    ///   dropped before it finished.
    ///
    /// # Panics
    ///
    /// If the computation's future panics, the panic propagates to the task
    /// that was resolving it. Every other caller of the key gets
    /// `Err(MemoError::InitPanicked)`.
    pub async fn get<Q>(&self, key: &Q) -> Result<V, MemoError<E>>
    where
        K: Borrow<Q>,
        Q: ToOwned<Owned = K> + Hash + Eq + ?Sized,
    {
        let inner = &*self.inner;
        match inner.table.get_or_insert(key) {
            Lookup::Ready(entry) => {
                inner.stats.record_hit();
                entry.wait().await.to_result()
            }
            Lookup::Pending(entry) => {
                inner.stats.record_join();
                entry.wait().await.to_result()
            }
            Lookup::Inserted(entry) => {
                inner.stats.record_miss();
                let publisher = Publisher::new(&entry, &inner.stats, inner.name.as_deref());
                let result = (inner.init)(key.to_owned()).await;
                publisher.publish(result).to_result()
            }
        }
    }

    /// Returns a _clone_ of the key's result if it has already been computed.
    ///
    /// Never waits and never starts a computation.
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
