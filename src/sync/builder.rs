use super::{memo::InitFn, Memo};

use std::{
    collections::hash_map::RandomState,
    hash::{BuildHasher, Hash},
    marker::PhantomData,
    sync::Arc,
};

/// Builds a [`Memo`][memo-struct] with various configuration knobs.
///
/// [memo-struct]: ./struct.Memo.html
///
/// # Examples
///
/// ```rust
/// use memocache::sync::MemoBuilder;
///
/// let memo = MemoBuilder::new()
///     // Used in log lines and in the `Debug` output.
///     .name("word-lengths")
///     // Pre-size the table. This is not a bound; the memo grows as needed.
///     .initial_capacity(1_000)
///     // Create the memo.
///     .build(|word: &String| Ok::<_, std::convert::Infallible>(word.len()));
///
/// assert_eq!(memo.get("memo").ok(), Some(4));
/// assert_eq!(memo.name(), Some("word-lengths"));
/// ```
///
#[must_use]
pub struct MemoBuilder<K, V, E> {
    name: Option<String>,
    initial_capacity: Option<usize>,
    memo_type: PhantomData<fn(&K) -> Result<V, E>>,
}

impl<K, V, E> Default for MemoBuilder<K, V, E> {
    fn default() -> Self {
        Self {
            name: None,
            initial_capacity: None,
            memo_type: PhantomData,
        }
    }
}

impl<K, V, E> MemoBuilder<K, V, E>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Construct a new `MemoBuilder` with no name and the default capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name of the memo. The name appears in log lines emitted by the
    /// memo (with the `logging` feature) and in its `Debug` output.
    pub fn name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    /// Sets the number of keys the memo can hold before its table reallocates.
    pub fn initial_capacity(self, capacity: usize) -> Self {
        Self {
            initial_capacity: Some(capacity),
            ..self
        }
    }

    /// Builds a `Memo<K, V, E>` around the `init` computation.
    pub fn build<F>(self, init: F) -> Memo<K, V, E, RandomState>
    where
        F: Fn(&K) -> Result<V, E> + Send + Sync + 'static,
    {
        self.build_with_hasher(init, RandomState::default())
    }

    /// Builds a `Memo<K, V, E, S>` around the `init` computation, with the
    /// given `hasher`.
    pub fn build_with_hasher<F, S>(self, init: F, hasher: S) -> Memo<K, V, E, S>
    where
        F: Fn(&K) -> Result<V, E> + Send + Sync + 'static,
        S: BuildHasher + Send + Sync + 'static,
    {
        let init: InitFn<K, V, E> = Arc::new(init);
        Memo::with_everything(self.name, self.initial_capacity, hasher, init)
    }
}
