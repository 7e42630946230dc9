use super::{memo::InitFn, Memo};

use futures_util::FutureExt;
use std::{
    collections::hash_map::RandomState,
    future::Future,
    hash::{BuildHasher, Hash},
    marker::PhantomData,
    sync::Arc,
};

/// Builds a [`Memo`][memo-struct] with various configuration knobs.
///
/// [memo-struct]: ./struct.Memo.html
///
/// # Example
///
/// ```rust
/// // Cargo.toml
/// //
/// // [dependencies]
/// // memocache = { version = "0.1", features = ["future"] }
/// // tokio = { version = "1", features = ["rt-multi-thread", "macros" ] }
///
/// use memocache::future::MemoBuilder;
///
/// #[tokio::main]
/// async fn main() {
///     let memo = MemoBuilder::new()
///         .name("squares")
///         .initial_capacity(100)
///         .build(|n: u64| async move { Ok::<_, std::convert::Infallible>(n * n) });
///
///     assert_eq!(memo.get(&12).await.ok(), Some(144));
/// }
/// ```
///
#[must_use]
pub struct MemoBuilder<K, V, E> {
    name: Option<String>,
    initial_capacity: Option<usize>,
    memo_type: PhantomData<fn(K) -> Result<V, E>>,
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
    pub fn build<F, Fut>(self, init: F) -> Memo<K, V, E, RandomState>
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        self.build_with_hasher(init, RandomState::default())
    }

    /// Builds a `Memo<K, V, E, S>` around the `init` computation, with the
    /// given `hasher`.
    pub fn build_with_hasher<F, Fut, S>(self, init: F, hasher: S) -> Memo<K, V, E, S>
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        S: BuildHasher + Send + Sync + 'static,
    {
        let init: InitFn<K, V, E> = Arc::new(move |key| init(key).boxed());
        Memo::with_everything(self.name, self.initial_capacity, hasher, init)
    }
}

#[cfg(test)]
mod tests {
    use super::MemoBuilder;

    #[tokio::test]
    async fn build_memo() {
        // Memo<char, String, ()>
        let memo = MemoBuilder::new().build(|c: char| async move { Ok::<_, ()>(c.to_string()) });

        assert_eq!(memo.name(), None);
        assert_eq!(memo.get(&'a').await.ok(), Some("a".to_string()));

        let memo = MemoBuilder::new()
            .name("chars")
            .initial_capacity(64)
            .build(|c: char| async move { Ok::<_, ()>(c.to_ascii_uppercase()) });

        assert_eq!(memo.name(), Some("chars"));
        assert_eq!(memo.get(&'b').await.ok(), Some('B'));
        assert_eq!(memo.entry_count(), 1);
    }

    #[tokio::test]
    async fn build_memo_with_hasher() {
        let memo = MemoBuilder::new().build_with_hasher(
            |n: u64| async move { Ok::<_, ()>(n + 1) },
            ahash::RandomState::default(),
        );

        assert_eq!(memo.get(&1).await.ok(), Some(2));
        assert_eq!(memo.get(&1).await.ok(), Some(2));
        assert_eq!(memo.stats().hit_count(), 1);
    }
}
