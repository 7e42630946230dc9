use std::sync::Arc;

/// The error type returned by `Memo::get` and `Memo::peek`.
///
/// Every caller of a key receives the same `MemoError` for that key, for the
/// lifetime of the memo. Failed computations are never retried.
#[derive(thiserror::Error, Debug)]
pub enum MemoError<E> {
    /// The computation returned an error.
    ///
    /// All callers of the key share the same `Arc`, so
    /// `Arc::ptr_eq` holds between any two of them.
    #[error("computation failed: {0}")]
    Computation(Arc<E>),

    /// The computation panicked in the caller that was running it.
    ///
    /// The panic itself is propagated to that caller; everybody else waiting
    /// on (or later asking for) the key gets this variant instead of blocking
    /// forever.
    #[error("computation panicked before producing a value")]
    InitPanicked,

    /// The future running the computation was dropped before it finished.
    ///
    /// Only produced by [`future::Memo`][future-memo].
    ///
    /// [future-memo]: ./future/struct.Memo.html
    #[error("computation was abandoned before producing a value")]
    InitAborted,
}

impl<E> MemoError<E> {
    /// Returns the error produced by the computation, if that is what this is.
    pub fn computation_error(&self) -> Option<&Arc<E>> {
        match self {
            Self::Computation(e) => Some(e),
            _ => None,
        }
    }

    /// Returns `true` if the computation did not run to completion.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::InitPanicked | Self::InitAborted)
    }
}

impl<E> Clone for MemoError<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Computation(e) => Self::Computation(Arc::clone(e)),
            Self::InitPanicked => Self::InitPanicked,
            Self::InitAborted => Self::InitAborted,
        }
    }
}
