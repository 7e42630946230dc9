use std::{sync::Arc, time::Instant};

use super::{error::MemoError, signal::ReadySignal, stats_counter::StatsCounter};

/// The terminal state of an entry, published exactly once.
pub(crate) enum Outcome<V, E> {
    Ready(Result<V, Arc<E>>),
    InitPanicked,
    InitAborted,
}

impl<V: Clone, E> Outcome<V, E> {
    pub(crate) fn to_result(&self) -> Result<V, MemoError<E>> {
        match self {
            Self::Ready(Ok(value)) => Ok(value.clone()),
            Self::Ready(Err(e)) => Err(MemoError::Computation(Arc::clone(e))),
            Self::InitPanicked => Err(MemoError::InitPanicked),
            Self::InitAborted => Err(MemoError::InitAborted),
        }
    }
}

/// One memoized key. Created pending by the caller that first asks for the
/// key, and made ready by that same caller.
pub(crate) struct Entry<V, E> {
    outcome: ReadySignal<Outcome<V, E>>,
}

impl<V, E> Entry<V, E> {
    pub(crate) fn new() -> Self {
        Self {
            outcome: ReadySignal::new(),
        }
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.outcome.is_fired()
    }

    pub(crate) fn outcome(&self) -> Option<&Outcome<V, E>> {
        self.outcome.get()
    }

    pub(crate) fn wait_blocking(&self) -> &Outcome<V, E> {
        self.outcome.wait_blocking()
    }

    #[cfg(feature = "future")]
    pub(crate) async fn wait(&self) -> &Outcome<V, E> {
        self.outcome.wait().await
    }
}

/// Held by the owner of an entry while its computation runs.
///
/// `publish` stores the computed result. If the guard is dropped without
/// publishing (the computation panicked, or the owning future was dropped),
/// `Drop` publishes `InitPanicked` or `InitAborted` so waiters never block
/// forever.
pub(crate) struct Publisher<'a, V, E> {
    entry: &'a Entry<V, E>,
    stats: &'a StatsCounter,
    #[cfg_attr(not(feature = "logging"), allow(dead_code))]
    memo_name: Option<&'a str>,
    started_at: Instant,
    published: bool,
}

impl<'a, V, E> Publisher<'a, V, E> {
    pub(crate) fn new(
        entry: &'a Entry<V, E>,
        stats: &'a StatsCounter,
        memo_name: Option<&'a str>,
    ) -> Self {
        #[cfg(feature = "logging")]
        log::trace!("{}Computing a new entry", log_prefix(memo_name));

        Self {
            entry,
            stats,
            memo_name,
            started_at: Instant::now(),
            published: false,
        }
    }

    pub(crate) fn publish(mut self, result: Result<V, E>) -> &'a Outcome<V, E> {
        let elapsed = self.elapsed_nanos();
        if result.is_ok() {
            self.stats.record_load_success(elapsed);
        } else {
            self.stats.record_load_failure(elapsed);

            #[cfg(feature = "logging")]
            log::debug!(
                "{}Computation failed; caching the error",
                log_prefix(self.memo_name)
            );
        }

        self.published = true;
        let entry = self.entry;
        match entry.outcome.fire(Outcome::Ready(result.map_err(Arc::new))) {
            Ok(outcome) => outcome,
            // Only the owner fires, and it fires once.
            Err(_) => unreachable!("entry published twice"),
        }
    }

    fn elapsed_nanos(&self) -> u64 {
        self.started_at
            .elapsed()
            .as_nanos()
            .try_into()
            .unwrap_or(u64::MAX)
    }
}

impl<V, E> Drop for Publisher<'_, V, E> {
    fn drop(&mut self) {
        if self.published {
            return;
        }

        self.stats.record_load_incomplete();
        let outcome = if std::thread::panicking() {
            #[cfg(feature = "logging")]
            log::error!(
                "{}Computation panicked; the entry is marked as panicked",
                log_prefix(self.memo_name)
            );
            Outcome::InitPanicked
        } else {
            #[cfg(feature = "logging")]
            log::warn!(
                "{}Computation was dropped before completion; the entry is marked as aborted",
                log_prefix(self.memo_name)
            );
            Outcome::InitAborted
        };
        let fired = self.entry.outcome.fire(outcome);
        debug_assert!(fired.is_ok(), "entry published twice");
    }
}

#[cfg(feature = "logging")]
fn log_prefix(memo_name: Option<&str>) -> String {
    memo_name
        .map(|name| format!("[{name}] "))
        .unwrap_or_default()
}
