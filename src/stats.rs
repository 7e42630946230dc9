use std::fmt::{self, Debug};

/// Statistics about how a memo has been used.
///
/// Statistics are incremented according to the following rules:
///
/// - When `get` creates the entry for a key (the caller becomes the one that
///   runs the computation), `miss_count` is incremented.
///     - When the computation returns `Ok`, `load_success_count` is incremented,
///       and the time it took, in nanoseconds, is added to
///       `total_load_time_nanos`.
///     - When the computation returns `Err`, `load_failure_count` is
///       incremented, and the time is added the same way.
///     - When the computation panics, or the future running it is dropped,
///       `load_incomplete_count` is incremented. No time is recorded.
/// - When `get` finds an entry whose computation is still running and waits
///   for it, `join_count` is incremented.
/// - When `get` or `peek` finds an entry that is already computed,
///   `hit_count` is incremented. A `peek` that finds nothing or a pending
///   entry changes nothing.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct MemoStats {
    hit_count: u64,
    join_count: u64,
    miss_count: u64,
    load_success_count: u64,
    load_failure_count: u64,
    load_incomplete_count: u64,
    total_load_time_nanos: u64,
}

impl Debug for MemoStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoStats")
            .field("request_count", &self.request_count())
            .field("hit_count", &self.hit_count)
            .field("hit_rate", &self.hit_rate())
            .field("join_count", &self.join_count)
            .field("miss_count", &self.miss_count)
            .field("miss_rate", &self.miss_rate())
            .field("load_count", &self.load_count())
            .field("load_success_count", &self.load_success_count)
            .field("load_failure_count", &self.load_failure_count)
            .field("load_incomplete_count", &self.load_incomplete_count)
            .field("total_load_time_nanos", &self.total_load_time_nanos)
            .field(
                "average_load_penalty_nanos",
                &self.average_load_penalty_nanos(),
            )
            .finish()
    }
}

impl MemoStats {
    pub(crate) fn set_req_counts(
        &mut self,
        hit_count: u64,
        join_count: u64,
        miss_count: u64,
    ) -> &mut Self {
        self.hit_count = hit_count;
        self.join_count = join_count;
        self.miss_count = miss_count;
        self
    }

    pub(crate) fn set_load_counts(
        &mut self,
        load_success_count: u64,
        load_failure_count: u64,
        load_incomplete_count: u64,
        total_load_time_nanos: u64,
    ) -> &mut Self {
        self.load_success_count = load_success_count;
        self.load_failure_count = load_failure_count;
        self.load_incomplete_count = load_incomplete_count;
        self.total_load_time_nanos = total_load_time_nanos;
        self
    }

    pub fn request_count(&self) -> u64 {
        self.hit_count
            .saturating_add(self.join_count)
            .saturating_add(self.miss_count)
    }

    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    /// Ratio of requests served from an already computed entry. `1.0` when
    /// there were no requests.
    pub fn hit_rate(&self) -> f64 {
        let req_count = self.request_count();
        if req_count == 0 {
            1.0
        } else {
            self.hit_count as f64 / req_count as f64
        }
    }

    pub fn join_count(&self) -> u64 {
        self.join_count
    }

    pub fn miss_count(&self) -> u64 {
        self.miss_count
    }

    pub fn miss_rate(&self) -> f64 {
        let req_count = self.request_count();
        if req_count == 0 {
            0.0
        } else {
            self.miss_count as f64 / req_count as f64
        }
    }

    /// Number of computations that ran to completion, successful or not.
    pub fn load_count(&self) -> u64 {
        self.load_success_count
            .saturating_add(self.load_failure_count)
    }

    pub fn load_success_count(&self) -> u64 {
        self.load_success_count
    }

    pub fn load_failure_count(&self) -> u64 {
        self.load_failure_count
    }

    pub fn load_incomplete_count(&self) -> u64 {
        self.load_incomplete_count
    }

    pub fn total_load_time_nanos(&self) -> u64 {
        self.total_load_time_nanos
    }

    pub fn average_load_penalty_nanos(&self) -> f64 {
        let load_count = self.load_count();
        if load_count == 0 {
            0.0
        } else {
            self.total_load_time_nanos as f64 / load_count as f64
        }
    }
}
