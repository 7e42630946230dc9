use crossbeam_utils::atomic::AtomicCell;

use crate::stats::MemoStats;

fn saturating_add(counter: &AtomicCell<u64>, value: u64) {
    let mut v0 = counter.load();
    loop {
        let v1 = v0.saturating_add(value);
        match counter.compare_exchange(v0, v1) {
            Ok(_) => break,
            Err(v2) => v0 = v2,
        }
    }
}

#[derive(Default)]
pub(crate) struct StatsCounter {
    hit_count: AtomicCell<u64>,
    join_count: AtomicCell<u64>,
    miss_count: AtomicCell<u64>,
    load_success_count: AtomicCell<u64>,
    load_failure_count: AtomicCell<u64>,
    load_incomplete_count: AtomicCell<u64>,
    total_load_time_nanos: AtomicCell<u64>,
}

impl StatsCounter {
    pub(crate) fn record_hit(&self) {
        saturating_add(&self.hit_count, 1);
    }

    pub(crate) fn record_join(&self) {
        saturating_add(&self.join_count, 1);
    }

    pub(crate) fn record_miss(&self) {
        saturating_add(&self.miss_count, 1);
    }

    pub(crate) fn record_load_success(&self, load_time_nanos: u64) {
        saturating_add(&self.load_success_count, 1);
        saturating_add(&self.total_load_time_nanos, load_time_nanos);
    }

    pub(crate) fn record_load_failure(&self, load_time_nanos: u64) {
        saturating_add(&self.load_failure_count, 1);
        saturating_add(&self.total_load_time_nanos, load_time_nanos);
    }

    pub(crate) fn record_load_incomplete(&self) {
        saturating_add(&self.load_incomplete_count, 1);
    }

    pub(crate) fn snapshot(&self) -> MemoStats {
        let mut stats = MemoStats::default();
        stats
            .set_req_counts(
                self.hit_count.load(),
                self.join_count.load(),
                self.miss_count.load(),
            )
            .set_load_counts(
                self.load_success_count.load(),
                self.load_failure_count.load(),
                self.load_incomplete_count.load(),
                self.total_load_time_nanos.load(),
            );
        stats
    }
}
