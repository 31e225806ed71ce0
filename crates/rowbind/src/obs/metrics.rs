use std::cell::Cell;

thread_local! {
    static METRICS: Cell<MetricsSnapshot> = const { Cell::new(MetricsSnapshot::EMPTY) };
}

///
/// ExecKind
/// Kinds of storage round trips the engine issues.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecKind {
    FetchOne,
    FetchMany,
    Insert,
    Update,
    Delete,
}

///
/// MetricsSnapshot
/// Point-in-time counters of round trips issued on this thread.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MetricsSnapshot {
    pub fetch_one: u64,
    pub fetch_many: u64,
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,
}

impl MetricsSnapshot {
    pub(crate) const EMPTY: Self = Self {
        fetch_one: 0,
        fetch_many: 0,
        inserts: 0,
        updates: 0,
        deletes: 0,
    };

    #[must_use]
    /// Total round trips across all kinds.
    pub const fn total(&self) -> u64 {
        self.fetch_one + self.fetch_many + self.inserts + self.updates + self.deletes
    }
}

/// Record one issued round trip.
pub(crate) fn record(kind: ExecKind) {
    METRICS.with(|metrics| {
        let mut snapshot = metrics.get();
        match kind {
            ExecKind::FetchOne => snapshot.fetch_one += 1,
            ExecKind::FetchMany => snapshot.fetch_many += 1,
            ExecKind::Insert => snapshot.inserts += 1,
            ExecKind::Update => snapshot.updates += 1,
            ExecKind::Delete => snapshot.deletes += 1,
        }
        metrics.set(snapshot);
    });
}

#[must_use]
/// Current counters for this thread.
pub fn metrics_snapshot() -> MetricsSnapshot {
    METRICS.with(Cell::get)
}

/// Reset this thread's counters to zero.
pub fn metrics_reset() {
    METRICS.with(|metrics| metrics.set(MetricsSnapshot::EMPTY));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_and_reset() {
        metrics_reset();
        record(ExecKind::FetchOne);
        record(ExecKind::FetchOne);
        record(ExecKind::Insert);

        let snapshot = metrics_snapshot();
        assert_eq!(snapshot.fetch_one, 2);
        assert_eq!(snapshot.inserts, 1);
        assert_eq!(snapshot.total(), 3);

        metrics_reset();
        assert_eq!(metrics_snapshot(), MetricsSnapshot::EMPTY);
    }
}
