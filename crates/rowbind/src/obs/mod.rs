//! Observability: adapter round-trip metrics.
//!
//! Engine code records one event per storage round trip it issues; nothing
//! here touches entity or adapter state. Counters are thread-local because
//! the engine itself is single-actor per thread.

pub(crate) mod metrics;

pub use metrics::{ExecKind, MetricsSnapshot, metrics_reset, metrics_snapshot};
