//! Global metrics counters.
//!
//! State is thread-local: a snapshot observes only the calling thread's
//! counters. Repositories are per-thread values, so each serving thread
//! accounts for its own invocations.

use serde::Serialize;
use std::cell::RefCell;

thread_local! {
    static STATE: RefCell<MetricsSnapshot> = RefCell::new(MetricsSnapshot::default());
}

///
/// MetricsSnapshot
///
/// Point-in-time counter view for endpoint and test plumbing. Scoped to the
/// calling thread.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub methods_registered: u64,
    pub plans_compiled: u64,
    pub rows_materialized: u64,
    pub pages_served: u64,
    pub terminal_pages: u64,
    pub cursors_released: u64,
}

pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut MetricsSnapshot) -> R) -> R {
    STATE.with(|state| f(&mut state.borrow_mut()))
}

#[must_use]
pub(crate) fn snapshot() -> MetricsSnapshot {
    STATE.with(|state| *state.borrow())
}

pub(crate) fn reset_all() {
    STATE.with(|state| *state.borrow_mut() = MetricsSnapshot::default());
}
