use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// In-process counters for one play session.
/// Clones share the same counters, so spawned save tasks can report back.
#[derive(Clone, Default, Debug)]
pub struct SessionCounters {
    pub tasks_generated: Arc<AtomicU64>,
    pub answers_correct: Arc<AtomicU64>,
    pub answers_wrong: Arc<AtomicU64>,
    /// Stage advances and regressions
    pub stage_changes: Arc<AtomicU64>,
    pub saves: Arc<AtomicU64>,
    /// Saves that failed (memory keeps the change)
    pub persist_failures: Arc<AtomicU64>,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub tasks_generated: u64,
    pub answers_correct: u64,
    pub answers_wrong: u64,
    pub stage_changes: u64,
    pub saves: u64,
    pub persist_failures: u64,
}

impl SessionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_task(&self) {
        self.tasks_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_answer(&self, correct: bool) {
        let counter = if correct { &self.answers_correct } else { &self.answers_wrong };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stage_change(&self) {
        self.stage_changes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save(&self) {
        self.saves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persist_failure(&self) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            tasks_generated: self.tasks_generated.load(Ordering::Relaxed),
            answers_correct: self.answers_correct.load(Ordering::Relaxed),
            answers_wrong: self.answers_wrong.load(Ordering::Relaxed),
            stage_changes: self.stage_changes.load(Ordering::Relaxed),
            saves: self.saves.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
        }
    }
}
