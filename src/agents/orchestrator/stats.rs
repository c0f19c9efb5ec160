//! Run-wide decomposition statistics.

use serde::{Deserialize, Serialize};

/// Counters for one run.
///
/// # Invariants
/// - `decomposed + executed_directly <= total_tasks`
///   (cancelled tasks are neither)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_tasks: usize,
    pub decomposed: usize,
    pub executed_directly: usize,
    pub max_level_reached: u32,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_visit(&mut self, level: u32) {
        self.total_tasks += 1;
        self.max_level_reached = self.max_level_reached.max(level);
    }

    pub fn record_decomposed(&mut self) {
        self.decomposed += 1;
    }

    pub fn record_direct(&mut self) {
        self.executed_directly += 1;
    }

    /// Share of visited tasks that were decomposed, in `[0, 1]`.
    pub fn decomposition_ratio(&self) -> f64 {
        if self.total_tasks == 0 {
            0.0
        } else {
            self.decomposed as f64 / self.total_tasks as f64
        }
    }
}
