use std::collections::BTreeMap;

/// Per-step count of graded answer attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptTracker {
    counts: BTreeMap<usize, u32>,
}

impl AttemptTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one attempt for `step_index`, never exceeding `max_attempts`,
    /// and returns the updated count.
    pub fn record(&mut self, step_index: usize, max_attempts: u32) -> u32 {
        let count = self.counts.entry(step_index).or_insert(0);
        *count = (*count + 1).min(max_attempts);
        *count
    }

    pub fn count(&self, step_index: usize) -> u32 {
        self.counts.get(&step_index).copied().unwrap_or(0)
    }

    pub fn clear_step(&mut self, step_index: usize) {
        self.counts.remove(&step_index);
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
