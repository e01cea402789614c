use super::TaskStore;
use crate::model::{Difficulty, TaskStatus};
use std::collections::BTreeMap;

/// `count / total` as a percentage rounded to two decimals; zero when the
/// collection is empty.
pub fn round_percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let percent = count as f64 * 100.0 / total as f64;
    (percent * 100.0).round() / 100.0
}

fn percentages<K: Ord + Copy>(counts: &BTreeMap<K, usize>, total: usize) -> BTreeMap<K, f64> {
    counts
        .iter()
        .map(|(key, count)| (*key, round_percent(*count, total)))
        .collect()
}

impl TaskStore {
    /// Every status is present, zero-filled.
    pub fn count_by_status(&self) -> BTreeMap<TaskStatus, usize> {
        let mut counts: BTreeMap<TaskStatus, usize> =
            TaskStatus::ALL.iter().map(|status| (*status, 0)).collect();
        for task in self.iter() {
            *counts.entry(task.status()).or_default() += 1;
        }
        counts
    }

    pub fn percent_by_status(&self) -> BTreeMap<TaskStatus, f64> {
        percentages(&self.count_by_status(), self.len())
    }

    /// Only difficulties that occur in the collection.
    pub fn count_by_difficulty(&self) -> BTreeMap<Difficulty, usize> {
        let mut counts = BTreeMap::new();
        for task in self.iter() {
            *counts.entry(task.difficulty()).or_default() += 1;
        }
        counts
    }

    pub fn percent_by_difficulty(&self) -> BTreeMap<Difficulty, f64> {
        percentages(&self.count_by_difficulty(), self.len())
    }
}
