//! Failed decode attempts
//!
//! An index whose decode or upload failed is not requested again while it
//! stays inside the prefetch window. Entries are generation-tagged like
//! claims; the renderer forgets an entry once its index leaves the window,
//! so the next entry into the window makes a fresh attempt.

use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct FailedSet {
    // index -> generation of the failed attempt
    failures: DashMap<usize, u64>,
}

impl FailedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed attempt. A record from a newer generation is kept.
    pub fn record(&self, index: usize, generation: u64) {
        self.failures
            .entry(index)
            .and_modify(|failed| *failed = (*failed).max(generation))
            .or_insert(generation);
    }

    /// Whether `index` failed under `generation`.
    pub fn contains(&self, index: usize, generation: u64) -> bool {
        self.failures
            .get(&index)
            .is_some_and(|failed| *failed == generation)
    }

    pub fn forget(&self, index: usize) -> bool {
        self.failures.remove(&index).is_some()
    }

    /// Keep only records of `generation` within `radius` of `center`.
    pub fn retain_window(
        &self,
        center: usize,
        radius: usize,
        generation: u64,
    ) {
        self.failures.retain(|&index, failed| {
            *failed == generation && index.abs_diff(center) <= radius
        });
    }

    pub fn clear(&self) {
        self.failures.clear();
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_record_does_not_override_newer_one() {
        let set = FailedSet::new();
        set.record(3, 2);
        set.record(3, 1);
        assert!(set.contains(3, 2));
        assert!(!set.contains(3, 1));
    }

    #[test]
    fn leaving_the_window_forgets_the_failure() {
        let set = FailedSet::new();
        set.record(10, 1);
        set.record(14, 1);
        set.record(11, 0);

        set.retain_window(12, 2, 1);
        assert!(set.contains(10, 1));
        assert!(set.contains(14, 1));
        assert!(!set.contains(11, 0), "older generation is dropped");

        set.retain_window(13, 2, 1);
        assert!(!set.contains(10, 1));
        assert_eq!(set.len(), 1);
        assert!(set.forget(14));
        assert!(set.is_empty());
    }
}
