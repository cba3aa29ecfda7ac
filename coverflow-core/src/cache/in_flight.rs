//! Decode claims
//!
//! An index is claimed for exactly one decode attempt. Claims carry the
//! generation they were made under, so a completion from before a context
//! reset can never release a claim made after it.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

#[derive(Debug, Default)]
pub struct InFlightSet {
    // index -> generation of the claim
    claims: DashMap<usize, u64>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim `index` for `generation`.
    ///
    /// Returns `false` if a claim for the same or a newer generation is
    /// already held. A leftover claim from an older generation is taken
    /// over.
    pub fn claim(&self, index: usize, generation: u64) -> bool {
        match self.claims.entry(index) {
            Entry::Occupied(mut occupied) => {
                if *occupied.get() >= generation {
                    return false;
                }
                occupied.insert(generation);
                true
            }
            Entry::Vacant(vacant) => {
                vacant.insert(generation);
                true
            }
        }
    }

    /// Release the claim on `index` if it still belongs to `generation`.
    pub fn release(&self, index: usize, generation: u64) -> bool {
        self.claims
            .remove_if(&index, |_, claimed| *claimed == generation)
            .is_some()
    }

    /// Whether `index` has a claim under `generation`.
    pub fn contains(&self, index: usize, generation: u64) -> bool {
        self.claims
            .get(&index)
            .is_some_and(|claimed| *claimed == generation)
    }

    /// Forget every claim. Used on context loss.
    pub fn clear(&self) {
        self.claims.clear();
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn second_claim_loses() {
        let set = InFlightSet::new();
        assert!(set.claim(4, 1));
        assert!(!set.claim(4, 1));
        assert!(set.release(4, 1));
        assert!(set.claim(4, 1));
    }

    #[test]
    fn stale_release_keeps_newer_claim() {
        let set = InFlightSet::new();
        assert!(set.claim(7, 1));
        assert!(set.claim(7, 2), "older generation is taken over");
        assert!(!set.release(7, 1));
        assert!(set.contains(7, 2));
        assert!(set.release(7, 2));
        assert!(set.is_empty());
    }

    #[test]
    fn concurrent_claims_have_one_winner() {
        let set = Arc::new(InFlightSet::new());
        let winners = Arc::new(AtomicUsize::new(0));
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let set = Arc::clone(&set);
                let winners = Arc::clone(&winners);
                std::thread::spawn(move || {
                    for index in 0..256 {
                        if set.claim(index, 1) {
                            winners.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }
        assert_eq!(winners.load(Ordering::SeqCst), 256);
        assert_eq!(set.len(), 256);
    }
}
