use dashmap::DashSet;

use crate::model::UnitId;

/// Concurrent set of unallocated ticket numbers.
pub struct UnitPool {
    free: DashSet<UnitId>,
}

impl UnitPool {
    pub fn with_units(units: impl IntoIterator<Item = UnitId>) -> Self {
        let free = DashSet::new();
        for id in units {
            free.insert(id);
        }
        Self { free }
    }

    /// Remove and return some free unit. Which one is unspecified.
    pub fn take(&self) -> Option<UnitId> {
        loop {
            // The shard guard from `iter` must be gone before `remove` locks.
            let candidate = *self.free.iter().next()?;
            // Lost the race for this id to another taker; pick again.
            if self.free.remove(&candidate).is_some() {
                return Some(candidate);
            }
        }
    }

    pub fn put(&self, id: UnitId) {
        let fresh = self.free.insert(id);
        debug_assert!(fresh, "unit {id} returned twice");
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Sorted copy of the free set.
    pub fn snapshot(&self) -> Vec<UnitId> {
        let mut ids: Vec<UnitId> = self.free.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn take_drains_every_unit_once() {
        let pool = UnitPool::with_units(1..=5);
        let mut seen = HashSet::new();
        while let Some(id) = pool.take() {
            assert!(seen.insert(id), "unit {id} handed out twice");
        }
        assert_eq!(seen, (1..=5).collect());
        assert!(pool.is_empty());
        assert_eq!(pool.take(), None);
    }

    #[test]
    fn put_makes_unit_available_again() {
        let pool = UnitPool::with_units([42]);
        let id = pool.take().unwrap();
        assert_eq!(pool.len(), 0);
        pool.put(id);
        assert_eq!(pool.snapshot(), vec![42]);
    }

    #[test]
    fn concurrent_takers_never_share_a_unit() {
        let pool = Arc::new(UnitPool::with_units(1..=2_000));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    let mut mine = Vec::new();
                    while let Some(id) = pool.take() {
                        mine.push(id);
                    }
                    mine
                })
            })
            .collect();

        let mut all = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(all.insert(id), "unit {id} taken by two threads");
            }
        }
        assert_eq!(all.len(), 2_000);
    }
}
