use crate::error::Error;
use std::collections::BTreeSet;
use std::sync::Mutex;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
struct PoolState {
    /// The next never-issued id. Ids start at 1; 0 is never handed out.
    next_id: u64,
    /// Ids freed by expired or deleted records, ordered so the smallest
    /// comes back first. Smallest-first keeps codes short and preserves a
    /// weak temporal ordering that helps when reading logs.
    reusable: BTreeSet<u64>,
}

/// Hands out internal integer identifiers and takes freed ones back.
///
/// All state sits behind a single mutex: two concurrent `acquire` calls
/// can never observe the same id, and a release followed by a racing
/// acquire hands the id to exactly one caller. The lock is only ever held
/// for the in-memory mutation; callers must not hold it across I/O
/// (they can't: it is private).
#[derive(Debug)]
pub struct IdPool {
    state: Mutex<PoolState>,
}

impl IdPool {
    /// Creates an empty pool whose first acquired id is 1.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PoolState {
                next_id: 1,
                reusable: BTreeSet::new(),
            }),
        }
    }

    /// Reconstructs pool state from the ids observed in a store after a
    /// restart: the counter resumes past the largest observed id, and
    /// every gap below it becomes reusable.
    pub fn rebuild(ids: impl IntoIterator<Item = u64>) -> Self {
        let observed: BTreeSet<u64> = ids.into_iter().filter(|&id| id != 0).collect();
        let next_id = observed.last().map_or(1, |largest| largest + 1);
        let reusable = (1..next_id).filter(|id| !observed.contains(id)).collect();
        Self {
            state: Mutex::new(PoolState { next_id, reusable }),
        }
    }

    /// Returns the smallest reusable id if any, otherwise the next value
    /// of the monotonic counter.
    pub fn acquire(&self) -> Result<u64> {
        let mut state = self.state.lock().map_err(|_| Error::PoisonedState)?;
        if let Some(id) = state.reusable.pop_first() {
            return Ok(id);
        }
        let id = state.next_id;
        state.next_id += 1;
        Ok(id)
    }

    /// Returns a previously issued id to the reuse pool.
    ///
    /// Fails with [`Error::DoubleRelease`] if the id is already pooled and
    /// [`Error::NeverIssued`] if the id was never handed out by this pool.
    pub fn release(&self, id: u64) -> Result<()> {
        let mut state = self.state.lock().map_err(|_| Error::PoisonedState)?;
        if id == 0 || id >= state.next_id {
            return Err(Error::NeverIssued {
                id,
                next_id: state.next_id,
            });
        }
        if !state.reusable.insert(id) {
            return Err(Error::DoubleRelease { id });
        }
        Ok(())
    }

    /// Number of ids currently waiting for reuse.
    pub fn pooled(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.reusable.len())
            .unwrap_or(0)
    }
}

impl Default for IdPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn issues_dense_ids_from_one() {
        let pool = IdPool::new();
        assert_eq!(pool.acquire().unwrap(), 1);
        assert_eq!(pool.acquire().unwrap(), 2);
        assert_eq!(pool.acquire().unwrap(), 3);
    }

    #[test]
    fn released_id_comes_back_before_the_counter_grows() {
        let pool = IdPool::new();
        for _ in 0..5 {
            pool.acquire().unwrap();
        }
        pool.release(3).unwrap();
        assert_eq!(pool.acquire().unwrap(), 3);
        // Pool drained, the counter resumes.
        assert_eq!(pool.acquire().unwrap(), 6);
    }

    #[test]
    fn reuse_is_smallest_first() {
        let pool = IdPool::new();
        for _ in 0..4 {
            pool.acquire().unwrap();
        }
        pool.release(4).unwrap();
        pool.release(2).unwrap();
        pool.release(3).unwrap();
        assert_eq!(pool.acquire().unwrap(), 2);
        assert_eq!(pool.acquire().unwrap(), 3);
        assert_eq!(pool.acquire().unwrap(), 4);
    }

    #[test]
    fn double_release_is_an_error() {
        let pool = IdPool::new();
        pool.acquire().unwrap();
        pool.release(1).unwrap();
        assert_eq!(pool.release(1), Err(Error::DoubleRelease { id: 1 }));
    }

    #[test]
    fn releasing_a_never_issued_id_is_an_error() {
        let pool = IdPool::new();
        pool.acquire().unwrap();
        assert_eq!(
            pool.release(7),
            Err(Error::NeverIssued { id: 7, next_id: 2 })
        );
        assert_eq!(
            pool.release(0),
            Err(Error::NeverIssued { id: 0, next_id: 2 })
        );
    }

    #[test]
    fn rebuild_resumes_past_the_largest_observed_id() {
        // Surviving records hold 1, 2, 5, 9: the counter resumes at 10 and
        // the gaps 3, 4, 6, 7, 8 become reusable, smallest first.
        let pool = IdPool::rebuild([5, 1, 9, 2]);
        assert_eq!(pool.acquire().unwrap(), 3);
        assert_eq!(pool.acquire().unwrap(), 4);
        assert_eq!(pool.acquire().unwrap(), 6);
        assert_eq!(pool.acquire().unwrap(), 7);
        assert_eq!(pool.acquire().unwrap(), 8);
        assert_eq!(pool.acquire().unwrap(), 10);
    }

    #[test]
    fn rebuild_from_nothing_matches_new() {
        let pool = IdPool::rebuild([]);
        assert_eq!(pool.acquire().unwrap(), 1);
    }

    #[test]
    fn concurrent_acquires_never_collide() {
        let pool = Arc::new(IdPool::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = Arc::clone(&pool);
            handles.push(std::thread::spawn(move || {
                (0..250).map(|_| pool.acquire().unwrap()).collect::<Vec<_>>()
            }));
        }

        let mut issued: Vec<u64> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        issued.sort_unstable();
        issued.dedup();
        assert_eq!(issued.len(), 8 * 250);
    }

    #[test]
    fn concurrent_release_then_acquire_hands_out_each_id_once() {
        let pool = Arc::new(IdPool::new());
        for _ in 0..64 {
            pool.acquire().unwrap();
        }
        for id in 1..=64 {
            pool.release(id).unwrap();
        }

        let mut handles = Vec::new();
        for _ in 0..4 {
            let pool = Arc::clone(&pool);
            handles.push(std::thread::spawn(move || {
                (0..16).map(|_| pool.acquire().unwrap()).collect::<Vec<_>>()
            }));
        }

        let mut issued: Vec<u64> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        issued.sort_unstable();
        // All 64 pooled ids drain exactly once before the counter resumes.
        assert_eq!(issued, (1..=64).collect::<Vec<_>>());
    }
}
