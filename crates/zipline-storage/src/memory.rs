use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use smol_str::SmolStr;
use std::sync::Arc;
use zipline_core::store::Result;
use zipline_core::{Clock, LinkRecord, LinkStore, StoreError, SystemClock};
use zipline_idpool::IdPool;

/// In-memory link store backed by a sharded concurrent map.
///
/// DashMap's entry-level locking makes eviction and insertion of the same
/// code mutually exclusive: whichever caller removes a record is the one
/// (and only one) that releases its id back to the pool. The id pool's
/// own mutex is a leaf lock, taken only for the in-memory mutation, so
/// holding a map shard briefly while releasing cannot deadlock.
#[derive(Debug)]
pub struct MemoryStore<C: Clock = SystemClock> {
    entries: DashMap<SmolStr, LinkRecord>,
    pool: Arc<IdPool>,
    clock: C,
}

impl MemoryStore<SystemClock> {
    /// Creates an empty store on the system clock.
    pub fn new(pool: Arc<IdPool>) -> Self {
        Self::with_clock(pool, SystemClock)
    }
}

impl<C: Clock> MemoryStore<C> {
    /// Creates an empty store with an injected clock.
    pub fn with_clock(pool: Arc<IdPool>, clock: C) -> Self {
        Self {
            entries: DashMap::new(),
            pool,
            clock,
        }
    }

    /// Restores a store from surviving records, rebuilding the id pool by
    /// scanning them: the counter resumes past the largest id and every
    /// gap becomes reusable.
    pub fn rebuild(records: impl IntoIterator<Item = LinkRecord>, clock: C) -> Self {
        let entries = DashMap::new();
        let mut ids = Vec::new();
        for record in records {
            ids.push(record.id);
            entries.insert(SmolStr::new(record.code.as_str()), record);
        }
        Self {
            entries,
            pool: Arc::new(IdPool::rebuild(ids)),
            clock,
        }
    }

    /// The id pool this store releases into.
    pub fn pool(&self) -> Arc<IdPool> {
        Arc::clone(&self.pool)
    }

    /// Number of physically present records, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no records are physically present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the record's id to the pool after a removal.
    ///
    /// A release failure here means the id was double-freed or never
    /// issued — an invariant violation, not a user error. It is logged
    /// loudly and the removal itself stands.
    fn release_removed(&self, record: &LinkRecord) {
        if let Err(err) = self.pool.release(record.id) {
            tracing::error!(
                id = record.id,
                code = record.code.as_str(),
                error = %err,
                "id release failed after removal; allocator invariant violated"
            );
        }
    }

    /// Removes the record for `code` if it is still expired at `now` and
    /// releases its id. The `remove_if` guard makes racing evictors agree
    /// on a single winner.
    fn evict_if_expired(&self, code: &str, now: Timestamp) -> bool {
        match self
            .entries
            .remove_if(code, |_, record| record.is_expired_at(now))
        {
            Some((_, removed)) => {
                tracing::debug!(code, id = removed.id, "evicted expired record");
                self.release_removed(&removed);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl<C: Clock> LinkStore for MemoryStore<C> {
    async fn put(&self, record: LinkRecord) -> Result<()> {
        let key = SmolStr::new(record.code.as_str());
        let now = self.clock.now();

        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired_at(now) {
                    // The incumbent is logically dead: reclaim its id and
                    // take the slot over, never resurrect it.
                    let evicted = occupied.insert(record);
                    self.release_removed(&evicted);
                    Ok(())
                } else {
                    Err(StoreError::CodeCollision(occupied.key().to_string()))
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(record);
                Ok(())
            }
        }
    }

    async fn get(&self, code: &str) -> Result<LinkRecord> {
        let now = self.clock.now();

        let Some(entry) = self.entries.get(code) else {
            return Err(StoreError::NotFound(code.to_string()));
        };
        if entry.is_expired_at(now) {
            drop(entry);
            self.evict_if_expired(code, now);
            return Err(StoreError::Expired(code.to_string()));
        }
        Ok(entry.value().clone())
    }

    async fn delete(&self, code: &str, token: &str) -> Result<()> {
        let now = self.clock.now();

        let Some(entry) = self.entries.get(code) else {
            return Err(StoreError::NotFound(code.to_string()));
        };
        if entry.is_expired_at(now) {
            drop(entry);
            self.evict_if_expired(code, now);
            return Err(StoreError::NotFound(code.to_string()));
        }
        if entry.delete_token != token {
            return Err(StoreError::Unauthorized(code.to_string()));
        }
        let id = entry.id;
        drop(entry);

        // Re-check under the entry lock so a racing eviction or
        // replacement cannot make two callers both believe they won.
        match self
            .entries
            .remove_if(code, |_, record| {
                record.id == id && record.delete_token == token
            }) {
            Some((_, removed)) => {
                self.release_removed(&removed);
                Ok(())
            }
            None => Err(StoreError::NotFound(code.to_string())),
        }
    }

    async fn sweep_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let expired: Vec<SmolStr> = self
            .entries
            .iter()
            .filter(|entry| entry.value().is_expired_at(now))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for code in expired {
            if self.evict_if_expired(&code, now) {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
