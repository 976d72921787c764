use crate::error::StoreError;
use crate::record::LinkRecord;
use async_trait::async_trait;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Durable mapping from short code to link record.
///
/// Implementations own TTL bookkeeping: an expired record must behave as
/// absent for every operation (the lazy-expiry invariant), and every
/// physical removal — lazy eviction, sweeping, explicit deletion, or
/// reclaiming an expired incumbent during `put` — must return the
/// record's id to the allocator exactly once.
#[async_trait]
pub trait LinkStore: Send + Sync + 'static {
    /// Inserts a new record.
    ///
    /// Fails with [`StoreError::CodeCollision`] if an *active* record
    /// already occupies the code. An expired incumbent is not a
    /// collision: it is reclaimed (and its id released) as part of the
    /// same operation, never resurrected.
    async fn put(&self, record: LinkRecord) -> Result<()>;

    /// Retrieves the active record for a code.
    ///
    /// Fails with [`StoreError::NotFound`] for unknown codes and
    /// [`StoreError::Expired`] for records whose expiry has passed; an
    /// expired hit is evicted as a side effect.
    async fn get(&self, code: &str) -> Result<LinkRecord>;

    /// Removes the record for a code, if the deletion token matches.
    ///
    /// Fails with [`StoreError::NotFound`] for unknown (or already
    /// expired) codes and [`StoreError::Unauthorized`] on a token
    /// mismatch. On success the record's id is released within the same
    /// logical operation.
    async fn delete(&self, code: &str, token: &str) -> Result<()>;

    /// Evicts every expired record, releasing each id exactly once, and
    /// returns how many were removed. Idempotent; bounds staleness for
    /// cold codes that are never looked up.
    async fn sweep_expired(&self) -> Result<usize>;
}
