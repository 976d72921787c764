use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A stored short-link record: the unit of persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// The internal identifier. Assigned once at creation, never mutated,
    /// and returned to the id pool exactly once when the record is
    /// removed.
    pub id: u64,
    /// The public short code. For generated records this is exactly the
    /// codec encoding of `id`; whether it was user-chosen instead is
    /// carried by the [`ShortCode`] variant.
    pub code: ShortCode,
    /// The normalized target URL.
    pub long_url: String,
    /// When the record was created.
    pub created_at: Timestamp,
    /// When the record expires; `None` means it never does.
    pub expires_at: Option<Timestamp>,
    /// The opaque secret required to delete the record before expiry.
    pub delete_token: String,
}

impl LinkRecord {
    /// True if the record was created with a user-chosen code.
    pub fn is_custom(&self) -> bool {
        self.code.is_custom()
    }

    /// Whether the record is logically dead at the given instant.
    ///
    /// A record whose expiry has passed must never be treated as
    /// resolvable, even while it is still physically present.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}
