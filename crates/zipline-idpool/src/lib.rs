//! Internal identifier allocation with a reuse pool.
//!
//! Ids freed by expired or deleted links return to the pool and are handed
//! out again before the monotonic counter grows, keeping the code space
//! dense and generated codes short.

pub mod error;
mod pool;

pub use error::Error;
pub use pool::IdPool;
