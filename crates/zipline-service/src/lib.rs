//! Link lifecycle orchestration.
//!
//! [`LinkService`] is the only component an external API surface talks
//! to: it validates input, obtains an identifier, derives the public
//! code, persists the record, and assembles public-facing URLs. The
//! [`sweeper`] module provides the timer-driven expiry sweep.

pub mod api;
pub mod error;
pub mod service;
pub mod sweeper;

pub use api::{CreateRequest, CreatedLink, ResolvedLink};
pub use error::ServiceError;
pub use service::{LinkService, RetrySettings, ServiceSettings};
pub use sweeper::{Sweeper, SweeperSettings};
