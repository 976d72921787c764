use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A request to create a short link.
///
/// `ttl` is one of the recognized TTL classes (`"1h"`, `"24h"`/`"1d"`,
/// `"1w"`, `"never"`); anything else is rejected at validation. An absent
/// or empty `custom_code` means "allocate automatically".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRequest {
    pub long_url: String,
    pub ttl: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_code: Option<String>,
}

/// The public-facing result of a successful create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedLink {
    /// The redirecting short URL: base address joined with the code.
    pub short_url: String,
    /// A non-redirecting preview/info URL for the same code.
    pub preview_url: String,
    /// A URL that embeds the code and deletion token; presenting it
    /// authorizes deletion without further credentials.
    pub delete_url: String,
    /// The deletion token on its own, for callers that store it.
    pub delete_token: String,
    /// The code, for callers that compose their own URLs.
    pub code: String,
    /// When the link stops resolving; `None` for never.
    pub expires_at: Option<Timestamp>,
}

/// The result of resolving a short code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLink {
    /// The stored, normalized target to redirect to.
    pub long_url: String,
    pub expires_at: Option<Timestamp>,
}
