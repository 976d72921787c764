use crate::error::ValidateError;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::Display;

const MAX_CUSTOM_LENGTH: usize = 32;

/// The public short identifier appended to the base URL.
///
/// Generated codes come from the codec and are trusted as-is; custom codes
/// are user input and go through [`ShortCode::custom`], which case-folds
/// to lowercase and enforces the alphabet-and-length policy. Custom codes
/// are allowed a richer alphabet than the codec's digits because they
/// never need to round-trip through `decode`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShortCode {
    /// A code derived from an internal id by the codec.
    Generated(SmolStr),
    /// A user-chosen code.
    Custom(SmolStr),
}

impl ShortCode {
    /// Wraps a codec-produced code. No validation: the codec alphabet is
    /// fixed and trusted.
    pub fn generated(code: impl AsRef<str>) -> Self {
        Self::Generated(SmolStr::new(code.as_ref()))
    }

    /// Validates and normalizes a user-supplied custom code.
    ///
    /// The code is trimmed and case-folded to lowercase; the result must
    /// be 1 to 32 ASCII alphanumeric characters.
    pub fn custom(raw: &str) -> Result<Self, ValidateError> {
        let folded = raw.trim().to_lowercase();
        if folded.is_empty() {
            return Err(ValidateError::InvalidCustomCode(
                "custom code is empty".to_string(),
            ));
        }
        if folded.len() > MAX_CUSTOM_LENGTH {
            return Err(ValidateError::InvalidCustomCode(format!(
                "length must be at most {MAX_CUSTOM_LENGTH}, got {}",
                folded.len()
            )));
        }
        if !folded.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidateError::InvalidCustomCode(format!(
                "must contain only letters and digits: {folded:?}"
            )));
        }
        Ok(Self::Custom(SmolStr::new(folded)))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            ShortCode::Generated(code) | ShortCode::Custom(code) => code.as_str(),
        }
    }

    /// True if the code was user-chosen rather than derived from an id.
    pub fn is_custom(&self) -> bool {
        matches!(self, ShortCode::Custom(_))
    }

    /// Generates the full short URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self)
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
