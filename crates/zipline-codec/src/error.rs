use thiserror::Error;

/// Errors returned by codec construction, encoding, and decoding.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("id must be a positive integer")]
    NonPositiveId,
    #[error("short code is empty")]
    EmptyCode,
    #[error("invalid digit {digit:?}; alphabet is {alphabet:?}")]
    InvalidDigit { digit: char, alphabet: String },
    #[error("short code {code:?} does not fit in the id space")]
    Overflow { code: String },
    #[error("invalid alphabet: {0}")]
    InvalidAlphabet(String),
}
