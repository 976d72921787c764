//! Reversible integer <-> short-code transformation.
//!
//! The codec is a bijective positional numeral system: there is no zero
//! digit, so every positive integer maps to exactly one digit string and
//! every digit string maps back to exactly one positive integer. Codes
//! never carry leading-zero ambiguity the way standard base-N strings do.

mod codec;
pub mod error;

pub use codec::{BijectiveCodec, DEFAULT_ALPHABET};
pub use error::Error;
