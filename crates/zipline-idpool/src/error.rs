use thiserror::Error;

/// Errors returned by id acquisition and release.
///
/// `DoubleRelease` and `NeverIssued` always indicate a logic error in the
/// caller, never ordinary user input; release is deliberately strict so
/// such bugs surface instead of silently corrupting the pool.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("id {id} is already in the reuse pool")]
    DoubleRelease { id: u64 },
    #[error("id {id} was never issued (next id is {next_id})")]
    NeverIssued { id: u64, next_id: u64 },
    #[error("id pool state lock is poisoned")]
    PoisonedState,
}
