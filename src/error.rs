//! The crate's narrow error surface.
//!
//! Ordinary contention, long waits, empty paths and deep trees are not
//! errors — acquire never fails due to contention, it simply waits.
//! What remains is malformed use of the release handle and (for
//! documentation completeness) resource exhaustion during bookkeeping.

use thiserror::Error;

/// Errors surfaced by [`crate::Lock`]'s public API.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LockError {
    /// A release handle was invoked twice: a usage error in the
    /// failing caller that must never corrupt the lock's global state.
    #[error("lock guard released more than once")]
    DoubleRelease,

    /// Node creation or list insertion could not allocate. Declared
    /// for completeness of the documented contract; unreachable on
    /// stable Rust, where `Vec`/`HashMap`/`slab::Slab` abort the
    /// process on allocation failure rather than return an error.
    #[error("lock bookkeeping storage exhausted")]
    Exhausted,
}
