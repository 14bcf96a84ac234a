//! A FIFO-fair, per-conflict-region hierarchical reader/writer lock.
//!
//! `treelock` coordinates access to a logical tree of path-addressed
//! nodes (a filesystem-like namespace, a configuration tree, anything
//! addressable by a sequence of segments) so that operations whose
//! effective regions do not conflict can proceed fully in parallel,
//! while operations that do conflict are granted strictly in the
//! order they were accepted.
//!
//! Four lock modes are available through [`Lock`]:
//!
//! - [`Lock::read_node`] / [`Lock::write_node`] — shared/exclusive
//!   access to a single node.
//! - [`Lock::read_tree`] / [`Lock::write_tree`] — shared/exclusive
//!   access to a node and its entire subtree.
//!
//! ```
//! use treelock::Lock;
//!
//! let lock = Lock::new();
//! let a = lock.read_node(["documents", "report"]);
//! let b = lock.write_node(["documents", "draft"]); // unrelated node, proceeds immediately
//! drop(a);
//! drop(b);
//! ```
//!
//! There is no deadlock detection because there cannot be a deadlock:
//! every wait edge runs from a fresh requester to operations already
//! resident when it was accepted, which makes the wait graph acyclic
//! by construction. There are no lock upgrades/downgrades, no
//! try-acquire/timeout/cancellation, and no reentrancy — an operation
//! that holds a lock and requests another lock over the same region
//! will block on itself.

pub use error::LockError;
pub use lock::{Lock, LockGuard};
pub use operation::LockMode;
pub use path::Path;

mod conflict;
mod error;
mod list;
mod lock;
mod operation;
mod path;
mod tree;

#[cfg(loom)]
mod loom_tests;
