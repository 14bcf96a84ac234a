//! A single lock request: its mode, its place in the wait graph, and
//! the one-shot signal used to release the acquiring thread.
//!
//! `Waker` pairs a `Mutex<bool>` and a `Condvar` for the classic "wait
//! until a condition holds, and it's fine if it's already true" shape,
//! rather than anything FFI- or platform-specific. Built against
//! `loom`'s shadow `sync` types under `--cfg loom` so `loom_tests.rs`
//! can model-check the real handshake instead of a stand-in; ordinary
//! builds and tests use `std::sync` as usual.
#[cfg(loom)]
use loom::sync::{Arc, Condvar, Mutex};
#[cfg(not(loom))]
use std::sync::{Arc, Condvar, Mutex};

use crate::path::Path;

/// The four lock modes: shared/exclusive, scoped to a single node or
/// to a node and its whole subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    ReadNode,
    WriteNode,
    ReadTree,
    WriteTree,
}

impl LockMode {
    /// Tree-scoped modes govern `path` and its whole subtree; the two
    /// node-scoped modes govern only `path` itself.
    pub fn is_tree_scoped(self) -> bool {
        matches!(self, LockMode::ReadTree | LockMode::WriteTree)
    }

    pub fn is_write(self) -> bool {
        matches!(self, LockMode::WriteNode | LockMode::WriteTree)
    }
}

/// Opaque handle to an [`Operation`] living in a `Lock`'s internal
/// arena. Stable for the operation's whole resident lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpId(pub(crate) usize);

/// A one-shot "wait until signalled; safe to signal before wait"
/// primitive. Signalling is idempotent and may race arbitrarily far
/// ahead of the wait.
#[derive(Debug, Default)]
pub struct Waker {
    signalled: Mutex<bool>,
    condvar: Condvar,
}

impl Waker {
    pub fn new() -> Self {
        Waker { signalled: Mutex::new(false), condvar: Condvar::new() }
    }

    /// Blocks the calling thread until `signal` has been (or is ever)
    /// called. Returns immediately if it already has.
    pub fn wait(&self) {
        let mut signalled = self.signalled.lock().expect("waker mutex poisoned");
        while !*signalled {
            signalled = self.condvar.wait(signalled).expect("waker mutex poisoned");
        }
    }

    /// Marks the waker signalled and wakes a waiter, if any. Must not
    /// be called while holding the lock's bookkeeping mutex.
    pub fn signal(&self) {
        let mut signalled = self.signalled.lock().expect("waker mutex poisoned");
        *signalled = true;
        self.condvar.notify_one();
    }
}

/// A resident lock request: created on acquire entry, removed from the
/// tree and drained of its `blocking` set on release.
#[derive(Debug)]
pub struct Operation {
    pub mode: LockMode,
    pub path: Path,
    /// Count of as-yet-unreleased operations that precede this one.
    pub blocked_by: usize,
    /// Operations that registered `self` as one of their blockers;
    /// decremented on `self`'s release.
    pub blocking: Vec<OpId>,
    pub(crate) prev: Option<OpId>,
    pub(crate) next: Option<OpId>,
    pub waker: Arc<Waker>,
}

impl Operation {
    pub fn new(mode: LockMode, path: Path) -> Self {
        Operation {
            mode,
            path,
            blocked_by: 0,
            blocking: Vec::new(),
            prev: None,
            next: None,
            waker: Arc::new(Waker::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn signal_before_wait_is_observed() {
        let w = Waker::new();
        w.signal();
        w.wait(); // must not block
    }

    #[test]
    fn wait_blocks_until_signalled() {
        let w = Arc::new(Waker::new());
        let w2 = w.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            w2.signal();
        });
        w.wait();
        handle.join().unwrap();
    }

    #[test]
    fn lock_mode_scoping() {
        assert!(LockMode::ReadTree.is_tree_scoped());
        assert!(LockMode::WriteTree.is_tree_scoped());
        assert!(!LockMode::ReadNode.is_tree_scoped());
        assert!(!LockMode::WriteNode.is_tree_scoped());
        assert!(LockMode::WriteNode.is_write());
        assert!(LockMode::WriteTree.is_write());
        assert!(!LockMode::ReadNode.is_write());
        assert!(!LockMode::ReadTree.is_write());
    }
}
