//! The public API and the single serialisation boundary.
//!
//! `Lock` wraps its tree and operation arena in a single
//! `std::sync::Mutex` — simpler and correct-by-construction compared
//! to splitting bookkeeping across several locks, since nothing here
//! needs the extra pipelining that would buy — and is cheaply
//! `Clone`-able via an inner `Arc`, so a guard returned by one thread
//! can be released from another.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use slab::Slab;

use crate::conflict;
use crate::error::LockError;
use crate::list::Links;
use crate::operation::{LockMode, OpId, Operation};
use crate::path::{Path, Segment};
use crate::tree::Tree;

struct OperationArena(Slab<Operation>);

impl OperationArena {
    fn new() -> Self {
        OperationArena(Slab::new())
    }

    fn mode_of(&self, id: OpId) -> LockMode {
        self.0[id.0].mode
    }
}

impl Links<OpId> for OperationArena {
    fn prev(&self, key: OpId) -> Option<OpId> {
        self.0[key.0].prev
    }
    fn next(&self, key: OpId) -> Option<OpId> {
        self.0[key.0].next
    }
    fn set_prev(&mut self, key: OpId, value: Option<OpId>) {
        self.0[key.0].prev = value;
    }
    fn set_next(&mut self, key: OpId, value: Option<OpId>) {
        self.0[key.0].next = value;
    }
}

struct Inner {
    tree: Tree,
    ops: OperationArena,
}

/// A hierarchical reader/writer lock over a logical tree of
/// path-addressed nodes. Immediately usable after [`Lock::new`]; no
/// further setup is required.
#[derive(Clone)]
pub struct Lock {
    inner: Arc<Mutex<Inner>>,
}

impl Lock {
    pub fn new() -> Self {
        Lock {
            inner: Arc::new(Mutex::new(Inner { tree: Tree::new(), ops: OperationArena::new() })),
        }
    }

    /// Shared access to the single node at `path`.
    pub fn read_node<I, S>(&self, path: I) -> LockGuard
    where
        I: IntoIterator<Item = S>,
        S: Into<Segment>,
    {
        self.acquire(LockMode::ReadNode, Path::from(path))
    }

    /// Exclusive access to the single node at `path`.
    pub fn write_node<I, S>(&self, path: I) -> LockGuard
    where
        I: IntoIterator<Item = S>,
        S: Into<Segment>,
    {
        self.acquire(LockMode::WriteNode, Path::from(path))
    }

    /// Shared access to `path` and its entire subtree.
    pub fn read_tree<I, S>(&self, path: I) -> LockGuard
    where
        I: IntoIterator<Item = S>,
        S: Into<Segment>,
    {
        self.acquire(LockMode::ReadTree, Path::from(path))
    }

    /// Exclusive access to `path` and its entire subtree.
    pub fn write_tree<I, S>(&self, path: I) -> LockGuard
    where
        I: IntoIterator<Item = S>,
        S: Into<Segment>,
    {
        self.acquire(LockMode::WriteTree, Path::from(path))
    }

    fn acquire(&self, mode: LockMode, path: Path) -> LockGuard {
        let (op_id, waker) = {
            let mut guard = self.inner.lock().expect("treelock bookkeeping mutex poisoned");
            let inner = &mut *guard;

            let path_nodes = inner.tree.walk(&path);
            let blocker_ids = conflict::blockers(&inner.tree, &path_nodes, mode, &inner.ops, |id| {
                inner.ops.mode_of(id)
            });

            let mut op = Operation::new(mode, path.clone());
            op.blocked_by = blocker_ids.len();
            let waker = op.waker.clone();
            let op_id = OpId(inner.ops.0.insert(op));

            for &blocker in &blocker_ids {
                inner.ops.0[blocker.0].blocking.push(op_id);
            }

            inner.tree.insert(&path_nodes, op_id, &mut inner.ops);

            log::trace!(
                "acquire {mode:?} {path}: {} blocker(s), op={op_id:?}",
                blocker_ids.len()
            );

            if blocker_ids.is_empty() {
                // Runnable immediately: the pending-to-runnable
                // transition happens atomically, in this same critical
                // section.
                waker.signal();
            }

            (op_id, waker)
        };

        waker.wait();
        log::trace!("acquired op={op_id:?}");

        LockGuard { lock: self.clone(), op_id, path, released: AtomicBool::new(false) }
    }

    fn do_release(&self, op_id: OpId, path: &Path) {
        let mut dependents_to_signal = Vec::new();
        {
            let mut guard = self.inner.lock().expect("treelock bookkeeping mutex poisoned");
            let inner = &mut *guard;

            let path_nodes = inner.tree.walk(path);
            inner.tree.remove(&path_nodes, op_id, &mut inner.ops);

            let op = inner.ops.0.remove(op_id.0);
            log::trace!("release op={op_id:?} {path}: {} dependent(s)", op.blocking.len());

            for dependent in op.blocking {
                if let Some(dep) = inner.ops.0.get_mut(dependent.0) {
                    dep.blocked_by -= 1;
                    if dep.blocked_by == 0 {
                        dependents_to_signal.push(dep.waker.clone());
                    }
                }
            }
        }

        // Wakes are delivered only after the mutex is released: never
        // call into a waiting caller's continuation while holding it.
        for waker in dependents_to_signal {
            waker.signal();
        }
    }
}

impl Default for Lock {
    fn default() -> Self {
        Lock::new()
    }
}

/// A one-shot release handle.
///
/// Dropping the guard releases the lock, so the common case needs no
/// explicit call at all. `release` makes the release point explicit at
/// the call site instead, and reports a caller mistake: calling it a
/// second time returns [`LockError::DoubleRelease`] rather than
/// silently doing nothing, since a caller who asks to release twice
/// has a bug worth surfacing. The subsequent `Drop` glue that runs
/// when the guard eventually goes out of scope cannot report that
/// same condition (`Drop::drop` has no return value) and so stays
/// silent — it sees the single-shot flag already set and does nothing.
pub struct LockGuard {
    lock: Lock,
    op_id: OpId,
    path: Path,
    released: AtomicBool,
}

impl LockGuard {
    /// Releases the lock, making the acquisition's end visible at the
    /// call site instead of relying on scope-exit `Drop`. Returns
    /// [`LockError::DoubleRelease`] if this guard was already released
    /// by an earlier call to `release`.
    pub fn release(&self) -> Result<(), LockError> {
        self.mark_and_release()
    }

    fn mark_and_release(&self) -> Result<(), LockError> {
        if self.released.swap(true, Ordering::AcqRel) {
            Err(LockError::DoubleRelease)
        } else {
            self.lock.do_release(self.op_id, &self.path);
            Ok(())
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = self.mark_and_release();
    }
}

// `LockGuard` is automatically `Send` (every field is), which is what
// makes it usable from a thread other than the one that acquired it.

#[cfg(test)]
impl Lock {
    /// Test-only introspection: true once every resident operation has
    /// released and the tree has pruned back to a bare root.
    fn is_quiescent(&self) -> bool {
        let guard = self.inner.lock().unwrap();
        guard.ops.0.is_empty() && !guard.tree.has_children(guard.tree.root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn root_read_then_release() {
        let lock = Lock::new();
        let g = lock.read_node(Vec::<&str>::new());
        g.release().unwrap();
    }

    #[test]
    fn independent_node_reads_proceed_concurrently() {
        let lock = Lock::new();
        let g1 = lock.read_node(["a"]);
        let g2 = lock.write_node(["b"]);
        g1.release().unwrap();
        g2.release().unwrap();
    }

    #[test]
    fn writer_excludes_reader_on_same_node() {
        let lock = Lock::new();
        let writer = lock.write_node(["a", "b"]);

        let (tx, rx) = mpsc::channel();
        let lock2 = lock.clone();
        let handle = thread::spawn(move || {
            let _reader = lock2.read_node(["a", "b"]);
            tx.send(()).unwrap();
        });

        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        writer.release().unwrap();
        rx.recv_timeout(Duration::from_secs(1)).expect("reader should unblock after release");
        handle.join().unwrap();
    }

    #[test]
    fn ancestor_read_node_does_not_block_descendant_write_node() {
        let lock = Lock::new();
        let _a = lock.read_node(["a"]);
        let b = lock.write_node(["a", "b"]);
        b.release().unwrap();
    }

    #[test]
    fn ancestor_write_tree_blocks_descendant_read_node() {
        let lock = Lock::new();
        let writer = lock.write_tree(["a"]);

        let (tx, rx) = mpsc::channel();
        let lock2 = lock.clone();
        let handle = thread::spawn(move || {
            let _reader = lock2.read_node(["a", "b", "c"]);
            tx.send(()).unwrap();
        });

        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        writer.release().unwrap();
        rx.recv_timeout(Duration::from_secs(1)).expect("reader should unblock after release");
        handle.join().unwrap();
    }

    #[test]
    fn double_release_is_rejected_but_drop_afterwards_is_silent() {
        let lock = Lock::new();
        let g = lock.write_node(["a"]);
        assert_eq!(g.release(), Ok(()));
        assert_eq!(g.release(), Err(LockError::DoubleRelease));
        // Drop runs after the explicit releases above; it must not
        // panic or double-decrement a blocker that no longer exists.
        drop(g);

        // An immediately-subsequent acquire must see an empty tree,
        // not a phantom blocker left over from the rejected release.
        let g2 = lock.write_node(["a"]);
        g2.release().unwrap();
    }

    #[test]
    fn quiescent_after_a_single_acquire_release() {
        let lock = Lock::new();
        lock.read_node(["a", "b"]).release().unwrap();
        assert!(lock.is_quiescent());
    }
}
