//! The conflict detector: the compatibility matrix between an incoming
//! request and the operations already resident along its path.
//!
//! Pure and read-only — no mutex, no mutation, no I/O. Given an
//! incoming mode and the path-tree nodes already produced by
//! [`crate::tree::Tree::walk`], returns every currently-resident
//! operation that must precede the incoming one.

use crate::list::Links;
use crate::operation::{LockMode, OpId};
use crate::tree::{NodeId, Tree};

/// Returns the blocker set for an incoming operation of `mode`
/// targeting the node path `path_nodes` (root-to-target, as returned
/// by `Tree::walk`). `mode_of` resolves a resident `OpId` to its mode.
pub fn blockers<L: Links<OpId>>(
    tree: &Tree,
    path_nodes: &[NodeId],
    mode: LockMode,
    links: &L,
    mode_of: impl Fn(OpId) -> LockMode,
) -> Vec<OpId> {
    let mut out = Vec::new();
    let (&target, ancestors) =
        path_nodes.split_last().expect("walk always returns at least the root");

    // (a) Ancestor barrier: a WriteTree anywhere above always blocks;
    // a ReadTree above blocks only tree-mutating/exclusive incomers.
    for &ancestor in ancestors {
        tree.local(ancestor).iterate(links, |resident| {
            let resident_mode = mode_of(resident);
            let blocks = resident_mode == LockMode::WriteTree
                || (resident_mode == LockMode::ReadTree
                    && matches!(mode, LockMode::WriteTree | LockMode::WriteNode));
            if blocks {
                out.push(resident);
            }
        });
    }

    // (b) Same-node conflict: blocks unless both sides are reads.
    tree.local(target).iterate(links, |resident| {
        let resident_mode = mode_of(resident);
        if resident_mode.is_write() || mode.is_write() {
            out.push(resident);
        }
    });

    // (c) Subtree barrier: only relevant for incoming tree-scoped ops.
    if mode.is_tree_scoped() {
        tree.subtree(target).iterate(links, |resident| {
            let resident_mode = mode_of(resident);
            if mode == LockMode::WriteTree || resident_mode.is_write() {
                out.push(resident);
            }
        });
    }

    out
}
