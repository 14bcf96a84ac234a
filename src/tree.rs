//! The on-demand trie of outstanding operations.
//!
//! Nodes live in a flat `slab::Slab`, addressed by [`NodeId`], rather
//! than as a recursively-owned `children: HashMap<_, Node>` tree of
//! boxed nodes. A flat arena sidesteps the aliasing problems a
//! recursively-owned tree runs into when `walk` must hand back a
//! sequence of nodes that `insert`/`remove`/conflict-detection later
//! all need to touch independently, instead of each node holding its
//! neighbors behind a pointer or a `Box` (see `list.rs` for the same
//! arena-index-over-pointer choice applied to the order list).

use std::collections::HashMap;

use slab::Slab;

use crate::list::{connect, Links, Range};
use crate::operation::OpId;
use crate::path::{Path, Segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

struct Node {
    parent: Option<NodeId>,
    segment: Option<Segment>,
    children: HashMap<Segment, NodeId>,
    /// Operations whose target path ends exactly at this node.
    local: Range<OpId>,
    /// Operations whose target path lies strictly below this node.
    subtree: Range<OpId>,
}

impl Node {
    fn empty(&self) -> bool {
        self.local.empty() && self.subtree.empty() && self.children.is_empty()
    }
}

/// The path tree: a single root node, always present.
pub struct Tree {
    nodes: Slab<Node>,
    root: NodeId,
}

impl Tree {
    pub fn new() -> Self {
        let mut nodes = Slab::new();
        let root = NodeId(nodes.insert(Node {
            parent: None,
            segment: None,
            children: HashMap::new(),
            local: Range::default(),
            subtree: Range::default(),
        }));
        Tree { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn local(&self, id: NodeId) -> Range<OpId> {
        self.nodes[id.0].local
    }

    pub fn subtree(&self, id: NodeId) -> Range<OpId> {
        self.nodes[id.0].subtree
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        !self.nodes[id.0].children.is_empty()
    }

    /// Returns the sequence of nodes from root to the target
    /// (length `path.len() + 1`), creating missing children on the way
    /// down.
    pub fn walk(&mut self, path: &Path) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(path.len() + 1);
        let mut current = self.root;
        out.push(current);

        for segment in path.iter() {
            let next = self.nodes[current.0].children.get(segment).copied().unwrap_or_else(|| {
                let child = NodeId(self.nodes.insert(Node {
                    parent: Some(current),
                    segment: Some(segment.clone()),
                    children: HashMap::new(),
                    local: Range::default(),
                    subtree: Range::default(),
                }));
                self.nodes[current.0].children.insert(segment.clone(), child);
                child
            });
            out.push(next);
            current = next;
        }

        out
    }

    /// Places `op` into the target's `local` list and every strict
    /// ancestor's `subtree` list, re-stitching the local/subtree
    /// crossover at each touched node.
    pub fn insert(&mut self, path_nodes: &[NodeId], op: OpId, links: &mut impl Links<OpId>) {
        let (&target, ancestors) = path_nodes.split_last().expect("walk always returns >= 1 node");

        let target_local = self.nodes[target.0].local.insert(links, op);
        self.nodes[target.0].local = target_local;
        connect(links, self.nodes[target.0].local, self.nodes[target.0].subtree);

        for &ancestor in ancestors.iter().rev() {
            let subtree = self.nodes[ancestor.0].subtree.insert(links, op);
            self.nodes[ancestor.0].subtree = subtree;
            connect(links, self.nodes[ancestor.0].local, self.nodes[ancestor.0].subtree);
        }
    }

    /// Removes `op` from the target's `local` list and every strict
    /// ancestor's `subtree` list, then prunes any node (other than
    /// root) left with no local operations, no subtree operations, and
    /// no children.
    pub fn remove(&mut self, path_nodes: &[NodeId], op: OpId, links: &mut impl Links<OpId>) {
        let (&target, ancestors) = path_nodes.split_last().expect("walk always returns >= 1 node");

        let target_local = self.nodes[target.0].local.remove(links, op);
        self.nodes[target.0].local = target_local;

        for &ancestor in ancestors.iter().rev() {
            let subtree = self.nodes[ancestor.0].subtree.remove(links, op);
            self.nodes[ancestor.0].subtree = subtree;
        }

        for &node in path_nodes.iter().rev() {
            if node == self.root {
                break;
            }
            if !self.nodes[node.0].empty() {
                break;
            }
            let parent = self.nodes[node.0].parent.expect("non-root has a parent");
            let segment = self.nodes[node.0].segment.clone().expect("non-root has a segment");
            self.nodes.remove(node.0);
            self.nodes[parent.0].children.remove(&segment);
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Tree::new()
    }
}
