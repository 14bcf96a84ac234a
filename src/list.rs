//! An intrusive, non-owning doubly-linked order list.
//!
//! The list stores no data of its own beyond a pair of endpoint
//! pointers (a [`Range`]); the `prev`/`next` links for each member live
//! wherever the caller keeps them, reached through the [`Links`] trait.
//! Keeping link ownership separate from the list's own head/tail state
//! lets the *same* link pair sit inside a node's `local` range and
//! every strict ancestor's `subtree` range at once (see `tree.rs`),
//! instead of allocating one link pair per list membership.

use std::fmt;
use std::hash::Hash;

/// Something with links into zero or more order lists, addressed by a
/// stable key `K` (an operation id in this crate). A single `K` may be
/// a current member of several independent [`Range`]s simultaneously;
/// since it carries only one `prev`/`next` pair, `connect` is what
/// keeps those ranges threaded into one consistent chain.
pub trait Links<K> {
    fn prev(&self, key: K) -> Option<K>;
    fn next(&self, key: K) -> Option<K>;
    fn set_prev(&mut self, key: K, value: Option<K>);
    fn set_next(&mut self, key: K, value: Option<K>);
}

/// The endpoints of one logical order list. Copy because it is two
/// `Option<K>`s; all mutation happens through `insert`/`remove`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Range<K> {
    first: Option<K>,
    last: Option<K>,
}

impl<K> Default for Range<K> {
    fn default() -> Self {
        Range { first: None, last: None }
    }
}

impl<K: fmt::Debug> fmt::Debug for Range<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Range").field("first", &self.first).field("last", &self.last).finish()
    }
}

impl<K: Copy + Eq> Range<K> {
    pub fn empty(&self) -> bool {
        self.first.is_none()
    }

    pub fn first(&self) -> Option<K> {
        self.first
    }

    pub fn last(&self) -> Option<K> {
        self.last
    }

    /// Visits every member from first to last, inclusive, in FIFO order.
    pub fn iterate(&self, links: &impl Links<K>, mut f: impl FnMut(K)) {
        let mut cur = self.first;
        while let Some(k) = cur {
            f(k);
            if Some(k) == self.last {
                break;
            }
            cur = links.next(k);
        }
    }

    /// Appends `key` to the range, or re-attaches it if it is already
    /// linked adjacently to one of the range's current endpoints.
    ///
    /// A handle that is already linked into the combined global chain
    /// just outside this range (because it belongs to a different,
    /// overlapping range sharing the same underlying links) only needs
    /// an endpoint moved outward; a genuinely new handle is spliced on
    /// as the new last element.
    pub fn insert(mut self, links: &mut impl Links<K>, key: K) -> Self {
        if self.empty() {
            self.first = Some(key);
            self.last = Some(key);
            return self;
        }

        if links.next(key) == self.first {
            self.first = Some(key);
            return self;
        }

        if links.prev(key) == self.last {
            self.last = Some(key);
            return self;
        }

        // `key` already has linkage from membership in some other,
        // narrower range over the same handle chain (e.g. a node's
        // `local` range for an operation whose ancestors' `subtree`
        // ranges also include it). Its neighbours there already sit
        // inside this range's current bounds, so this range already
        // covers it without any endpoint or link change. Splicing it
        // in as a fresh last element here, unconditionally, would tear
        // it out of the chain it is already correctly threaded into.
        if links.prev(key).is_some() || links.next(key).is_some() {
            return self;
        }

        // a fresh handle: splice it in as the new last, preserving
        // whatever `last` already pointed to.
        let old_last = self.last.expect("non-empty range has a last");
        if let Some(old_next) = links.next(old_last) {
            links.set_prev(old_next, Some(key));
            links.set_next(key, Some(old_next));
        }
        links.set_next(old_last, Some(key));
        links.set_prev(key, Some(old_last));
        self.last = Some(key);
        self
    }

    /// Removes `key` from the range. `key` must currently be a member.
    pub fn remove(mut self, links: &mut impl Links<K>, key: K) -> Self {
        let prev = links.prev(key);
        let next = links.next(key);

        if let Some(p) = prev {
            links.set_next(p, next);
        }
        if let Some(n) = next {
            links.set_prev(n, prev);
        }

        if self.first == Some(key) && self.last == Some(key) {
            self.first = None;
            self.last = None;
        } else if self.first == Some(key) {
            self.first = next;
        } else if self.last == Some(key) {
            self.last = prev;
        }

        self
    }
}

/// Guarantees the single cross-pointer between `left.last` and
/// `right.first` is consistent, re-threading any pre-existing external
/// neighbours so the combined sequence stays one chain. A no-op if
/// either range is empty.
pub fn connect<K: Copy + Eq>(links: &mut impl Links<K>, left: Range<K>, right: Range<K>) {
    let (Some(left_last), Some(right_first)) = (left.last, right.first) else {
        return;
    };

    if links.next(left_last) == Some(right_first) {
        // Already spliced; nothing to do.
        return;
    }

    if let Some(after) = links.next(left_last) {
        links.set_prev(after, right.last);
        links.set_next(right.last.expect("non-empty right has a last"), Some(after));
    }
    if let Some(before) = links.prev(right_first) {
        links.set_next(before, left.first);
        links.set_prev(left.first.expect("non-empty left has a first"), Some(before));
    }

    links.set_next(left_last, Some(right_first));
    links.set_prev(right_first, Some(left_last));
}
