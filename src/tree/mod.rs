//! Concurrent Tree Module
//!
//! Ordered in-memory key/value store: an unbalanced binary search tree whose
//! nodes each carry their own reader/writer lock.
//!
//! ## Locking Disciplines
//!
//! ### Search path (query / insert / remove): hand-over-hand
//! ```text
//!   lock(root) ──► lock(child) ──► unlock(root) ──► lock(grandchild) ──► ...
//! ```
//! - `query` couples in read mode, `insert`/`remove` in write mode
//! - At most the current node and the next node are held while descending
//! - Writers on divergent subtrees never contend below their common prefix
//! - `insert`/`remove` keep the target and its parent locked until the link
//!   surgery is done; a two-child `remove` keeps the target locked while it
//!   couples down to the in-order successor
//!
//! ### Dump / snapshot: hold the subtree
//! A node's read lock is held across the recursive walk of both of its
//! subtrees. The output is a point-in-time image of that subtree, and writers
//! into it wait until the walk leaves. This is not the coupling discipline
//! and must stay that way, or dumps lose their consistency.
//!
//! ## Failure Modes
//! - Node allocation failure aborts the process (global allocator)
//! - `parking_lot` locks neither poison nor report OS errors

mod node;

use std::io::{self, Write};
use std::mem;
use std::sync::Arc;

use crate::error::{ArborError, Result};

use node::{Link, Node, ReadGuard, WriteGuard};

/// Longest key or value a node may hold (in bytes)
pub const MAX_ENTRY_LEN: usize = 256;

/// Outcome of [`ConcurrentTree::insert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    Added,
    AlreadyExists,
}

/// Outcome of [`ConcurrentTree::remove`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remove {
    Removed,
    NotFound,
}

/// Binary search tree with per-node locks
///
/// ## Concurrency:
/// - `root`: permanent sentinel, never unlinked; every operation starts here
/// - All methods use `&self`; share the tree through an `Arc`
pub struct ConcurrentTree {
    root: Link,
}

impl ConcurrentTree {
    /// Create an empty tree (just the sentinel)
    pub fn new() -> Self {
        Self {
            root: Node::sentinel(),
        }
    }

    // =========================================================================
    // Point Operations
    // =========================================================================

    /// Look up the value stored under `key`
    pub fn query(&self, key: &[u8]) -> Option<Vec<u8>> {
        let mut current: ReadGuard = self.root.read_arc();

        loop {
            let next = current.child(key).map(Arc::clone)?;

            // Lock the child before letting go of the current node
            let next_guard = next.read_arc();
            if next_guard.key.as_slice() == key {
                return Some(next_guard.value.clone());
            }
            current = next_guard;
        }
    }

    /// Insert a new key; an existing key keeps its value
    pub fn insert(&self, key: &[u8], value: &[u8]) -> Result<Insert> {
        check_len("key", key)?;
        check_len("value", value)?;

        let (mut parent, existing) = self.search_for_write(key);
        if existing.is_some() {
            return Ok(Insert::AlreadyExists);
        }

        *parent.child_slot_mut(key) = Some(Node::leaf(key, value));
        Ok(Insert::Added)
    }

    /// Remove `key` and its value
    pub fn remove(&self, key: &[u8]) -> Remove {
        let (mut parent, target) = self.search_for_write(key);
        let Some(mut target) = target else {
            return Remove::NotFound;
        };

        if target.left.is_some() && target.right.is_some() {
            drop(parent);
            Self::replace_with_successor(target);
            return Remove::Removed;
        }

        // At most one child: splice it into the target's slot
        let orphan = match target.right.take() {
            Some(right) => Some(right),
            None => target.left.take(),
        };
        let unlinked = mem::replace(parent.child_slot_mut(&target.key), orphan);

        drop(target);
        drop(parent);
        drop(unlinked);
        Remove::Removed
    }

    // =========================================================================
    // Whole-Tree Operations
    // =========================================================================

    /// Write a pre-order dump of the tree to `sink`
    ///
    /// Format, one line per position, indented one space per level:
    /// ```text
    /// (root)
    ///  (null)
    ///  m 1
    ///   c 2
    ///    (null)
    ///    (null)
    ///   (null)
    /// ```
    pub fn dump<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        self.dump_link(Some(&self.root), 0, sink)
    }

    /// All entries in key order, read under the dump discipline
    pub fn snapshot(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut entries = Vec::new();
        let root = self.root.read();
        collect_in_order(root.left.as_ref(), &mut entries);
        collect_in_order(root.right.as_ref(), &mut entries);
        entries
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        let root = self.root.read();
        count_nodes(root.left.as_ref()) + count_nodes(root.right.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        let root = self.root.read();
        root.left.is_none() && root.right.is_none()
    }

    /// Destroy every node below the sentinel, returning how many were freed
    ///
    /// Iterative, so degenerate (list-shaped) trees cannot overflow the stack.
    /// Calling it again on an empty tree frees nothing.
    pub fn teardown(&self) -> usize {
        let mut pending: Vec<Link> = {
            let mut root = self.root.write();
            root.left.take().into_iter().chain(root.right.take()).collect()
        };

        let mut destroyed = 0;
        while let Some(link) = pending.pop() {
            let (left, right) = match Arc::try_unwrap(link) {
                Ok(lock) => {
                    let node = lock.into_inner();
                    (node.left, node.right)
                }
                Err(shared) => {
                    let mut node = shared.write();
                    (node.left.take(), node.right.take())
                }
            };
            pending.extend(left);
            pending.extend(right);
            destroyed += 1;
        }

        tracing::debug!("Tree teardown freed {} nodes", destroyed);
        destroyed
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Couple down in write mode; returns the parent and, if present, the node
    /// holding `key`. Both guards stay held for the caller.
    fn search_for_write(&self, key: &[u8]) -> (WriteGuard, Option<WriteGuard>) {
        let mut parent = self.root.write_arc();

        loop {
            let next = parent.child(key).map(Arc::clone);
            let Some(next) = next else {
                return (parent, None);
            };

            let next_guard = next.write_arc();
            if next_guard.key.as_slice() == key {
                return (parent, Some(next_guard));
            }
            parent = next_guard;
        }
    }

    /// Two-child removal: move the in-order successor's entry into `target`
    /// and unlink the successor. `target` stays locked throughout.
    fn replace_with_successor(mut target: WriteGuard) {
        let first = target.right.as_ref().map(Arc::clone);
        let Some(first) = first else {
            return;
        };

        // `holder` is the successor's parent, or None while that is `target`
        let mut holder: Option<WriteGuard> = None;
        let mut current = first.write_arc();
        drop(first);

        loop {
            let next = current.left.as_ref().map(Arc::clone);
            let Some(next) = next else {
                break;
            };

            drop(holder.take());
            let next_guard = next.write_arc();
            holder = Some(mem::replace(&mut current, next_guard));
        }

        // `current` is the successor: no left child
        let orphan = current.right.take();
        target.key = mem::take(&mut current.key);
        target.value = mem::take(&mut current.value);

        let unlinked = match holder.as_mut() {
            Some(parent) => mem::replace(&mut parent.left, orphan),
            None => mem::replace(&mut target.right, orphan),
        };

        drop(current);
        drop(holder);
        drop(target);
        drop(unlinked);
    }

    fn dump_link<W: Write>(&self, link: Option<&Link>, depth: usize, sink: &mut W) -> io::Result<()> {
        let Some(link) = link else {
            return writeln!(sink, "{:width$}(null)", "", width = depth);
        };

        // Held until both subtrees are printed
        let node = link.read();
        write!(sink, "{:width$}", "", width = depth)?;
        if Arc::ptr_eq(link, &self.root) {
            writeln!(sink, "(root)")?;
        } else {
            sink.write_all(&node.key)?;
            sink.write_all(b" ")?;
            sink.write_all(&node.value)?;
            sink.write_all(b"\n")?;
        }

        self.dump_link(node.left.as_ref(), depth + 1, sink)?;
        self.dump_link(node.right.as_ref(), depth + 1, sink)
    }
}

impl Default for ConcurrentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConcurrentTree {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn check_len(field: &'static str, bytes: &[u8]) -> Result<()> {
    if bytes.len() > MAX_ENTRY_LEN {
        return Err(ArborError::EntryTooLarge {
            field,
            len: bytes.len(),
            max: MAX_ENTRY_LEN,
        });
    }
    Ok(())
}

fn collect_in_order(link: Option<&Link>, out: &mut Vec<(Vec<u8>, Vec<u8>)>) {
    if let Some(link) = link {
        let node = link.read();
        collect_in_order(node.left.as_ref(), out);
        out.push((node.key.clone(), node.value.clone()));
        collect_in_order(node.right.as_ref(), out);
    }
}

fn count_nodes(link: Option<&Link>) -> usize {
    match link {
        Some(link) => {
            let node = link.read();
            1 + count_nodes(node.left.as_ref()) + count_nodes(node.right.as_ref())
        }
        None => 0,
    }
}
