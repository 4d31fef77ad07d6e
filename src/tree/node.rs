//! Tree node
//!
//! A node owns its key, value and child links. The node itself lives inside a
//! `parking_lot::RwLock` behind an `Arc`, so a traversal can hold an owned
//! guard on one node while it acquires the guard on the next.

use std::sync::Arc;

use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::{RawRwLock, RwLock};

/// Owning link to a locked node
pub(crate) type Link = Arc<RwLock<Node>>;

/// Owned read guard, independent of the parent's guard lifetime
pub(crate) type ReadGuard = ArcRwLockReadGuard<RawRwLock, Node>;

/// Owned write guard, independent of the parent's guard lifetime
pub(crate) type WriteGuard = ArcRwLockWriteGuard<RawRwLock, Node>;

/// A single key/value node
///
/// The root sentinel is a node with an empty key: no key sorts below it, so
/// the whole tree hangs off its right link.
#[derive(Debug, Default)]
pub(crate) struct Node {
    pub(crate) key: Vec<u8>,
    pub(crate) value: Vec<u8>,
    pub(crate) left: Option<Link>,
    pub(crate) right: Option<Link>,
}

impl Node {
    pub(crate) fn sentinel() -> Link {
        Arc::new(RwLock::new(Node::default()))
    }

    pub(crate) fn leaf(key: &[u8], value: &[u8]) -> Link {
        Arc::new(RwLock::new(Node {
            key: key.to_vec(),
            value: value.to_vec(),
            left: None,
            right: None,
        }))
    }

    /// Next link on the search path for `key`
    pub(crate) fn child(&self, key: &[u8]) -> Option<&Link> {
        if key < self.key.as_slice() {
            self.left.as_ref()
        } else {
            self.right.as_ref()
        }
    }

    /// Slot that holds (or would hold) the subtree containing `key`
    pub(crate) fn child_slot_mut(&mut self, key: &[u8]) -> &mut Option<Link> {
        if key < self.key.as_slice() {
            &mut self.left
        } else {
            &mut self.right
        }
    }
}
