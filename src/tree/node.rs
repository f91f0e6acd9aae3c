//! Node model shared by every tree collection.
//!
//! A tree is made of two node shapes:
//!
//! - a [`LeafNode`] holding up to `B` elements, and
//! - an [`InternalNode`] holding up to `B` child links together with the
//!   cumulative element count through each child.
//!
//! Cumulative counts turn the tree into an order-statistics tree: an index is
//! routed to a child by a binary search over the counts, without comparing
//! elements. The link type is generic so the same node shapes back both the
//! boxed, single-owner [`MutableNode`] and the reference-counted,
//! copy-on-write [`SharedNode`].

use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use super::ReferenceCounter;
use crate::tracing_helpers::trace_log;

// =============================================================================
// Constants
// =============================================================================

/// Branching factor used when none is given explicitly.
pub const DEFAULT_BRANCHING_FACTOR: usize = 8;

/// Smallest branching factor accepted by the constructors.
pub const MINIMUM_BRANCHING_FACTOR: usize = 4;

/// Inline capacity of node storage. Nodes of larger trees spill to the heap.
const INLINE_CAPACITY: usize = DEFAULT_BRANCHING_FACTOR;

// =============================================================================
// Leaf
// =============================================================================

/// Ordered run of elements stored at the bottom of the tree.
#[derive(Clone)]
pub(crate) struct LeafNode<T> {
    elements: SmallVec<[T; INLINE_CAPACITY]>,
}

impl<T> LeafNode<T> {
    pub(crate) fn new() -> Self {
        Self {
            elements: SmallVec::new(),
        }
    }

    pub(crate) fn singleton(element: T) -> Self {
        let mut leaf = Self::new();
        leaf.elements.push(element);
        leaf
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub(crate) fn get(&self, slot: usize) -> Option<&T> {
        self.elements.get(slot)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, slot: usize) -> Option<&mut T> {
        self.elements.get_mut(slot)
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[T] {
        &self.elements
    }

    pub(crate) fn push(&mut self, element: T) {
        self.elements.push(element);
    }

    pub(crate) fn insert(&mut self, slot: usize, element: T) {
        self.elements.insert(slot, element);
    }

    pub(crate) fn remove(&mut self, slot: usize) -> T {
        self.elements.remove(slot)
    }

    /// Moves `[at, len)` into a new leaf.
    pub(crate) fn split_off(&mut self, at: usize) -> Self {
        let elements: SmallVec<[T; INLINE_CAPACITY]> = self.elements.drain(at..).collect();
        self.elements.shrink_to_fit();
        Self { elements }
    }

    pub(crate) fn into_elements(self) -> SmallVec<[T; INLINE_CAPACITY]> {
        self.elements
    }
}

// =============================================================================
// Internal
// =============================================================================

/// Child links paired with cumulative subtree counts.
///
/// `offsets[i]` is the number of elements stored in children `0..=i`, so the
/// last offset is the element count of the whole subtree.
#[derive(Clone)]
pub(crate) struct InternalNode<L> {
    children: SmallVec<[L; INLINE_CAPACITY]>,
    offsets: SmallVec<[usize; INLINE_CAPACITY]>,
}

impl<L> InternalNode<L> {
    pub(crate) fn new() -> Self {
        Self {
            children: SmallVec::new(),
            offsets: SmallVec::new(),
        }
    }

    /// Number of children.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.children.len()
    }

    /// Number of elements in the subtree.
    #[inline]
    pub(crate) fn count(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }

    #[inline]
    pub(crate) fn child(&self, position: usize) -> &L {
        &self.children[position]
    }

    #[inline]
    pub(crate) fn child_mut(&mut self, position: usize) -> &mut L {
        &mut self.children[position]
    }

    #[inline]
    pub(crate) fn children(&self) -> &[L] {
        &self.children
    }

    #[inline]
    fn offset_before(&self, position: usize) -> usize {
        if position == 0 {
            0
        } else {
            self.offsets[position - 1]
        }
    }

    /// Number of elements under the child at `position`.
    #[inline]
    pub(crate) fn child_count(&self, position: usize) -> usize {
        self.offsets[position] - self.offset_before(position)
    }

    /// Routes an element index in `[0, count)` to `(child, index within child)`.
    #[inline]
    pub(crate) fn route(&self, index: usize) -> (usize, usize) {
        let position = self.offsets.partition_point(|&offset| offset <= index);
        (position, index - self.offset_before(position))
    }

    /// Routes an insertion point in `[0, count]`. The end of the subtree maps
    /// to the end of the last child.
    #[inline]
    pub(crate) fn route_insertion(&self, index: usize) -> (usize, usize) {
        let position = self
            .offsets
            .partition_point(|&offset| offset <= index)
            .min(self.len().saturating_sub(1));
        (position, index - self.offset_before(position))
    }

    pub(crate) fn push_child(&mut self, child: L, child_count: usize) {
        let offset = self.count() + child_count;
        self.children.push(child);
        self.offsets.push(offset);
    }

    /// Records one element added under the child at `position`.
    pub(crate) fn increment_from(&mut self, position: usize) {
        for offset in &mut self.offsets[position..] {
            *offset += 1;
        }
    }

    /// Records one element removed from under the child at `position`.
    pub(crate) fn decrement_from(&mut self, position: usize) {
        for offset in &mut self.offsets[position..] {
            *offset -= 1;
        }
    }

    /// Places `sibling`, which took the last `sibling_count` elements of the
    /// child at `position`, directly after that child.
    pub(crate) fn split_child(&mut self, position: usize, sibling: L, sibling_count: usize) {
        let end = self.offsets[position];
        self.offsets[position] = end - sibling_count;
        self.children.insert(position + 1, sibling);
        self.offsets.insert(position + 1, end);
    }

    /// Detaches the trailing `count` elements of the last child from this
    /// node's bookkeeping so they can live in a new sibling node.
    pub(crate) fn release_tail(&mut self, count: usize) {
        if let Some(last) = self.offsets.last_mut() {
            *last -= count;
        }
    }

    pub(crate) fn remove_child(&mut self, position: usize) -> L {
        let removed = self.child_count(position);
        self.offsets.remove(position);
        for offset in &mut self.offsets[position..] {
            *offset -= removed;
        }
        self.children.remove(position)
    }

    /// Moves children `[at, len)` into a new node.
    pub(crate) fn split_off(&mut self, at: usize) -> Self {
        let base = self.offset_before(at);
        let children: SmallVec<[L; INLINE_CAPACITY]> = self.children.drain(at..).collect();
        let offsets: SmallVec<[usize; INLINE_CAPACITY]> =
            self.offsets.drain(at..).map(|offset| offset - base).collect();
        self.children.shrink_to_fit();
        self.offsets.shrink_to_fit();
        Self { children, offsets }
    }

    pub(crate) fn into_children(self) -> SmallVec<[L; INLINE_CAPACITY]> {
        self.children
    }
}

// =============================================================================
// Node body and links
// =============================================================================

/// The two node shapes, generic over the link used to reach children.
#[derive(Clone)]
pub(crate) enum NodeBody<T, L> {
    Leaf(LeafNode<T>),
    Internal(InternalNode<L>),
}

impl<T, L> NodeBody<T, L> {
    /// Number of elements in the subtree rooted here.
    #[inline]
    pub(crate) fn count(&self) -> usize {
        match self {
            Self::Leaf(leaf) => leaf.len(),
            Self::Internal(internal) => internal.count(),
        }
    }
}

/// Read access to a node through its link.
pub(crate) trait Link<T>: Sized {
    fn body(&self) -> &NodeBody<T, Self>;
}

/// Write access to a node through its link.
///
/// `edit` is the only way a mutation reaches a node. Implementations decide
/// whether the node may change in place or must be copied first.
pub(crate) trait LinkMut<T>: Link<T> {
    /// Identifies who may mutate a node in place.
    type Owner: Copy;

    fn edit(&mut self, owner: Self::Owner) -> &mut NodeBody<T, Self>;

    fn from_body(body: NodeBody<T, Self>, owner: Self::Owner) -> Self;

    fn into_body(self) -> NodeBody<T, Self>;
}

// =============================================================================
// Mutable (boxed) nodes
// =============================================================================

/// Node of a [`TreeList`](super::TreeList). Always exclusively owned.
#[derive(Clone)]
pub(crate) struct MutableNode<T> {
    body: NodeBody<T, Box<Self>>,
}

impl<T> Link<T> for Box<MutableNode<T>> {
    #[inline]
    fn body(&self) -> &NodeBody<T, Self> {
        &self.body
    }
}

impl<T> LinkMut<T> for Box<MutableNode<T>> {
    type Owner = ();

    #[inline]
    fn edit(&mut self, (): ()) -> &mut NodeBody<T, Self> {
        &mut self.body
    }

    fn from_body(body: NodeBody<T, Self>, (): ()) -> Self {
        Box::new(MutableNode { body })
    }

    fn into_body(self) -> NodeBody<T, Self> {
        self.body
    }
}

// =============================================================================
// Shared (persistent) nodes
// =============================================================================

/// Tag naming the builder allowed to mutate a node in place.
///
/// A node whose tag differs from the editing builder's tag is frozen: it may
/// be reachable from a published snapshot and is copied before any change.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct OwnerId(u64);

impl OwnerId {
    /// Tag carried by nodes that no builder owns.
    pub(crate) const FROZEN: Self = Self(0);

    /// Returns a tag that no existing node carries.
    pub(crate) fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Node of the persistent list and its builder.
#[derive(Clone)]
pub(crate) struct SharedNode<T> {
    owner: OwnerId,
    body: NodeBody<T, ReferenceCounter<Self>>,
}

impl<T> Link<T> for ReferenceCounter<SharedNode<T>> {
    #[inline]
    fn body(&self) -> &NodeBody<T, Self> {
        &self.body
    }
}

impl<T: Clone> LinkMut<T> for ReferenceCounter<SharedNode<T>> {
    type Owner = OwnerId;

    fn edit(&mut self, owner: OwnerId) -> &mut NodeBody<T, Self> {
        if self.owner != owner {
            trace_log!(count = self.body.count(), "copying frozen node");
            *self = ReferenceCounter::new(SharedNode {
                owner,
                body: self.body.clone(),
            });
        }
        // Copies again only if an owned node is somehow aliased.
        &mut ReferenceCounter::make_mut(self).body
    }

    fn from_body(body: NodeBody<T, Self>, owner: OwnerId) -> Self {
        ReferenceCounter::new(SharedNode { owner, body })
    }

    fn into_body(self) -> NodeBody<T, Self> {
        match ReferenceCounter::try_unwrap(self) {
            Ok(node) => node.body,
            Err(shared) => shared.body.clone(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
