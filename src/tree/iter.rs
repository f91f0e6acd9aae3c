//! Spans, range iterators and version-checked cursors.
//!
//! Two ways of walking a list are provided:
//!
//! - Borrowing iterators ([`TreeList::iter`](super::TreeList::iter) and
//!   friends). They hold a shared borrow of the list, so the borrow checker
//!   already rules out mutation while they are alive. They descend the tree
//!   lazily with an explicit parent stack and visit each leaf in order.
//! - [`Cursor`], a detached position that borrows its source only for the
//!   duration of each step. Because the source may be mutated between steps,
//!   a cursor captures the source's identity and version when it is created
//!   and refuses to advance once either has changed.
//!
//! Cursors are plain owned values. Cloning one yields an independent
//! position, and [`Cursor::reset`] only ever affects the cursor it is called
//! on.

use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use super::ReferenceCounter;
use super::node::{InternalNode, Link, MutableNode, NodeBody, SharedNode};
use crate::error::{CollectionError, CollectionResult};
use crate::tracing_helpers::debug_log;

// =============================================================================
// Span
// =============================================================================

/// A half-open index interval `[start, end)`.
///
/// # Examples
///
/// ```rust
/// use canopy::tree::Span;
///
/// let span = Span::new(2, 5).unwrap();
/// assert_eq!(span.len(), 3);
/// assert!(Span::new(5, 2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Creates the span `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::InvalidRange`] if `start > end`.
    pub const fn new(start: usize, end: usize) -> CollectionResult<Self> {
        if start > end {
            return Err(CollectionError::InvalidRange {
                start,
                count: 0,
                length: end,
            });
        }
        Ok(Self { start, end })
    }

    /// Creates the span of `count` indices starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::InvalidRange`] if `start + count`
    /// overflows.
    pub const fn with_count(start: usize, count: usize) -> CollectionResult<Self> {
        match start.checked_add(count) {
            Some(end) => Ok(Self { start, end }),
            None => Err(CollectionError::InvalidRange {
                start,
                count,
                length: usize::MAX,
            }),
        }
    }

    /// The span covering a whole collection of `length` elements.
    #[must_use]
    pub const fn full(length: usize) -> Self {
        Self {
            start: 0,
            end: length,
        }
    }

    /// First index in the span.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// One past the last index in the span.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Number of indices in the span.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if the span covers no index.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Checks that the span fits a collection of `length` elements.
    pub(crate) const fn check(self, length: usize) -> CollectionResult<()> {
        if self.end <= length {
            Ok(())
        } else {
            Err(CollectionError::InvalidRange {
                start: self.start,
                count: self.end - self.start,
                length,
            })
        }
    }
}

impl TryFrom<Range<usize>> for Span {
    type Error = CollectionError;

    fn try_from(range: Range<usize>) -> CollectionResult<Self> {
        Self::new(range.start, range.end)
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end
    }
}

// =============================================================================
// Borrowing range iterator
// =============================================================================

/// Lazy in-order walk over `[start, end)` of a tree.
pub(crate) struct RangeIter<'a, T, L> {
    /// Internal nodes above the current leaf with the next child to visit.
    stack: SmallVec<[(&'a InternalNode<L>, usize); 8]>,
    leaf: std::slice::Iter<'a, T>,
    remaining: usize,
}

impl<'a, T, L: Link<T>> RangeIter<'a, T, L> {
    pub(crate) fn new(root: Option<&'a L>, start: usize, end: usize) -> Self {
        let mut iterator = Self {
            stack: SmallVec::new(),
            leaf: Default::default(),
            remaining: end.saturating_sub(start),
        };
        let Some(mut node) = root.filter(|_| iterator.remaining > 0) else {
            iterator.remaining = 0;
            return iterator;
        };
        let mut index = start;
        loop {
            match node.body() {
                NodeBody::Leaf(leaf) => {
                    iterator.leaf = leaf.as_slice()[index..].iter();
                    return iterator;
                }
                NodeBody::Internal(internal) => {
                    let (position, offset) = internal.route(index);
                    iterator.stack.push((internal, position + 1));
                    node = internal.child(position);
                    index = offset;
                }
            }
        }
    }

    /// Moves to the first slot of the next leaf by backtracking through the
    /// parent stack. Returns `false` at the end of the tree.
    fn advance_leaf(&mut self) -> bool {
        while let Some(top) = self.stack.last_mut() {
            let (internal, next) = *top;
            if next < internal.len() {
                top.1 += 1;
                let mut node = internal.child(next);
                loop {
                    match node.body() {
                        NodeBody::Leaf(leaf) => {
                            self.leaf = leaf.as_slice().iter();
                            return true;
                        }
                        NodeBody::Internal(inner) => {
                            self.stack.push((inner, 1));
                            node = inner.child(0);
                        }
                    }
                }
            }
            self.stack.pop();
        }
        false
    }
}

impl<'a, T, L: Link<T>> Iterator for RangeIter<'a, T, L> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 {
            if let Some(element) = self.leaf.next() {
                self.remaining -= 1;
                return Some(element);
            }
            if !self.advance_leaf() {
                self.remaining = 0;
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, L: Link<T>> ExactSizeIterator for RangeIter<'_, T, L> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<T, L: Link<T>> FusedIterator for RangeIter<'_, T, L> {}

/// Borrowing iterator over a range of any tree list.
///
/// Created by the `iter` and `iter_range` methods of [`TreeList`],
/// [`ImmutableTreeList`] and [`ImmutableTreeListBuilder`].
///
/// [`TreeList`]: super::TreeList
/// [`ImmutableTreeList`]: super::ImmutableTreeList
/// [`ImmutableTreeListBuilder`]: super::ImmutableTreeListBuilder
pub struct Iter<'a, T> {
    inner: IterInner<'a, T>,
}

enum IterInner<'a, T> {
    Boxed(RangeIter<'a, T, Box<MutableNode<T>>>),
    Shared(RangeIter<'a, T, ReferenceCounter<SharedNode<T>>>),
}

impl<'a, T> Iter<'a, T> {
    pub(crate) const fn boxed(inner: RangeIter<'a, T, Box<MutableNode<T>>>) -> Self {
        Self {
            inner: IterInner::Boxed(inner),
        }
    }

    pub(crate) const fn shared(inner: RangeIter<'a, T, ReferenceCounter<SharedNode<T>>>) -> Self {
        Self {
            inner: IterInner::Shared(inner),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            IterInner::Boxed(inner) => inner.next(),
            IterInner::Shared(inner) => inner.next(),
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            IterInner::Boxed(inner) => inner.size_hint(),
            IterInner::Shared(inner) => inner.size_hint(),
        }
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> std::fmt::Debug for Iter<'_, T> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Iter")
            .field("remaining", &self.len())
            .finish()
    }
}

// =============================================================================
// Cursor
// =============================================================================

/// Identity of one live, mutable collection.
///
/// Two collections never share an id, even when one is a clone of the other,
/// so a cursor cannot be carried over to a different instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Returns an id no other collection carries.
    #[must_use]
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// The state of a mutable collection as seen by a [`Cursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stamp {
    instance: InstanceId,
    version: u64,
}

impl Stamp {
    /// Pairs an instance with its modification counter.
    #[must_use]
    pub const fn new(instance: InstanceId, version: u64) -> Self {
        Self { instance, version }
    }

    /// The collection this stamp was taken from.
    #[must_use]
    pub const fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Modification counter at the time the stamp was taken.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }
}

/// A collection a [`Cursor`] can walk.
pub trait CursorSource {
    /// Element type yielded by the cursor.
    type Item;

    /// Current identity and modification counter, or `None` for collections
    /// that never change.
    fn stamp(&self) -> Option<Stamp>;

    /// Number of elements in the collection.
    fn item_count(&self) -> usize;

    /// Element at `index`, if any.
    fn item_at(&self, index: usize) -> Option<&Self::Item>;
}

/// A detached, version-checked position within a [`Span`] of a collection.
///
/// Each step borrows the source only for its own duration, so the source can
/// be mutated between steps. The cursor is typed by its source and records
/// the source's [`Stamp`] when it is created. A step against a source whose
/// stamp differs (because it was structurally modified, or because it is a
/// different instance) fails with
/// [`CollectionError::ConcurrentModification`] instead of resuming.
///
/// Between steps a cursor holds no borrow, so it cannot keep a pointer to its
/// current leaf. Every step resolves its index from the root in O(log n).
/// The borrowing iterators walk leaf to leaf in amortized O(1) and are the
/// tool for plain traversal; cursors are for walks interleaved with edits.
///
/// # Examples
///
/// ```rust
/// use canopy::error::CollectionError;
/// use canopy::tree::{Span, TreeList};
///
/// let mut list: TreeList<i32> = (0..10).collect();
/// let mut cursor = list.cursor(Span::new(2, 4).unwrap()).unwrap();
/// assert_eq!(cursor.advance(&list), Ok(Some(&2)));
///
/// list.add(10);
/// assert!(matches!(
///     cursor.advance(&list),
///     Err(CollectionError::ConcurrentModification { .. })
/// ));
/// ```
///
/// A cursor only accepts the collection type it was created from:
///
/// ```rust,compile_fail
/// use canopy::tree::{ImmutableTreeList, Span, TreeList};
///
/// let snapshot: ImmutableTreeList<i32> = (0..4).collect();
/// let live: TreeList<i32> = (0..4).collect();
/// let mut cursor = snapshot.cursor(Span::full(4)).unwrap();
/// let _ = cursor.advance(&live);
/// ```
pub struct Cursor<S: ?Sized> {
    span: Span,
    position: usize,
    stamp: Option<Stamp>,
    source: PhantomData<fn(&S)>,
}

impl<S: CursorSource + ?Sized> Cursor<S> {
    /// Creates a cursor over `span` of `source`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::InvalidRange`] if the span does not fit the
    /// source.
    pub fn new(source: &S, span: Span) -> CollectionResult<Self> {
        span.check(source.item_count())?;
        Ok(Self {
            span,
            position: span.start(),
            stamp: source.stamp(),
            source: PhantomData,
        })
    }

    /// Yields the next element, or `None` at the end of the span.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::ConcurrentModification`] if `source` was
    /// structurally modified since the cursor was created, or is not the
    /// collection the cursor was created on.
    pub fn advance<'a>(&mut self, source: &'a S) -> CollectionResult<Option<&'a S::Item>> {
        self.check_stamp(source)?;
        if self.position >= self.span.end() {
            return Ok(None);
        }
        let element = source
            .item_at(self.position)
            .ok_or(CollectionError::IndexOutOfRange {
                index: self.position,
                length: source.item_count(),
            })?;
        self.position += 1;
        Ok(Some(element))
    }

    /// The element most recently yielded by [`advance`](Self::advance).
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::ConcurrentModification`] under the same
    /// conditions as [`advance`](Self::advance).
    pub fn current<'a>(&self, source: &'a S) -> CollectionResult<Option<&'a S::Item>> {
        self.check_stamp(source)?;
        if self.position == self.span.start() {
            return Ok(None);
        }
        Ok(source.item_at(self.position - 1))
    }

    fn check_stamp(&self, source: &S) -> CollectionResult<()> {
        let actual = source.stamp();
        if actual == self.stamp {
            return Ok(());
        }
        let expected = self.stamp.map_or(0, |stamp| stamp.version());
        let actual = actual.map_or(0, |stamp| stamp.version());
        debug_log!(expected, actual, "cursor source was modified or replaced");
        Err(CollectionError::ConcurrentModification { expected, actual })
    }
}

impl<S: ?Sized> Cursor<S> {
    /// The span this cursor walks.
    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }

    /// Index of the element the next call to [`advance`](Self::advance)
    /// yields.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Number of elements not yet yielded.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.span.end() - self.position
    }

    /// Moves this cursor back to the start of its span. The captured stamp
    /// is kept, so a cursor over a modified source stays invalid.
    pub const fn reset(&mut self) {
        self.position = self.span.start();
    }
}

impl<S: ?Sized> Clone for Cursor<S> {
    fn clone(&self) -> Self {
        Self {
            span: self.span,
            position: self.position,
            stamp: self.stamp,
            source: PhantomData,
        }
    }
}

impl<S: ?Sized> PartialEq for Cursor<S> {
    fn eq(&self, other: &Self) -> bool {
        self.span == other.span && self.position == other.position && self.stamp == other.stamp
    }
}

impl<S: ?Sized> Eq for Cursor<S> {}

impl<S: ?Sized> std::fmt::Debug for Cursor<S> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Cursor")
            .field("span", &self.span)
            .field("position", &self.position)
            .field("stamp", &self.stamp)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::engine::Tree;
    use crate::tree::node::MutableNode;
    use rstest::rstest;

    type BoxedTree = Tree<usize, Box<MutableNode<usize>>>;

    #[rstest]
    #[case(0, 0)]
    #[case(0, 100)]
    #[case(7, 8)]
    #[case(8, 9)]
    #[case(13, 77)]
    #[case(99, 100)]
    fn test_range_iter_matches_slice(#[case] start: usize, #[case] end: usize) {
        let tree = BoxedTree::from_elements(0..100, 4, ());
        let collected: Vec<usize> = tree.iter_range(start, end).copied().collect();
        assert_eq!(collected, (start..end).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_range_iter_over_unpacked_tree() {
        let mut tree = BoxedTree::new(4);
        for element in 0..60 {
            tree.insert(element / 2, element, ()).unwrap();
        }
        let expected: Vec<usize> = (0..tree.len()).map(|index| *tree.get(index).unwrap()).collect();
        let collected: Vec<usize> = tree.iter().copied().collect();
        assert_eq!(collected, expected);
    }

    #[rstest]
    fn test_range_iter_exact_size() {
        let tree = BoxedTree::from_elements(0..20, 4, ());
        let mut iterator = tree.iter_range(3, 10);
        assert_eq!(iterator.len(), 7);
        iterator.next();
        assert_eq!(iterator.len(), 6);
    }

    #[rstest]
    fn test_span_conversions() {
        let span = Span::try_from(3..9).unwrap();
        assert_eq!(span, Span::with_count(3, 6).unwrap());
        assert_eq!(Range::from(span), 3..9);
        assert!(Span::with_count(usize::MAX, 1).is_err());
    }

    #[rstest]
    fn test_instance_ids_are_unique() {
        let first = InstanceId::fresh();
        let second = InstanceId::fresh();
        assert_ne!(first, second);
        assert_ne!(Stamp::new(first, 3), Stamp::new(second, 3));
        assert_eq!(Stamp::new(first, 3).version(), 3);
    }

    #[rstest]
    fn test_span_check() {
        let span = Span::new(2, 6).unwrap();
        assert_eq!(span.check(6), Ok(()));
        assert_eq!(
            span.check(5),
            Err(CollectionError::InvalidRange {
                start: 2,
                count: 4,
                length: 5
            })
        );
    }
}
