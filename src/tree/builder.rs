//! Mutable companion of [`ImmutableTreeList`].
//!
//! A builder starts from a snapshot's root in O(1). Nodes tagged with the
//! builder's owner id are edited in place; every other node is frozen and is
//! copied on the first write that reaches it, so the snapshot the builder
//! came from never observes an edit.
//!
//! Publishing with [`to_immutable`](ImmutableTreeListBuilder::to_immutable)
//! hands the current root to a new snapshot and rotates the owner id. From
//! then on every node reachable from that snapshot is frozen for this
//! builder, without walking the tree.

use std::cmp::Ordering;

use super::engine::Tree;
use super::facade::IndexedList;
use super::immutable::ImmutableTreeList;
use super::iter::{Cursor, CursorSource, InstanceId, Iter, Span, Stamp};
use super::node::{DEFAULT_BRANCHING_FACTOR, OwnerId, SharedNode};
use super::queries::impl_list_queries;
use super::{ReferenceCounter, check_branching_factor};
use crate::error::CollectionResult;
use crate::tracing_helpers::trace_log;

pub(crate) type SharedLink<T> = ReferenceCounter<SharedNode<T>>;

/// Batches edits to a persistent list.
///
/// # Examples
///
/// ```rust
/// use canopy::tree::ImmutableTreeList;
///
/// let snapshot: ImmutableTreeList<i32> = (0..4).collect();
/// let mut first = snapshot.to_builder();
/// let mut second = snapshot.to_builder();
///
/// first.add(4);
/// second.remove_at(0).unwrap();
///
/// assert_eq!(first.to_immutable().to_vec(), vec![0, 1, 2, 3, 4]);
/// assert_eq!(second.to_immutable().to_vec(), vec![1, 2, 3]);
/// assert_eq!(snapshot.to_vec(), vec![0, 1, 2, 3]);
/// ```
pub struct ImmutableTreeListBuilder<T> {
    tree: Tree<T, SharedLink<T>>,
    owner: OwnerId,
    instance: InstanceId,
    version: u64,
    /// Snapshot equal to the current contents, if one was published since the
    /// last change.
    published: Option<ImmutableTreeList<T>>,
}

impl_list_queries!(ImmutableTreeListBuilder, Iter::shared);

impl<T> ImmutableTreeListBuilder<T> {
    /// Creates an empty builder with the default branching factor.
    #[must_use]
    pub fn new() -> Self {
        Self::from_snapshot(ImmutableTreeList::empty())
    }

    /// Creates an empty builder whose nodes hold up to `branching_factor`
    /// entries.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentOutOfRange` if `branching_factor` is below
    /// [`MINIMUM_BRANCHING_FACTOR`](super::MINIMUM_BRANCHING_FACTOR).
    pub fn with_branching_factor(branching_factor: usize) -> CollectionResult<Self> {
        let branching_factor = check_branching_factor(branching_factor)?;
        Ok(Self {
            tree: Tree::new(branching_factor),
            owner: OwnerId::fresh(),
            instance: InstanceId::fresh(),
            version: 0,
            published: None,
        })
    }

    pub(crate) fn from_snapshot(snapshot: ImmutableTreeList<T>) -> Self {
        Self {
            tree: snapshot.tree().clone(),
            owner: OwnerId::fresh(),
            instance: InstanceId::fresh(),
            version: 0,
            published: Some(snapshot),
        }
    }

    /// Modification counter observed by cursors.
    #[inline]
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Records a structural change.
    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
        self.published = None;
    }

    /// Creates a cursor over `span`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if `span` does not fit the builder.
    pub fn cursor(&self, span: Span) -> CollectionResult<Cursor<Self>> {
        Cursor::new(self, span)
    }
}

impl<T: Clone> ImmutableTreeListBuilder<T> {
    /// Publishes the current contents as an immutable snapshot.
    ///
    /// Calling this again without an intervening change returns the same
    /// snapshot (see [`ImmutableTreeList::ptr_eq`]).
    ///
    /// # Complexity
    ///
    /// O(1)
    pub fn to_immutable(&mut self) -> ImmutableTreeList<T> {
        if let Some(published) = &self.published {
            return published.clone();
        }
        let snapshot = ImmutableTreeList::from_tree(self.tree.clone());
        self.owner = OwnerId::fresh();
        trace_log!(length = self.tree.len(), "published snapshot");
        self.published = Some(snapshot.clone());
        snapshot
    }

    /// Returns a mutable reference to the element at `index`, copying any
    /// frozen node on the path.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.tree.len() {
            return None;
        }
        self.published = None;
        self.tree.get_mut(index, self.owner)
    }

    /// Replaces the element at `index` and returns the previous one.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `index >= len()`.
    pub fn set(&mut self, index: usize, value: T) -> CollectionResult<T> {
        let previous = self.tree.set(index, value, self.owner)?;
        self.published = None;
        Ok(previous)
    }

    /// Appends `value`.
    pub fn add(&mut self, value: T) {
        let length = self.tree.len();
        if self.tree.insert(length, value, self.owner).is_ok() {
            self.touch();
        }
    }

    /// Inserts `value` so that it ends up at `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `index > len()`.
    pub fn insert(&mut self, index: usize, value: T) -> CollectionResult<()> {
        self.tree.insert(index, value, self.owner)?;
        self.touch();
        Ok(())
    }

    /// Appends every element of `values`.
    pub fn add_range<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = T>,
    {
        for value in values {
            self.add(value);
        }
    }

    /// Inserts every element of `values` starting at `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `index > len()`.
    pub fn insert_range<I>(&mut self, index: usize, values: I) -> CollectionResult<()>
    where
        I: IntoIterator<Item = T>,
    {
        if self.tree.insert_range(index, values, self.owner)? > 0 {
            self.touch();
        }
        Ok(())
    }

    /// Removes and returns the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `index >= len()`.
    pub fn remove_at(&mut self, index: usize) -> CollectionResult<T> {
        let element = self.tree.remove_at(index, self.owner)?;
        self.touch();
        Ok(element)
    }

    /// Removes `count` elements starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if the range does not fit the builder.
    pub fn remove_range(&mut self, start: usize, count: usize) -> CollectionResult<()> {
        self.tree.remove_range(start, count, self.owner)?;
        if count > 0 {
            self.touch();
        }
        Ok(())
    }

    /// Removes the first element equal to `value`.
    pub fn remove(&mut self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.index_of(value)
            .is_some_and(|index| self.remove_at(index).is_ok())
    }

    /// Removes every element matching `predicate` and returns how many were
    /// removed.
    pub fn remove_all<P>(&mut self, mut predicate: P) -> usize
    where
        P: FnMut(&T) -> bool,
    {
        let removed = self.iter().filter(|element| predicate(element)).count();
        if removed == 0 {
            return 0;
        }
        let mut elements = self.tree.take_elements();
        elements.retain(|element| !predicate(element));
        self.tree.rebuild(elements, self.owner);
        self.touch();
        removed
    }

    /// Replaces the first element equal to `old` with `new`.
    pub fn replace(&mut self, old: &T, new: T) -> bool
    where
        T: PartialEq,
    {
        match self.index_of(old) {
            Some(index) => self.set(index, new).is_ok(),
            None => false,
        }
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.tree.clear();
        self.touch();
    }

    /// Sorts the contents in ascending order.
    pub fn sort(&mut self)
    where
        T: Ord,
    {
        self.sort_by(Ord::cmp);
    }

    /// Sorts the contents with a comparator. The sort is stable.
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut elements = self.tree.take_elements();
        elements.sort_by(compare);
        self.tree.rebuild(elements, self.owner);
        self.touch();
    }

    /// Sorts the contents by a key extracted from each element.
    pub fn sort_by_key<K, F>(&mut self, mut extract: F)
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        self.sort_by(|left, right| extract(left).cmp(&extract(right)));
    }

    /// Sorts the elements in `span` with a comparator.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if `span` does not fit the builder.
    pub fn sort_range_by<F>(&mut self, span: Span, compare: F) -> CollectionResult<()>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        span.check(self.tree.len())?;
        let mut elements = self.tree.take_elements();
        elements[span.start()..span.end()].sort_by(compare);
        self.tree.rebuild(elements, self.owner);
        self.touch();
        Ok(())
    }

    /// Reverses the order of the elements.
    pub fn reverse(&mut self) {
        let mut elements = self.tree.take_elements();
        elements.reverse();
        self.tree.rebuild(elements, self.owner);
        self.touch();
    }

    /// Reverses the order of the elements in `span`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if `span` does not fit the builder.
    pub fn reverse_range(&mut self, span: Span) -> CollectionResult<()> {
        span.check(self.tree.len())?;
        let mut elements = self.tree.take_elements();
        elements[span.start()..span.end()].reverse();
        self.tree.rebuild(elements, self.owner);
        self.touch();
        Ok(())
    }

    /// Maps every element into a new builder with the same branching factor.
    pub fn convert_all<U, F>(&self, mut convert: F) -> ImmutableTreeListBuilder<U>
    where
        U: Clone,
        F: FnMut(&T) -> U,
    {
        ImmutableTreeListBuilder::from_elements(
            self.iter().map(|element| convert(element)),
            self.tree.branching_factor(),
        )
    }

    /// Clones the elements in `span` into a new builder.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if `span` does not fit the builder.
    pub fn get_range(&self, span: Span) -> CollectionResult<Self> {
        let elements = self.iter_range(span)?.cloned();
        Ok(Self::from_elements(elements, self.tree.branching_factor()))
    }

    /// Clones every element matching `predicate` into a new builder.
    pub fn find_all<P>(&self, mut predicate: P) -> Self
    where
        P: FnMut(&T) -> bool,
    {
        let elements = self.iter().filter(|element| predicate(element)).cloned();
        Self::from_elements(elements, self.tree.branching_factor())
    }

    fn from_elements<I>(elements: I, branching_factor: usize) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let owner = OwnerId::fresh();
        Self {
            tree: Tree::from_elements(elements, branching_factor, owner),
            owner,
            instance: InstanceId::fresh(),
            version: 0,
            published: None,
        }
    }

    /// Restores the packing invariant.
    ///
    /// Repacking copies frozen nodes, so the next snapshot is a different
    /// instance even though it holds the same sequence.
    pub fn trim_excess(&mut self) {
        if self.tree.repack(self.owner) {
            self.touch();
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<T> Default for ImmutableTreeListBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ImmutableTreeListBuilder<T> {
    /// The clone shares every node but gets its own owner id, so neither
    /// builder can edit a node the other still sees. It is also a separate
    /// cursor source.
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
            owner: OwnerId::fresh(),
            instance: InstanceId::fresh(),
            version: self.version,
            published: self.published.clone(),
        }
    }
}

impl<T: Clone> FromIterator<T> for ImmutableTreeListBuilder<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_elements(iter, DEFAULT_BRANCHING_FACTOR)
    }
}

impl<T: Clone> Extend<T> for ImmutableTreeListBuilder<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.add_range(iter);
    }
}

impl<T: Clone> IntoIterator for ImmutableTreeListBuilder<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(mut self) -> Self::IntoIter {
        self.published = None;
        self.tree.take_elements().into_iter()
    }
}

impl<T> CursorSource for ImmutableTreeListBuilder<T> {
    type Item = T;

    fn stamp(&self) -> Option<Stamp> {
        Some(Stamp::new(self.instance, self.version))
    }

    fn item_count(&self) -> usize {
        self.tree.len()
    }

    fn item_at(&self, index: usize) -> Option<&T> {
        self.tree.get(index)
    }
}

impl<T: Clone> IndexedList<T> for ImmutableTreeListBuilder<T> {
    fn count(&self) -> usize {
        self.tree.len()
    }

    fn item(&self, index: usize) -> CollectionResult<&T> {
        self.try_get(index)
    }

    fn is_read_only(&self) -> bool {
        false
    }

    fn set_item(&mut self, index: usize, value: T) -> CollectionResult<()> {
        self.set(index, value).map(drop)
    }

    fn insert_item(&mut self, index: usize, value: T) -> CollectionResult<()> {
        self.insert(index, value)
    }

    fn remove_item_at(&mut self, index: usize) -> CollectionResult<()> {
        self.remove_at(index).map(drop)
    }

    fn clear_items(&mut self) -> CollectionResult<()> {
        self.clear();
        Ok(())
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for ImmutableTreeListBuilder<T>
where
    T: serde::Deserialize<'de> + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(super::queries::SequenceVisitor::new())
    }
}

// =============================================================================
// Tests
// =============================================================================
