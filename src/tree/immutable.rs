//! Persistent indexed list with structural sharing.
//!
//! Every update returns a new [`ImmutableTreeList`] and leaves the receiver
//! untouched. Only the nodes on the path from the root to the edited slot are
//! copied; the rest of the tree is shared between the old and the new list.
//!
//! Lists that end up empty are always the canonical empty list: they hold no
//! root, so any two empty lists are [`ptr_eq`](ImmutableTreeList::ptr_eq).
//!
//! # Examples
//!
//! ```rust
//! use canopy::tree::ImmutableTreeList;
//!
//! let original: ImmutableTreeList<i32> = [1, 5, 4].into_iter().collect();
//! let inserted = original.insert(1, 9).unwrap();
//!
//! assert_eq!(inserted.to_vec(), vec![1, 9, 5, 4]);
//! assert_eq!(original.to_vec(), vec![1, 5, 4]);
//!
//! let emptied = original.clear();
//! assert!(emptied.ptr_eq(&ImmutableTreeList::empty()));
//! ```

use std::cmp::Ordering;

use super::builder::{ImmutableTreeListBuilder, SharedLink};
use super::engine::Tree;
use super::facade::IndexedList;
use super::iter::{Cursor, CursorSource, Iter, Span, Stamp};
use super::node::{DEFAULT_BRANCHING_FACTOR, OwnerId};
use super::queries::impl_list_queries;
use super::{ReferenceCounter, check_branching_factor};
use crate::error::{CollectionError, CollectionResult};

/// A persistent list with O(log n) indexed access and updates.
///
/// Cloning is O(1). With the `arc` feature the list is `Send + Sync` for
/// `T: Send + Sync` and snapshots can be read from many threads at once.
///
/// # Complexity
///
/// | Operation | Cost |
/// |-----------|------|
/// | `get` | O(log n) |
/// | `set`, `insert`, `remove_at`, `add` | O(log n) copied nodes |
/// | `clone`, `to_builder` | O(1) |
pub struct ImmutableTreeList<T> {
    tree: Tree<T, SharedLink<T>>,
}

impl_list_queries!(ImmutableTreeList, Iter::shared);

impl<T> ImmutableTreeList<T> {
    /// The canonical empty list.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            tree: Tree::new(DEFAULT_BRANCHING_FACTOR),
        }
    }

    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self::empty()
    }

    /// Creates an empty list whose nodes hold up to `branching_factor`
    /// entries.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentOutOfRange` if `branching_factor` is below
    /// [`MINIMUM_BRANCHING_FACTOR`](super::MINIMUM_BRANCHING_FACTOR).
    pub const fn with_branching_factor(branching_factor: usize) -> CollectionResult<Self> {
        match check_branching_factor(branching_factor) {
            Ok(branching_factor) => Ok(Self {
                tree: Tree::new(branching_factor),
            }),
            Err(error) => Err(error),
        }
    }

    pub(crate) const fn from_tree(tree: Tree<T, SharedLink<T>>) -> Self {
        Self { tree }
    }

    pub(crate) const fn tree(&self) -> &Tree<T, SharedLink<T>> {
        &self.tree
    }

    /// Returns `true` if both lists are the same snapshot: they share their
    /// root node, or both are empty.
    ///
    /// Empty lists have no nodes, so any two of them are the same snapshot
    /// even when their branching factors differ. The branching factor only
    /// shapes nodes created by later edits.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self.tree.root(), other.tree.root()) {
            (None, None) => true,
            (Some(left), Some(right)) => ReferenceCounter::ptr_eq(left, right),
            _ => false,
        }
    }

    /// Starts a builder over this list in O(1).
    #[must_use]
    pub fn to_builder(&self) -> ImmutableTreeListBuilder<T> {
        ImmutableTreeListBuilder::from_snapshot(self.clone())
    }

    /// Creates a cursor over `span`. Cursors over an immutable list never
    /// become invalid.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if `span` does not fit the list.
    pub fn cursor(&self, span: Span) -> CollectionResult<Cursor<Self>> {
        Cursor::new(self, span)
    }

    /// Returns an empty list that keeps this list's branching factor. It is
    /// [`ptr_eq`](Self::ptr_eq) to [`empty`](Self::empty).
    #[must_use]
    pub const fn clear(&self) -> Self {
        Self {
            tree: Tree::new(self.tree.branching_factor()),
        }
    }
}

impl<T: Clone> ImmutableTreeList<T> {
    /// Applies `edit` to a builder over this list and publishes the result.
    fn edit<R>(
        &self,
        edit: impl FnOnce(&mut ImmutableTreeListBuilder<T>) -> CollectionResult<R>,
    ) -> CollectionResult<Self> {
        let mut builder = self.to_builder();
        edit(&mut builder)?;
        Ok(builder.to_immutable())
    }

    /// Returns a copy with `value` at `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `index >= len()`.
    pub fn set(&self, index: usize, value: T) -> CollectionResult<Self> {
        self.edit(|builder| builder.set(index, value))
    }

    /// Returns a copy with `value` appended.
    #[must_use]
    pub fn add(&self, value: T) -> Self {
        let mut builder = self.to_builder();
        builder.add(value);
        builder.to_immutable()
    }

    /// Returns a copy with `value` inserted at `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `index > len()`.
    pub fn insert(&self, index: usize, value: T) -> CollectionResult<Self> {
        self.edit(|builder| builder.insert(index, value))
    }

    /// Returns a copy with every element of `values` appended.
    #[must_use]
    pub fn add_range<I>(&self, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut builder = self.to_builder();
        builder.add_range(values);
        builder.to_immutable()
    }

    /// Returns a copy with `values` inserted starting at `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `index > len()`.
    pub fn insert_range<I>(&self, index: usize, values: I) -> CollectionResult<Self>
    where
        I: IntoIterator<Item = T>,
    {
        self.edit(|builder| builder.insert_range(index, values))
    }

    /// Returns a copy without the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `index >= len()`.
    pub fn remove_at(&self, index: usize) -> CollectionResult<Self> {
        self.edit(|builder| builder.remove_at(index))
    }

    /// Returns a copy without `count` elements starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if the range does not fit the list.
    pub fn remove_range(&self, start: usize, count: usize) -> CollectionResult<Self> {
        self.edit(|builder| builder.remove_range(start, count))
    }

    /// Returns a copy without the first element equal to `value`, or this
    /// same snapshot if there is none.
    #[must_use]
    pub fn remove(&self, value: &T) -> Self
    where
        T: PartialEq,
    {
        let mut builder = self.to_builder();
        builder.remove(value);
        builder.to_immutable()
    }

    /// Returns a copy without the elements matching `predicate`.
    #[must_use]
    pub fn remove_all<P>(&self, predicate: P) -> Self
    where
        P: FnMut(&T) -> bool,
    {
        let mut builder = self.to_builder();
        builder.remove_all(predicate);
        builder.to_immutable()
    }

    /// Returns a copy with the first element equal to `old` replaced by
    /// `new`.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentOutOfRange` if no element equals `old`.
    pub fn replace(&self, old: &T, new: T) -> CollectionResult<Self>
    where
        T: PartialEq,
    {
        let index = self
            .index_of(old)
            .ok_or(CollectionError::ArgumentOutOfRange {
                parameter: "old",
                value: self.len(),
            })?;
        self.set(index, new)
    }

    /// Returns a sorted copy.
    #[must_use]
    pub fn sort(&self) -> Self
    where
        T: Ord,
    {
        self.sort_by(Ord::cmp)
    }

    /// Returns a copy sorted with a comparator. The sort is stable.
    #[must_use]
    pub fn sort_by<F>(&self, compare: F) -> Self
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut builder = self.to_builder();
        builder.sort_by(compare);
        builder.to_immutable()
    }

    /// Returns a copy sorted by a key extracted from each element.
    #[must_use]
    pub fn sort_by_key<K, F>(&self, extract: F) -> Self
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        let mut builder = self.to_builder();
        builder.sort_by_key(extract);
        builder.to_immutable()
    }

    /// Returns a copy with the elements in `span` sorted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if `span` does not fit the list.
    pub fn sort_range_by<F>(&self, span: Span, compare: F) -> CollectionResult<Self>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.edit(|builder| builder.sort_range_by(span, compare))
    }

    /// Returns a reversed copy.
    #[must_use]
    pub fn reverse(&self) -> Self {
        let mut builder = self.to_builder();
        builder.reverse();
        builder.to_immutable()
    }

    /// Returns a copy with the elements in `span` reversed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if `span` does not fit the list.
    pub fn reverse_range(&self, span: Span) -> CollectionResult<Self> {
        self.edit(|builder| builder.reverse_range(span))
    }

    /// Returns a packed copy, or this same snapshot if it is already packed.
    #[must_use]
    pub fn trim_excess(&self) -> Self {
        let mut builder = self.to_builder();
        builder.trim_excess();
        builder.to_immutable()
    }

    /// Maps every element into a new list with the same branching factor.
    pub fn convert_all<U, F>(&self, mut convert: F) -> ImmutableTreeList<U>
    where
        U: Clone,
        F: FnMut(&T) -> U,
    {
        ImmutableTreeList::from_tree(Tree::from_elements(
            self.iter().map(|element| convert(element)),
            self.tree.branching_factor(),
            OwnerId::FROZEN,
        ))
    }

    /// Returns the elements in `span` as a new list.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if `span` does not fit the list.
    pub fn get_range(&self, span: Span) -> CollectionResult<Self> {
        if span.start() == 0 && span.end() == self.len() {
            return Ok(self.clone());
        }
        let elements = self.iter_range(span)?.cloned();
        Ok(Self::from_tree(Tree::from_elements(
            elements,
            self.tree.branching_factor(),
            OwnerId::FROZEN,
        )))
    }

    /// Returns the elements matching `predicate` as a new list.
    #[must_use]
    pub fn find_all<P>(&self, mut predicate: P) -> Self
    where
        P: FnMut(&T) -> bool,
    {
        let elements = self.iter().filter(|element| predicate(element)).cloned();
        Self::from_tree(Tree::from_elements(
            elements,
            self.tree.branching_factor(),
            OwnerId::FROZEN,
        ))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<T> Clone for ImmutableTreeList<T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<T> Default for ImmutableTreeList<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Clone> FromIterator<T> for ImmutableTreeList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_tree(Tree::from_elements(
            iter,
            DEFAULT_BRANCHING_FACTOR,
            OwnerId::FROZEN,
        ))
    }
}

impl<T: Clone> IntoIterator for ImmutableTreeList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    /// Moves elements out of nodes this list holds alone and clones the rest.
    fn into_iter(mut self) -> Self::IntoIter {
        self.tree.take_elements().into_iter()
    }
}

impl<T: Clone> From<Vec<T>> for ImmutableTreeList<T> {
    fn from(elements: Vec<T>) -> Self {
        elements.into_iter().collect()
    }
}

impl<T> CursorSource for ImmutableTreeList<T> {
    type Item = T;

    fn stamp(&self) -> Option<Stamp> {
        None
    }

    fn item_count(&self) -> usize {
        self.tree.len()
    }

    fn item_at(&self, index: usize) -> Option<&T> {
        self.tree.get(index)
    }
}

impl<T> IndexedList<T> for ImmutableTreeList<T> {
    fn count(&self) -> usize {
        self.tree.len()
    }

    fn item(&self, index: usize) -> CollectionResult<&T> {
        self.try_get(index)
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn set_item(&mut self, _index: usize, _value: T) -> CollectionResult<()> {
        Err(CollectionError::NotSupported { operation: "set" })
    }

    fn insert_item(&mut self, _index: usize, _value: T) -> CollectionResult<()> {
        Err(CollectionError::NotSupported {
            operation: "insert",
        })
    }

    fn remove_item_at(&mut self, _index: usize) -> CollectionResult<()> {
        Err(CollectionError::NotSupported {
            operation: "remove",
        })
    }

    fn clear_items(&mut self) -> CollectionResult<()> {
        Err(CollectionError::NotSupported { operation: "clear" })
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for ImmutableTreeList<T>
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


// =============================================================================
// Thread Safety
// =============================================================================


#[cfg(all(test, not(feature = "arc")))]
mod not_send_tests {
    use super::*;
    use static_assertions::assert_not_impl_any;

    assert_not_impl_any!(ImmutableTreeList<i32>: Send, Sync);
}
