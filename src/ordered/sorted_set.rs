//! Persistent set kept in comparer order.

use std::fmt;

use super::comparer::{Comparer, NaturalOrder};
use crate::tree::{ImmutableTreeList, Iter};

/// A persistent set whose elements are kept sorted by a [`Comparer`].
///
/// Elements live in an [`ImmutableTreeList`] in ascending order, so lookup
/// by value is a binary search and lookup by rank is an index.
///
/// # Examples
///
/// ```rust
/// use canopy::ordered::ImmutableSortedTreeSet;
///
/// let set: ImmutableSortedTreeSet<i32> = [5, 1, 3, 1].into_iter().collect();
/// assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![1, 3, 5]);
/// assert_eq!(set.index_of(&3), Some(1));
///
/// let grown = set.add(2);
/// assert_eq!(grown.len(), 4);
/// assert_eq!(set.len(), 3);
/// ```
pub struct ImmutableSortedTreeSet<T, C = NaturalOrder> {
    elements: ImmutableTreeList<T>,
    comparer: C,
}

impl<T, C: Default> ImmutableSortedTreeSet<T, C> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparer(C::default())
    }
}

impl<T, C> ImmutableSortedTreeSet<T, C> {
    /// Creates an empty set ordered by `comparer`.
    #[must_use]
    pub const fn with_comparer(comparer: C) -> Self {
        Self {
            elements: ImmutableTreeList::empty(),
            comparer,
        }
    }

    /// The comparer ordering this set.
    #[must_use]
    pub const fn comparer(&self) -> &C {
        &self.comparer
    }

    /// Returns the number of elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the set contains no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element with rank `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.elements.get(index)
    }

    /// Smallest element.
    #[must_use]
    pub fn min(&self) -> Option<&T> {
        self.elements.first()
    }

    /// Largest element.
    #[must_use]
    pub fn max(&self) -> Option<&T> {
        self.elements.last()
    }

    /// Iterates in ascending order.
    pub fn iter(&self) -> Iter<'_, T> {
        self.elements.iter()
    }

    /// The sorted elements as a list.
    #[must_use]
    pub const fn as_list(&self) -> &ImmutableTreeList<T> {
        &self.elements
    }
}

impl<T, C: Comparer<T>> ImmutableSortedTreeSet<T, C> {
    fn search(&self, value: &T) -> Result<usize, usize> {
        self.elements
            .binary_search_by(|element| self.comparer.compare(element, value))
    }

    /// Returns `true` if an element compares equal to `value`.
    pub fn contains(&self, value: &T) -> bool {
        self.search(value).is_ok()
    }

    /// Rank of the element comparing equal to `value`.
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.search(value).ok()
    }
}

impl<T: Clone, C: Comparer<T> + Clone> ImmutableSortedTreeSet<T, C> {
    /// Returns a set that also contains `value`. Returns this same set if an
    /// equal element is already present.
    #[must_use]
    pub fn add(&self, value: T) -> Self {
        match self.search(&value) {
            Ok(_) => self.clone(),
            Err(index) => self.with_elements(self.elements.insert(index, value)),
        }
    }

    /// Returns a set without the element comparing equal to `value`.
    #[must_use]
    pub fn remove(&self, value: &T) -> Self {
        match self.search(value) {
            Ok(index) => self.with_elements(self.elements.remove_at(index)),
            Err(_) => self.clone(),
        }
    }

    /// Returns an empty set with the same comparer.
    #[must_use]
    pub fn clear(&self) -> Self {
        Self::with_comparer(self.comparer.clone())
    }

    fn with_elements(&self, elements: crate::error::CollectionResult<ImmutableTreeList<T>>) -> Self {
        // Positions come from a search on the same list, so they are in range.
        elements.map_or_else(
            |_| self.clone(),
            |elements| Self {
                elements,
                comparer: self.comparer.clone(),
            },
        )
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<T, C: Clone> Clone for ImmutableSortedTreeSet<T, C> {
    fn clone(&self) -> Self {
        Self {
            elements: self.elements.clone(),
            comparer: self.comparer.clone(),
        }
    }
}

impl<T, C: Default> Default for ImmutableSortedTreeSet<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, C: Comparer<T> + Default> FromIterator<T> for ImmutableSortedTreeSet<T, C> {
    /// Sorts the input once and drops elements comparing equal to an earlier
    /// one.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let comparer = C::default();
        let mut elements: Vec<T> = iter.into_iter().collect();
        elements.sort_by(|left, right| comparer.compare(left, right));
        elements.dedup_by(|right, left| comparer.compare(left, right).is_eq());
        Self {
            elements: elements.into_iter().collect(),
            comparer,
        }
    }
}

impl<'a, T, C> IntoIterator for &'a ImmutableSortedTreeSet<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq, C> PartialEq for ImmutableSortedTreeSet<T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl<T: Eq, C> Eq for ImmutableSortedTreeSet<T, C> {}

impl<T: fmt::Debug, C> fmt::Debug for ImmutableSortedTreeSet<T, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(feature = "serde")]
impl<T: serde::Serialize, C> serde::Serialize for ImmutableSortedTreeSet<T, C> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serde::Serialize::serialize(&self.elements, serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, T, C> serde::Deserialize<'de> for ImmutableSortedTreeSet<T, C>
where
    T: serde::Deserialize<'de> + Clone,
    C: Comparer<T> + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let elements: Vec<T> = serde::Deserialize::deserialize(deserializer)?;
        Ok(elements.into_iter().collect())
    }
}
