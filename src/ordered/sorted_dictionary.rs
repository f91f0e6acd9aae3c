//! Persistent dictionary kept in key order.

use std::fmt;

use super::comparer::{Comparer, NaturalOrder};
use crate::error::{CollectionError, CollectionResult};
use crate::tree::ImmutableTreeList;

/// A persistent dictionary whose entries are kept sorted by key.
///
/// # Examples
///
/// ```rust
/// use canopy::ordered::ImmutableSortedTreeDictionary;
///
/// let dictionary: ImmutableSortedTreeDictionary<&str, i32> =
///     [("b", 2), ("a", 1), ("c", 3)].into_iter().collect();
/// assert_eq!(dictionary.keys().copied().collect::<Vec<_>>(), vec!["a", "b", "c"]);
/// assert_eq!(dictionary.get(&"b"), Some(&2));
///
/// assert!(dictionary.add("a", 10).is_err());
/// let updated = dictionary.set_item("a", 10);
/// assert_eq!(updated.get(&"a"), Some(&10));
/// assert_eq!(dictionary.get(&"a"), Some(&1));
/// ```
pub struct ImmutableSortedTreeDictionary<K, V, C = NaturalOrder> {
    entries: ImmutableTreeList<(K, V)>,
    comparer: C,
}

impl<K, V, C: Default> ImmutableSortedTreeDictionary<K, V, C> {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparer(C::default())
    }
}

impl<K, V, C> ImmutableSortedTreeDictionary<K, V, C> {
    /// Creates an empty dictionary ordered by `comparer`.
    #[must_use]
    pub const fn with_comparer(comparer: C) -> Self {
        Self {
            entries: ImmutableTreeList::empty(),
            comparer,
        }
    }

    /// The comparer ordering the keys.
    #[must_use]
    pub const fn comparer(&self) -> &C {
        &self.comparer
    }

    /// Returns the number of entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the dictionary has no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in key order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&K, &V)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    /// Iterates over the keys in order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &K> {
        self.entries.iter().map(|(key, _)| key)
    }

    /// Iterates over the values in key order.
    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }

    /// Entry with rank `index`.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.entries.get(index).map(|(key, value)| (key, value))
    }
}

impl<K, V, C: Comparer<K>> ImmutableSortedTreeDictionary<K, V, C> {
    fn search(&self, key: &K) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|(entry_key, _)| self.comparer.compare(entry_key, key))
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        let index = self.search(key).ok()?;
        self.entries.get(index).map(|(_, value)| value)
    }

    /// Returns `true` if an entry exists for `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.search(key).is_ok()
    }

    /// Rank of `key` among the keys.
    pub fn index_of_key(&self, key: &K) -> Option<usize> {
        self.search(key).ok()
    }
}

impl<K: Clone, V: Clone, C: Comparer<K> + Clone> ImmutableSortedTreeDictionary<K, V, C> {
    /// Returns a dictionary with the new entry.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::DuplicateKey`] if `key` is already present.
    pub fn add(&self, key: K, value: V) -> CollectionResult<Self> {
        match self.search(&key) {
            Ok(_) => Err(CollectionError::DuplicateKey),
            Err(index) => Ok(self.with_entries(self.entries.insert(index, (key, value))?)),
        }
    }

    /// Returns a dictionary where `key` maps to `value`, adding the entry or
    /// replacing the existing value.
    #[must_use]
    pub fn set_item(&self, key: K, value: V) -> Self {
        let entries = match self.search(&key) {
            Ok(index) => self.entries.set(index, (key, value)),
            Err(index) => self.entries.insert(index, (key, value)),
        };
        entries.map_or_else(|_| self.clone(), |entries| self.with_entries(entries))
    }

    /// Returns a dictionary without the entry for `key`.
    #[must_use]
    pub fn remove(&self, key: &K) -> Self {
        match self.search(key) {
            Ok(index) => self
                .entries
                .remove_at(index)
                .map_or_else(|_| self.clone(), |entries| self.with_entries(entries)),
            Err(_) => self.clone(),
        }
    }

    /// Returns an empty dictionary with the same comparer.
    #[must_use]
    pub fn clear(&self) -> Self {
        Self::with_comparer(self.comparer.clone())
    }

    fn with_entries(&self, entries: ImmutableTreeList<(K, V)>) -> Self {
        Self {
            entries,
            comparer: self.comparer.clone(),
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<K, V, C: Clone> Clone for ImmutableSortedTreeDictionary<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            comparer: self.comparer.clone(),
        }
    }
}

impl<K, V, C: Default> Default for ImmutableSortedTreeDictionary<K, V, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> FromIterator<(K, V)> for ImmutableSortedTreeDictionary<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparer<K> + Default,
{
    /// Later entries replace earlier ones with an equal key.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let comparer = C::default();
        let mut entries: Vec<(K, V)> = iter.into_iter().collect();
        entries.sort_by(|(left, _), (right, _)| comparer.compare(left, right));
        let mut unique: Vec<(K, V)> = Vec::with_capacity(entries.len());
        for entry in entries {
            match unique.last_mut() {
                Some(last) if comparer.compare(&last.0, &entry.0).is_eq() => *last = entry,
                _ => unique.push(entry),
            }
        }
        Self {
            entries: unique.into_iter().collect(),
            comparer,
        }
    }
}

impl<K: PartialEq, V: PartialEq, C> PartialEq for ImmutableSortedTreeDictionary<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Eq, V: Eq, C> Eq for ImmutableSortedTreeDictionary<K, V, C> {}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for ImmutableSortedTreeDictionary<K, V, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(feature = "serde")]
impl<K: serde::Serialize, V: serde::Serialize, C> serde::Serialize
    for ImmutableSortedTreeDictionary<K, V, C>
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, C> serde::Deserialize<'de> for ImmutableSortedTreeDictionary<K, V, C>
where
    K: serde::Deserialize<'de> + Clone,
    V: serde::Deserialize<'de> + Clone,
    C: Comparer<K> + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(super::EntryVisitor::new())
    }
}
