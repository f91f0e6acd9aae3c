//! Persistent dictionary ordered by key hash code.

use std::fmt;
use std::hash::{BuildHasher, Hash};

use super::comparer::{DefaultHashBuilder, hash_of};
use super::find_in_run;
use crate::error::{CollectionError, CollectionResult};
use crate::tree::ImmutableTreeList;

#[derive(Clone, PartialEq, Eq)]
struct Entry<K, V> {
    hash: u64,
    key: K,
    value: V,
}

/// A persistent dictionary whose entries are sorted by key hash code.
///
/// Entries whose keys share a hash code form one contiguous run, and every
/// lookup compares the key against the whole run.
///
/// # Examples
///
/// ```rust
/// use canopy::error::CollectionError;
/// use canopy::ordered::ImmutableHashTreeDictionary;
///
/// let dictionary = ImmutableHashTreeDictionary::<&str, i32>::new()
///     .add("one", 1)
///     .unwrap();
/// assert_eq!(dictionary.get(&"one"), Some(&1));
/// assert_eq!(dictionary.add("one", 2).err(), Some(CollectionError::DuplicateKey));
/// ```
pub struct ImmutableHashTreeDictionary<K, V, S = DefaultHashBuilder> {
    entries: ImmutableTreeList<Entry<K, V>>,
    hash_builder: S,
}

impl<K, V, S: Default> ImmutableHashTreeDictionary<K, V, S> {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> ImmutableHashTreeDictionary<K, V, S> {
    /// Creates an empty dictionary hashing keys with `hash_builder`.
    #[must_use]
    pub const fn with_hasher(hash_builder: S) -> Self {
        Self {
            entries: ImmutableTreeList::empty(),
            hash_builder,
        }
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

    /// Iterates over the entries in hash order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&K, &V)> {
        self.entries.iter().map(|entry| (&entry.key, &entry.value))
    }

    /// Iterates over the keys in hash order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &K> {
        self.entries.iter().map(|entry| &entry.key)
    }

    /// Iterates over the values in key hash order.
    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> {
        self.entries.iter().map(|entry| &entry.value)
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> ImmutableHashTreeDictionary<K, V, S> {
    fn locate(&self, key: &K) -> (u64, Result<usize, usize>) {
        let hash = hash_of(&self.hash_builder, key);
        let position = find_in_run(&self.entries, hash, |entry| entry.hash, |entry| &entry.key == key);
        (hash, position)
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        let index = self.locate(key).1.ok()?;
        self.entries.get(index).map(|entry| &entry.value)
    }

    /// Returns `true` if an entry exists for `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.locate(key).1.is_ok()
    }
}

impl<K, V, S> ImmutableHashTreeDictionary<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    /// Returns a dictionary with the new entry.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::DuplicateKey`] if `key` is already present.
    pub fn add(&self, key: K, value: V) -> CollectionResult<Self> {
        match self.locate(&key) {
            (_, Ok(_)) => Err(CollectionError::DuplicateKey),
            (hash, Err(index)) => {
                let entries = self.entries.insert(index, Entry { hash, key, value })?;
                Ok(self.with_entries(entries))
            }
        }
    }

    /// Returns a dictionary where `key` maps to `value`.
    #[must_use]
    pub fn set_item(&self, key: K, value: V) -> Self {
        let entries = match self.locate(&key) {
            (hash, Ok(index)) => self.entries.set(index, Entry { hash, key, value }),
            (hash, Err(index)) => self.entries.insert(index, Entry { hash, key, value }),
        };
        entries.map_or_else(|_| self.clone(), |entries| self.with_entries(entries))
    }

    /// Returns a dictionary without the entry for `key`.
    #[must_use]
    pub fn remove(&self, key: &K) -> Self {
        match self.locate(key) {
            (_, Ok(index)) => self
                .entries
                .remove_at(index)
                .map_or_else(|_| self.clone(), |entries| self.with_entries(entries)),
            (_, Err(_)) => self.clone(),
        }
    }

    /// Returns an empty dictionary with the same hash builder.
    #[must_use]
    pub fn clear(&self) -> Self {
        Self::with_hasher(self.hash_builder.clone())
    }

    fn with_entries(&self, entries: ImmutableTreeList<Entry<K, V>>) -> Self {
        Self {
            entries,
            hash_builder: self.hash_builder.clone(),
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<K, V, S: Clone> Clone for ImmutableHashTreeDictionary<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<K, V, S: Default> Default for ImmutableHashTreeDictionary<K, V, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> FromIterator<(K, V)> for ImmutableHashTreeDictionary<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Default,
{
    /// Later entries replace earlier ones with an equal key.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let hash_builder = S::default();
        let mut hashed: Vec<Entry<K, V>> = iter
            .into_iter()
            .map(|(key, value)| Entry {
                hash: hash_of(&hash_builder, &key),
                key,
                value,
            })
            .collect();
        hashed.sort_by_key(|entry| entry.hash);

        let mut unique: Vec<Entry<K, V>> = Vec::with_capacity(hashed.len());
        let mut run_start = 0;
        for entry in hashed {
            if unique.last().is_none_or(|last| last.hash != entry.hash) {
                run_start = unique.len();
            }
            match unique[run_start..]
                .iter_mut()
                .find(|existing| existing.key == entry.key)
            {
                Some(existing) => existing.value = entry.value,
                None => unique.push(entry),
            }
        }
        Self {
            entries: unique.into_iter().collect(),
            hash_builder,
        }
    }
}

impl<K: Hash + Eq, V: PartialEq, S: BuildHasher> PartialEq for ImmutableHashTreeDictionary<K, V, S> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K: Hash + Eq, V: Eq, S: BuildHasher> Eq for ImmutableHashTreeDictionary<K, V, S> {}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for ImmutableHashTreeDictionary<K, V, S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(feature = "serde")]
impl<K: serde::Serialize, V: serde::Serialize, S> serde::Serialize
    for ImmutableHashTreeDictionary<K, V, S>
{
    fn serialize<Z>(&self, serializer: Z) -> Result<Z::Ok, Z::Error>
    where
        Z: serde::Serializer,
    {
        serializer.collect_map(self.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, S> serde::Deserialize<'de> for ImmutableHashTreeDictionary<K, V, S>
where
    K: serde::Deserialize<'de> + Hash + Eq + Clone,
    V: serde::Deserialize<'de> + Clone,
    S: BuildHasher + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(super::EntryVisitor::new())
    }
}
