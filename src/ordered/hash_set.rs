//! Persistent set ordered by hash code.

use std::fmt;
use std::hash::{BuildHasher, Hash};

use super::comparer::{DefaultHashBuilder, hash_of};
use super::find_in_run;
use crate::tree::ImmutableTreeList;

/// A persistent set whose entries are sorted by hash code.
///
/// Elements with the same hash code sit next to each other in one run.
/// Lookup binary-searches for the start of the run and then compares every
/// element of the run for equality, so colliding elements are always found.
/// Iteration order follows the hash codes and is unrelated to insertion
/// order.
///
/// # Examples
///
/// ```rust
/// use canopy::ordered::ImmutableHashTreeSet;
///
/// let set: ImmutableHashTreeSet<&str> = ["a", "b", "a"].into_iter().collect();
/// assert_eq!(set.len(), 2);
/// assert!(set.contains(&"a"));
///
/// let smaller = set.remove(&"a");
/// assert!(!smaller.contains(&"a"));
/// assert!(set.contains(&"a"));
/// ```
pub struct ImmutableHashTreeSet<T, S = DefaultHashBuilder> {
    entries: ImmutableTreeList<(u64, T)>,
    hash_builder: S,
}

impl<T, S: Default> ImmutableHashTreeSet<T, S> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<T, S> ImmutableHashTreeSet<T, S> {
    /// Creates an empty set hashing with `hash_builder`.
    #[must_use]
    pub const fn with_hasher(hash_builder: S) -> Self {
        Self {
            entries: ImmutableTreeList::empty(),
            hash_builder,
        }
    }

    /// The hash builder of this set.
    #[must_use]
    pub const fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns the number of elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the set contains no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the elements in hash order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &T> {
        self.entries.iter().map(|(_, element)| element)
    }
}

impl<T: Hash + Eq, S: BuildHasher> ImmutableHashTreeSet<T, S> {
    fn locate(&self, value: &T) -> (u64, Result<usize, usize>) {
        let hash = hash_of(&self.hash_builder, value);
        let position = find_in_run(&self.entries, hash, |(entry_hash, _)| *entry_hash, |(_, element)| {
            element == value
        });
        (hash, position)
    }

    /// Returns `true` if the set contains `value`.
    pub fn contains(&self, value: &T) -> bool {
        self.locate(value).1.is_ok()
    }
}

impl<T: Hash + Eq + Clone, S: BuildHasher + Clone> ImmutableHashTreeSet<T, S> {
    /// Returns a set that also contains `value`, or this same set if it is
    /// already present.
    #[must_use]
    pub fn add(&self, value: T) -> Self {
        match self.locate(&value) {
            (_, Ok(_)) => self.clone(),
            (hash, Err(index)) => self
                .entries
                .insert(index, (hash, value))
                .map_or_else(|_| self.clone(), |entries| self.with_entries(entries)),
        }
    }

    /// Returns a set without `value`.
    #[must_use]
    pub fn remove(&self, value: &T) -> Self {
        match self.locate(value) {
            (_, Ok(index)) => self
                .entries
                .remove_at(index)
                .map_or_else(|_| self.clone(), |entries| self.with_entries(entries)),
            (_, Err(_)) => self.clone(),
        }
    }

    /// Returns an empty set with the same hash builder.
    #[must_use]
    pub fn clear(&self) -> Self {
        Self::with_hasher(self.hash_builder.clone())
    }

    fn with_entries(&self, entries: ImmutableTreeList<(u64, T)>) -> Self {
        Self {
            entries,
            hash_builder: self.hash_builder.clone(),
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<T, S: Clone> Clone for ImmutableHashTreeSet<T, S> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<T, S: Default> Default for ImmutableHashTreeSet<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> FromIterator<T> for ImmutableHashTreeSet<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let hash_builder = S::default();
        let mut hashed: Vec<(u64, T)> = iter
            .into_iter()
            .map(|element| (hash_of(&hash_builder, &element), element))
            .collect();
        hashed.sort_by_key(|(hash, _)| *hash);

        let mut unique: Vec<(u64, T)> = Vec::with_capacity(hashed.len());
        let mut run_start = 0;
        for (hash, element) in hashed {
            if unique.last().is_none_or(|(last_hash, _)| *last_hash != hash) {
                run_start = unique.len();
            }
            let duplicate = unique[run_start..]
                .iter()
                .any(|(_, existing)| *existing == element);
            if !duplicate {
                unique.push((hash, element));
            }
        }
        Self {
            entries: unique.into_iter().collect(),
            hash_builder,
        }
    }
}

impl<T: Hash + Eq, S: BuildHasher> PartialEq for ImmutableHashTreeSet<T, S> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|element| other.contains(element))
    }
}

impl<T: Hash + Eq, S: BuildHasher> Eq for ImmutableHashTreeSet<T, S> {}

impl<T: fmt::Debug, S> fmt::Debug for ImmutableHashTreeSet<T, S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(feature = "serde")]
impl<T: serde::Serialize, S> serde::Serialize for ImmutableHashTreeSet<T, S> {
    fn serialize<Z>(&self, serializer: Z) -> Result<Z::Ok, Z::Error>
    where
        Z: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de, T, S> serde::Deserialize<'de> for ImmutableHashTreeSet<T, S>
where
    T: serde::Deserialize<'de> + Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(crate::tree::queries::SequenceVisitor::new())
    }
}
