//! Sets and dictionaries layered on [`ImmutableTreeList`].
//!
//! The adapters keep their entries in a persistent list and locate them by
//! binary search, so every update is a single indexed insert, replace or
//! removal on the list and shares all untouched nodes with the previous
//! version.
//!
//! - [`ImmutableSortedTreeSet`] and [`ImmutableSortedTreeDictionary`] order
//!   their entries with a [`Comparer`], [`NaturalOrder`] by default.
//! - [`ImmutableHashTreeSet`] and [`ImmutableHashTreeDictionary`] order their
//!   entries by hash code and resolve collisions by equality.
//!
//! # Examples
//!
//! ```rust
//! use canopy::ordered::ImmutableSortedTreeDictionary;
//!
//! let dictionary: ImmutableSortedTreeDictionary<char, i32> =
//!     [('b', 2), ('a', 1), ('c', 3)].into_iter().collect();
//! let keys: String = dictionary.keys().collect();
//! assert_eq!(keys, "abc");
//! ```

use std::cmp::Ordering;

use crate::tree::{ImmutableTreeList, Span};

mod comparer;
mod hash_dictionary;
mod hash_set;
mod sorted_dictionary;
mod sorted_set;

pub use comparer::{Comparer, DefaultHashBuilder, NaturalOrder};
pub use hash_dictionary::ImmutableHashTreeDictionary;
pub use hash_set::ImmutableHashTreeSet;
pub use sorted_dictionary::ImmutableSortedTreeDictionary;
pub use sorted_set::ImmutableSortedTreeSet;

/// Searches the run of entries carrying `hash`.
///
/// Returns `Ok(index)` of the first entry in the run accepted by `matches`,
/// or `Err(index)` of the slot just past the run, where a new entry with
/// this hash belongs.
pub(crate) fn find_in_run<E, H, M>(
    entries: &ImmutableTreeList<E>,
    hash: u64,
    hash_of_entry: H,
    mut matches: M,
) -> Result<usize, usize>
where
    H: Fn(&E) -> u64,
    M: FnMut(&E) -> bool,
{
    let start = match entries.binary_search_by(|entry| {
        if hash_of_entry(entry) < hash {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }) {
        Ok(index) | Err(index) => index,
    };
    let Ok(run) = Span::new(start, entries.len()).and_then(|span| entries.iter_range(span)) else {
        return Err(start);
    };
    let mut index = start;
    for entry in run {
        if hash_of_entry(entry) != hash {
            break;
        }
        if matches(entry) {
            return Ok(index);
        }
        index += 1;
    }
    Err(index)
}

/// Map visitor collecting into any `FromIterator<(K, V)>` dictionary.
#[cfg(feature = "serde")]
pub(crate) struct EntryVisitor<C, K, V> {
    marker: std::marker::PhantomData<(C, K, V)>,
}

#[cfg(feature = "serde")]
impl<C, K, V> EntryVisitor<C, K, V> {
    pub(crate) const fn new() -> Self {
        Self {
            marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, C, K, V> serde::de::Visitor<'de> for EntryVisitor<C, K, V>
where
    C: FromIterator<(K, V)>,
    K: serde::Deserialize<'de>,
    V: serde::Deserialize<'de>,
{
    type Value = C;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        const MAX_PREALLOCATE: usize = 4096;
        let capacity = map.size_hint().unwrap_or(0).min(MAX_PREALLOCATE);
        let mut entries = Vec::with_capacity(capacity);
        while let Some(entry) = map.next_entry()? {
            entries.push(entry);
        }
        Ok(entries.into_iter().collect())
    }
}
