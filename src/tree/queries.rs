//! Read-only query surface shared by every tree list.
//!
//! [`impl_list_queries!`] expands into the inherent lookup, search and
//! iteration methods plus the formatting, equality, hashing and indexing
//! traits. The target type must have a `tree` field holding an engine tree,
//! and the macro is told how to wrap the engine's range iterator into the
//! public [`Iter`](super::Iter).

macro_rules! impl_list_queries {
    ($list:ident, $wrap:path) => {
        impl<T> $list<T> {
            /// Returns the number of elements.
            ///
            /// # Complexity
            ///
            /// O(1)
            #[inline]
            #[must_use]
            pub const fn len(&self) -> usize {
                self.tree.len()
            }

            /// Returns `true` if the list contains no elements.
            #[inline]
            #[must_use]
            pub const fn is_empty(&self) -> bool {
                self.tree.len() == 0
            }

            /// Maximum number of entries per node.
            #[inline]
            #[must_use]
            pub const fn branching_factor(&self) -> usize {
                self.tree.branching_factor()
            }

            /// Returns a reference to the element at `index`, or `None` if it
            /// is out of range.
            ///
            /// # Complexity
            ///
            /// O(log n)
            #[must_use]
            pub fn get(&self, index: usize) -> Option<&T> {
                self.tree.get(index)
            }

            /// Returns a reference to the element at `index`.
            ///
            /// # Errors
            ///
            /// Returns `IndexOutOfRange` if `index >= len()`.
            pub fn try_get(&self, index: usize) -> $crate::error::CollectionResult<&T> {
                self.tree
                    .get(index)
                    .ok_or($crate::error::CollectionError::IndexOutOfRange {
                        index,
                        length: self.tree.len(),
                    })
            }

            /// First element, if any.
            #[must_use]
            pub fn first(&self) -> Option<&T> {
                self.tree.get(0)
            }

            /// Last element, if any.
            #[must_use]
            pub fn last(&self) -> Option<&T> {
                self.tree.len().checked_sub(1).and_then(|index| self.tree.get(index))
            }

            /// Iterates over every element in order.
            pub fn iter(&self) -> $crate::tree::Iter<'_, T> {
                $wrap(self.tree.iter())
            }

            /// Iterates over the elements in `span`.
            ///
            /// # Errors
            ///
            /// Returns `InvalidRange` if `span` does not fit the list.
            pub fn iter_range(
                &self,
                span: $crate::tree::Span,
            ) -> $crate::error::CollectionResult<$crate::tree::Iter<'_, T>> {
                span.check(self.tree.len())?;
                Ok($wrap(self.tree.iter_range(span.start(), span.end())))
            }

            /// Returns `true` if some element equals `value`.
            pub fn contains(&self, value: &T) -> bool
            where
                T: PartialEq,
            {
                self.iter().any(|element| element == value)
            }

            /// Index of the first element equal to `value`.
            pub fn index_of(&self, value: &T) -> Option<usize>
            where
                T: PartialEq,
            {
                self.iter().position(|element| element == value)
            }

            /// Index of the last element equal to `value`.
            pub fn last_index_of(&self, value: &T) -> Option<usize>
            where
                T: PartialEq,
            {
                self.find_last_index(|element| element == value)
            }

            /// First element matching `predicate`.
            pub fn find<P>(&self, mut predicate: P) -> Option<&T>
            where
                P: FnMut(&T) -> bool,
            {
                self.iter().find(|element| predicate(element))
            }

            /// Last element matching `predicate`.
            pub fn find_last<P>(&self, predicate: P) -> Option<&T>
            where
                P: FnMut(&T) -> bool,
            {
                self.find_last_index(predicate)
                    .and_then(|index| self.tree.get(index))
            }

            /// Index of the first element matching `predicate`.
            pub fn find_index<P>(&self, mut predicate: P) -> Option<usize>
            where
                P: FnMut(&T) -> bool,
            {
                self.iter().position(|element| predicate(element))
            }

            /// Index of the first element in `span` matching `predicate`.
            ///
            /// # Errors
            ///
            /// Returns `InvalidRange` if `span` does not fit the list.
            pub fn find_index_in<P>(
                &self,
                span: $crate::tree::Span,
                predicate: P,
            ) -> $crate::error::CollectionResult<Option<usize>>
            where
                P: FnMut(&T) -> bool,
            {
                self.tree.find_index(span.start(), span.len(), predicate)
            }

            /// Index of the last element matching `predicate`.
            pub fn find_last_index<P>(&self, predicate: P) -> Option<usize>
            where
                P: FnMut(&T) -> bool,
            {
                self.tree
                    .find_last_index(0, self.tree.len(), predicate)
                    .ok()
                    .flatten()
            }

            /// Index of the last element in `span` matching `predicate`.
            ///
            /// # Errors
            ///
            /// Returns `InvalidRange` if `span` does not fit the list.
            pub fn find_last_index_in<P>(
                &self,
                span: $crate::tree::Span,
                predicate: P,
            ) -> $crate::error::CollectionResult<Option<usize>>
            where
                P: FnMut(&T) -> bool,
            {
                self.tree.find_last_index(span.start(), span.len(), predicate)
            }

            /// Returns `true` if some element matches `predicate`.
            pub fn exists<P>(&self, predicate: P) -> bool
            where
                P: FnMut(&T) -> bool,
            {
                self.find_index(predicate).is_some()
            }

            /// Returns `true` if every element matches `predicate`. Vacuously
            /// `true` for an empty list.
            pub fn true_for_all<P>(&self, mut predicate: P) -> bool
            where
                P: FnMut(&T) -> bool,
            {
                self.iter().all(|element| predicate(element))
            }

            /// Binary search for `value` in a list sorted by `Ord`.
            ///
            /// Returns `Ok(index)` of a matching element, or `Err(index)` where
            /// `value` could be inserted to keep the order.
            ///
            /// # Complexity
            ///
            /// O(log² n)
            pub fn binary_search(&self, value: &T) -> Result<usize, usize>
            where
                T: Ord,
            {
                self.binary_search_by(|element| element.cmp(value))
            }

            /// Binary search with a comparator returning the ordering of each
            /// probed element relative to the target.
            pub fn binary_search_by<F>(&self, compare: F) -> Result<usize, usize>
            where
                F: FnMut(&T) -> std::cmp::Ordering,
            {
                self.tree
                    .binary_search_by(0, self.tree.len(), compare)
                    .unwrap_or(Err(0))
            }

            /// Binary search on a key extracted from each element.
            pub fn binary_search_by_key<B, F>(&self, key: &B, mut extract: F) -> Result<usize, usize>
            where
                B: Ord,
                F: FnMut(&T) -> B,
            {
                self.binary_search_by(|element| extract(element).cmp(key))
            }

            /// Binary search restricted to `span`.
            ///
            /// # Errors
            ///
            /// Returns `InvalidRange` if `span` does not fit the list.
            pub fn binary_search_in<F>(
                &self,
                span: $crate::tree::Span,
                compare: F,
            ) -> $crate::error::CollectionResult<Result<usize, usize>>
            where
                F: FnMut(&T) -> std::cmp::Ordering,
            {
                self.tree.binary_search_by(span.start(), span.len(), compare)
            }

            /// Clones every element into the front of `target`.
            ///
            /// # Errors
            ///
            /// Returns `ArgumentOutOfRange` if `target` is shorter than the
            /// list. `target` is left untouched in that case.
            pub fn copy_to(&self, target: &mut [T]) -> $crate::error::CollectionResult<()>
            where
                T: Clone,
            {
                if target.len() < self.tree.len() {
                    return Err($crate::error::CollectionError::ArgumentOutOfRange {
                        parameter: "target",
                        value: target.len(),
                    });
                }
                for (slot, element) in target.iter_mut().zip(self.iter()) {
                    slot.clone_from(element);
                }
                Ok(())
            }

            /// Collects the elements into a `Vec`.
            #[must_use]
            pub fn to_vec(&self) -> Vec<T>
            where
                T: Clone,
            {
                self.iter().cloned().collect()
            }

            /// Checks the structural invariants of the underlying tree.
            ///
            /// # Errors
            ///
            /// Returns the first violated invariant.
            pub fn validate(
                &self,
                rule: $crate::tree::ValidationRule,
            ) -> Result<(), $crate::tree::InvariantViolation> {
                self.tree.validate(rule)
            }
        }

        impl<'a, T> IntoIterator for &'a $list<T> {
            type Item = &'a T;
            type IntoIter = $crate::tree::Iter<'a, T>;

            fn into_iter(self) -> Self::IntoIter {
                self.iter()
            }
        }

        impl<T> std::ops::Index<usize> for $list<T> {
            type Output = T;

            /// # Panics
            ///
            /// Panics if `index >= len()`.
            fn index(&self, index: usize) -> &T {
                match self.tree.get(index) {
                    Some(element) => element,
                    None => panic!(
                        "index {index} is out of range for a list of length {}",
                        self.tree.len()
                    ),
                }
            }
        }

        impl<T: PartialEq> PartialEq for $list<T> {
            fn eq(&self, other: &Self) -> bool {
                self.len() == other.len() && self.iter().eq(other.iter())
            }
        }

        impl<T: Eq> Eq for $list<T> {}

        impl<T: std::hash::Hash> std::hash::Hash for $list<T> {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                std::hash::Hash::hash(&self.len(), state);
                for element in self {
                    std::hash::Hash::hash(element, state);
                }
            }
        }

        impl<T: std::fmt::Debug> std::fmt::Debug for $list<T> {
            fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.debug_list().entries(self.iter()).finish()
            }
        }

        impl<T: std::fmt::Display> std::fmt::Display for $list<T> {
            fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "[")?;
                let mut first = true;
                for element in self {
                    if first {
                        first = false;
                    } else {
                        write!(formatter, ", ")?;
                    }
                    write!(formatter, "{element}")?;
                }
                write!(formatter, "]")
            }
        }

        #[cfg(feature = "serde")]
        impl<T: serde::Serialize> serde::Serialize for $list<T> {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(self.len()))?;
                for element in self {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
        }
    };
}

pub(crate) use impl_list_queries;

/// Sequence visitor collecting into any `FromIterator` list.
#[cfg(feature = "serde")]
pub(crate) struct SequenceVisitor<C, T> {
    marker: std::marker::PhantomData<(C, T)>,
}

#[cfg(feature = "serde")]
impl<C, T> SequenceVisitor<C, T> {
    pub(crate) const fn new() -> Self {
        Self {
            marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, C, T> serde::de::Visitor<'de> for SequenceVisitor<C, T>
where
    C: FromIterator<T>,
    T: serde::Deserialize<'de>,
{
    type Value = C;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        const MAX_PREALLOCATE: usize = 4096;
        let capacity = seq.size_hint().unwrap_or(0).min(MAX_PREALLOCATE);
        let mut elements = Vec::with_capacity(capacity);
        while let Some(element) = seq.next_element()? {
            elements.push(element);
        }
        Ok(elements.into_iter().collect())
    }
}
