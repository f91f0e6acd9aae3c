//! Fixed-capacity inline array with checked indexing.

use std::ops::Index;

use crate::error::{CollectionResult, check_index};

/// An inline array of exactly `N` slots with bounds-checked access.
///
/// Every slot always holds a value; `Default` fills the array with
/// `T::default()`.
///
/// Tree nodes do not use this type. A node must hold up to the configured
/// branching factor, which is only known at run time and may exceed `N`, so
/// nodes keep their entries in a `SmallVec` that spills to the heap instead.
///
/// # Examples
///
/// ```rust
/// use canopy::error::CollectionError;
/// use canopy::tree::FixedArray;
///
/// let mut array: FixedArray<i32> = FixedArray::default();
/// assert_eq!(array.len(), 8);
/// assert_eq!(array.set(3, 7), Ok(0));
/// assert_eq!(array.get(3), Ok(&7));
/// assert_eq!(
///     array.get(8),
///     Err(CollectionError::IndexOutOfRange { index: 8, length: 8 })
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedArray<T, const N: usize = 8> {
    slots: [T; N],
}

impl<T, const N: usize> FixedArray<T, N> {
    /// Wraps an existing array.
    #[must_use]
    pub const fn new(slots: [T; N]) -> Self {
        Self { slots }
    }

    /// Number of slots, always `N`.
    #[inline]
    #[must_use]
    #[allow(clippy::unused_self)]
    pub const fn len(&self) -> usize {
        N
    }

    /// Returns `true` when `N` is zero.
    #[inline]
    #[must_use]
    #[allow(clippy::unused_self)]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Returns the value in slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexOutOfRange`](crate::error::CollectionError::IndexOutOfRange)
    /// if `index >= N`.
    pub fn get(&self, index: usize) -> CollectionResult<&T> {
        check_index(index, N)?;
        Ok(&self.slots[index])
    }

    /// Returns a mutable reference to slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexOutOfRange`](crate::error::CollectionError::IndexOutOfRange)
    /// if `index >= N`.
    pub fn get_mut(&mut self, index: usize) -> CollectionResult<&mut T> {
        check_index(index, N)?;
        Ok(&mut self.slots[index])
    }

    /// Stores `value` in slot `index` and returns the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`IndexOutOfRange`](crate::error::CollectionError::IndexOutOfRange)
    /// if `index >= N`.
    pub fn set(&mut self, index: usize, value: T) -> CollectionResult<T> {
        self.get_mut(index).map(|slot| std::mem::replace(slot, value))
    }

    /// Views the slots as a slice.
    #[must_use]
    pub const fn as_slice(&self) -> &[T] {
        &self.slots
    }

    /// Iterates over the slots in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.slots.iter()
    }

    /// Unwraps the inner array.
    #[must_use]
    pub fn into_inner(self) -> [T; N] {
        self.slots
    }
}

impl<T: Default, const N: usize> Default for FixedArray<T, N> {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| T::default()),
        }
    }
}

impl<T, const N: usize> Index<usize> for FixedArray<T, N> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `index >= N`.
    fn index(&self, index: usize) -> &T {
        &self.slots[index]
    }
}

impl<T, const N: usize> From<[T; N]> for FixedArray<T, N> {
    fn from(slots: [T; N]) -> Self {
        Self::new(slots)
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a FixedArray<T, N> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
