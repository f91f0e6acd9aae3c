//! Key orderings and hashing used by the ordered adapters.

use std::cmp::Ordering;
use std::hash::{BuildHasher, Hash};

/// A total order over `K`.
///
/// Implemented by [`NaturalOrder`] for every `K: Ord`, and by any closure
/// `Fn(&K, &K) -> Ordering`.
///
/// # Examples
///
/// ```rust
/// use canopy::ordered::{Comparer, NaturalOrder};
/// use std::cmp::Ordering;
///
/// assert_eq!(NaturalOrder.compare(&1, &2), Ordering::Less);
///
/// let reversed = |left: &i32, right: &i32| right.cmp(left);
/// assert_eq!(reversed.compare(&1, &2), Ordering::Greater);
/// ```
pub trait Comparer<K: ?Sized> {
    /// Orders `left` relative to `right`.
    fn compare(&self, left: &K, right: &K) -> Ordering;
}

/// The order given by `K`'s [`Ord`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NaturalOrder;

impl<K: Ord + ?Sized> Comparer<K> for NaturalOrder {
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Ordering {
        left.cmp(right)
    }
}

impl<K: ?Sized, F> Comparer<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Ordering {
        self(left, right)
    }
}

/// Hash builder used by the hash adapters unless another one is given.
///
/// `rustc-hash`'s `FxBuildHasher` with the `fxhash` feature, `ahash`'s
/// hasher with fixed keys with the `ahash` feature, and the standard library's
/// SipHash with fixed keys otherwise. All three are deterministic, so equal
/// sets built separately lay out their entries the same way.
#[cfg(feature = "fxhash")]
pub type DefaultHashBuilder = rustc_hash::FxBuildHasher;

/// Hash builder used by the hash adapters unless another one is given.
#[cfg(all(feature = "ahash", not(feature = "fxhash")))]
pub type DefaultHashBuilder = std::hash::BuildHasherDefault<ahash::AHasher>;

/// Hash builder used by the hash adapters unless another one is given.
#[cfg(not(any(feature = "fxhash", feature = "ahash")))]
pub type DefaultHashBuilder = std::hash::BuildHasherDefault<std::collections::hash_map::DefaultHasher>;

#[inline]
pub(crate) fn hash_of<K: Hash + ?Sized, S: BuildHasher>(hash_builder: &S, key: &K) -> u64 {
    hash_builder.hash_one(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 2, Ordering::Less)]
    #[case(2, 2, Ordering::Equal)]
    #[case(3, 2, Ordering::Greater)]
    fn test_natural_order(#[case] left: i32, #[case] right: i32, #[case] expected: Ordering) {
        assert_eq!(NaturalOrder.compare(&left, &right), expected);
    }

    #[rstest]
    fn test_closure_comparer() {
        let by_length = |left: &str, right: &str| left.len().cmp(&right.len());
        assert_eq!(by_length.compare("ab", "c"), Ordering::Greater);
    }

    #[rstest]
    fn test_default_hash_builder_is_deterministic() {
        let first = DefaultHashBuilder::default();
        let second = DefaultHashBuilder::default();
        assert_eq!(hash_of(&first, "key"), hash_of(&second, "key"));
    }
}
