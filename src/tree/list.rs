//! Mutable indexed list backed by an order-statistics B-tree.
//!
//! [`TreeList`] offers the API of a growable array, but insertion and
//! removal at an arbitrary index cost O(log n) instead of O(n).
//!
//! # Examples
//!
//! ```rust
//! use canopy::tree::{TreeList, ValidationRule};
//!
//! let mut list = TreeList::new();
//! for element in 0..72 {
//!     list.add(element);
//! }
//! assert_eq!(list.validate(ValidationRule::RequirePacked), Ok(()));
//! assert_eq!(list.get(71), Some(&71));
//!
//! list.insert(0, -1).unwrap();
//! assert_eq!(list.remove_at(1), Ok(0));
//! assert_eq!(list.first(), Some(&-1));
//! ```

use std::cmp::Ordering;

use super::engine::Tree;
use super::facade::IndexedList;
use super::iter::{Cursor, CursorSource, InstanceId, Iter, Span, Stamp};
use super::node::{DEFAULT_BRANCHING_FACTOR, MutableNode};
use super::queries::impl_list_queries;
use super::check_branching_factor;
use crate::error::CollectionResult;

type BoxedLink<T> = Box<MutableNode<T>>;

/// A mutable list with O(log n) indexed access, insertion and removal.
///
/// Every structural change (insertion, removal, clearing, sorting,
/// reversing, repacking) bumps [`version`](Self::version), which invalidates
/// outstanding [`Cursor`]s. Replacing an element in place with
/// [`set`](Self::set) does not.
///
/// # Complexity
///
/// | Operation | Cost |
/// |-----------|------|
/// | `get`, `set` | O(log n) |
/// | `insert`, `remove_at` | O(log n) |
/// | `add` | O(log n) |
/// | `sort`, `reverse`, `trim_excess` | O(n log n) / O(n) |
pub struct TreeList<T> {
    tree: Tree<T, BoxedLink<T>>,
    instance: InstanceId,
    version: u64,
}

impl_list_queries!(TreeList, Iter::boxed);

impl<T> TreeList<T> {
    /// Creates an empty list with the default branching factor.
    #[must_use]
    pub fn new() -> Self {
        Self::from_tree(Tree::new(DEFAULT_BRANCHING_FACTOR))
    }

    /// Creates an empty list whose nodes hold up to `branching_factor`
    /// entries.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentOutOfRange` if `branching_factor` is below
    /// [`MINIMUM_BRANCHING_FACTOR`](super::MINIMUM_BRANCHING_FACTOR).
    pub fn with_branching_factor(branching_factor: usize) -> CollectionResult<Self> {
        let branching_factor = check_branching_factor(branching_factor)?;
        Ok(Self::from_tree(Tree::new(branching_factor)))
    }

    fn from_tree(tree: Tree<T, BoxedLink<T>>) -> Self {
        Self {
            tree,
            instance: InstanceId::fresh(),
            version: 0,
        }
    }

    /// Modification counter observed by cursors.
    #[inline]
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    const fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Returns a mutable reference to the element at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.tree.get_mut(index, ())
    }

    /// Replaces the element at `index` and returns the previous one.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `index >= len()`.
    pub fn set(&mut self, index: usize, value: T) -> CollectionResult<T> {
        self.tree.set(index, value, ())
    }

    /// Appends `value`. Appending keeps the tree packed.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn add(&mut self, value: T) {
        let length = self.tree.len();
        if self.tree.insert(length, value, ()).is_ok() {
            self.touch();
        }
    }

    /// Inserts `value` so that it ends up at `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `index > len()`.
    pub fn insert(&mut self, index: usize, value: T) -> CollectionResult<()> {
        self.tree.insert(index, value, ())?;
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

    /// Inserts every element of `values` starting at `index`, keeping their
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `index > len()`. Nothing is inserted in
    /// that case.
    pub fn insert_range<I>(&mut self, index: usize, values: I) -> CollectionResult<()>
    where
        I: IntoIterator<Item = T>,
    {
        if self.tree.insert_range(index, values, ())? > 0 {
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
        let element = self.tree.remove_at(index, ())?;
        self.touch();
        Ok(element)
    }

    /// Removes `count` elements starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if the range does not fit the list. Nothing is
    /// removed in that case.
    pub fn remove_range(&mut self, start: usize, count: usize) -> CollectionResult<()> {
        self.tree.remove_range(start, count, ())?;
        if count > 0 {
            self.touch();
        }
        Ok(())
    }

    /// Removes the first element equal to `value`. Returns `true` if one was
    /// found.
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
        self.tree.rebuild(elements, ());
        self.touch();
        removed
    }

    /// Replaces the first element equal to `old` with `new`. Returns `true`
    /// if a replacement happened.
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

    /// Sorts the list in ascending order. The sort is stable.
    pub fn sort(&mut self)
    where
        T: Ord,
    {
        self.sort_by(Ord::cmp);
    }

    /// Sorts the list with a comparator. The sort is stable and rebuilds the
    /// tree packed.
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut elements = self.tree.take_elements();
        elements.sort_by(compare);
        self.tree.rebuild(elements, ());
        self.touch();
    }

    /// Sorts the list by a key extracted from each element.
    pub fn sort_by_key<K, F>(&mut self, mut extract: F)
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        self.sort_by(|left, right| extract(left).cmp(&extract(right)));
    }

    /// Sorts the elements in `span` with a comparator, leaving the rest in
    /// place.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if `span` does not fit the list.
    pub fn sort_range_by<F>(&mut self, span: Span, compare: F) -> CollectionResult<()>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        span.check(self.tree.len())?;
        let mut elements = self.tree.take_elements();
        elements[span.start()..span.end()].sort_by(compare);
        self.tree.rebuild(elements, ());
        self.touch();
        Ok(())
    }

    /// Reverses the order of the elements.
    pub fn reverse(&mut self) {
        let mut elements = self.tree.take_elements();
        elements.reverse();
        self.tree.rebuild(elements, ());
        self.touch();
    }

    /// Reverses the order of the elements in `span`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if `span` does not fit the list.
    pub fn reverse_range(&mut self, span: Span) -> CollectionResult<()> {
        span.check(self.tree.len())?;
        let mut elements = self.tree.take_elements();
        elements[span.start()..span.end()].reverse();
        self.tree.rebuild(elements, ());
        self.touch();
        Ok(())
    }

    /// Maps every element into a new list with the same branching factor.
    pub fn convert_all<U, F>(&self, mut convert: F) -> TreeList<U>
    where
        F: FnMut(&T) -> U,
    {
        TreeList::from_tree(Tree::from_elements(
            self.iter().map(|element| convert(element)),
            self.tree.branching_factor(),
            (),
        ))
    }

    /// Clones the elements in `span` into a new list.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if `span` does not fit the list.
    pub fn get_range(&self, span: Span) -> CollectionResult<Self>
    where
        T: Clone,
    {
        let elements = self.iter_range(span)?.cloned();
        Ok(Self::from_tree(Tree::from_elements(
            elements,
            self.tree.branching_factor(),
            (),
        )))
    }

    /// Clones every element matching `predicate` into a new list.
    pub fn find_all<P>(&self, mut predicate: P) -> Self
    where
        T: Clone,
        P: FnMut(&T) -> bool,
    {
        let elements = self.iter().filter(|element| predicate(element)).cloned();
        Self::from_tree(Tree::from_elements(
            elements,
            self.tree.branching_factor(),
            (),
        ))
    }

    /// Rebuilds the tree so that every node except the last on each level is
    /// full. Does nothing, and keeps the version, when the tree is already
    /// packed.
    pub fn trim_excess(&mut self) {
        if self.tree.repack(()) {
            self.touch();
        }
    }

    /// Creates a cursor over `span`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if `span` does not fit the list.
    pub fn cursor(&self, span: Span) -> CollectionResult<Cursor<Self>> {
        Cursor::new(self, span)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<T> Default for TreeList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for TreeList<T> {
    /// The clone is a separate instance; cursors over `self` do not walk it.
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
            instance: InstanceId::fresh(),
            version: self.version,
        }
    }
}

impl<T> FromIterator<T> for TreeList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_tree(Tree::from_elements(iter, DEFAULT_BRANCHING_FACTOR, ()))
    }
}

impl<T> Extend<T> for TreeList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.add_range(iter);
    }
}

impl<T> IntoIterator for TreeList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(mut self) -> Self::IntoIter {
        self.tree.take_elements().into_iter()
    }
}

impl<T> CursorSource for TreeList<T> {
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

impl<T> IndexedList<T> for TreeList<T> {
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
impl<'de, T> serde::Deserialize<'de> for TreeList<T>
where
    T: serde::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(super::queries::SequenceVisitor::new())
    }
}

impl<T> From<Vec<T>> for TreeList<T> {
    fn from(elements: Vec<T>) -> Self {
        elements.into_iter().collect()
    }
}

impl<T> From<TreeList<T>> for Vec<T> {
    fn from(mut list: TreeList<T>) -> Self {
        list.tree.take_elements()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectionError;
    use crate::tree::ValidationRule;
    use rstest::rstest;

    fn list_of(range: std::ops::Range<i32>) -> TreeList<i32> {
        range.collect()
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[rstest]
    fn test_new_is_empty() {
        let list: TreeList<i32> = TreeList::new();
        assert!(list.is_empty());
        assert_eq!(list.branching_factor(), DEFAULT_BRANCHING_FACTOR);
        assert_eq!(list.get(0), None);
    }

    #[rstest]
    #[case(0)]
    #[case(3)]
    fn test_with_branching_factor_rejects_small_values(#[case] branching_factor: usize) {
        assert!(matches!(
            TreeList::<i32>::with_branching_factor(branching_factor),
            Err(CollectionError::ArgumentOutOfRange { .. })
        ));
    }

    #[rstest]
    fn test_appending_72_elements_stays_packed() {
        let mut list = TreeList::with_branching_factor(8).unwrap();
        for element in 0..72 {
            list.add(element);
        }
        assert_eq!(list.validate(ValidationRule::RequirePacked), Ok(()));
        assert_eq!(list.get(71), Some(&71));
        assert_eq!(list.len(), 72);
    }

    // =========================================================================
    // Positional updates
    // =========================================================================

    #[rstest]
    fn test_insert_and_remove_at() {
        let mut list = list_of(0..20);
        list.insert(10, 100).unwrap();
        assert_eq!(list[10], 100);
        assert_eq!(list[11], 10);
        assert_eq!(list.remove_at(10), Ok(100));
        assert_eq!(list.to_vec(), (0..20).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_insert_past_end_is_rejected() {
        let mut list = list_of(0..3);
        let version = list.version();
        assert_eq!(
            list.insert(4, 9),
            Err(CollectionError::IndexOutOfRange {
                index: 4,
                length: 3
            })
        );
        assert_eq!(list.version(), version);
    }

    #[rstest]
    fn test_set_keeps_version() {
        let mut list = list_of(0..5);
        let version = list.version();
        assert_eq!(list.set(2, 20), Ok(2));
        assert_eq!(list.version(), version);
        assert_eq!(list[2], 20);
    }

    #[rstest]
    fn test_insert_range_in_middle() {
        let mut list = list_of(0..10);
        list.insert_range(5, [100, 101, 102]).unwrap();
        assert_eq!(
            list.to_vec(),
            vec![0, 1, 2, 3, 4, 100, 101, 102, 5, 6, 7, 8, 9]
        );
        assert_eq!(list.validate(ValidationRule::None), Ok(()));
    }

    #[rstest]
    fn test_insert_range_at_end_stays_packed() {
        let mut list = list_of(0..10);
        list.insert_range(10, 10..50).unwrap();
        assert_eq!(list.validate(ValidationRule::RequirePacked), Ok(()));
    }

    #[rstest]
    fn test_remove_range_rejects_invalid_range() {
        let mut list = list_of(0..10);
        assert!(matches!(
            list.remove_range(8, 3),
            Err(CollectionError::InvalidRange { .. })
        ));
        assert_eq!(list.len(), 10);
    }

    #[rstest]
    fn test_remove_and_remove_all() {
        let mut list: TreeList<i32> = [1, 2, 3, 2, 1].into_iter().collect();
        assert!(list.remove(&2));
        assert_eq!(list.to_vec(), vec![1, 3, 2, 1]);
        assert!(!list.remove(&7));
        assert_eq!(list.remove_all(|element| *element == 1), 2);
        assert_eq!(list.to_vec(), vec![3, 2]);
    }

    #[rstest]
    fn test_remove_all_without_match_leaves_tree_alone() {
        let mut list = list_of(0..64);
        for index in (0..64).step_by(7) {
            list.insert(index, -1).unwrap();
        }
        assert!(list.validate(ValidationRule::RequirePacked).is_err());
        let version = list.version();

        assert_eq!(list.remove_all(|element| *element > 1000), 0);
        assert_eq!(list.version(), version);
        assert!(list.validate(ValidationRule::RequirePacked).is_err());
    }

    #[rstest]
    fn test_replace() {
        let mut list: TreeList<&str> = ["a", "b", "a"].into_iter().collect();
        assert!(list.replace(&"a", "z"));
        assert_eq!(list.to_vec(), vec!["z", "b", "a"]);
        assert!(!list.replace(&"q", "z"));
    }

    // =========================================================================
    // Searching
    // =========================================================================

    #[rstest]
    fn test_search_family() {
        let list: TreeList<i32> = [5, 3, 8, 3, 9].into_iter().collect();
        assert!(list.contains(&8));
        assert_eq!(list.index_of(&3), Some(1));
        assert_eq!(list.last_index_of(&3), Some(3));
        assert_eq!(list.find(|element| *element > 5), Some(&8));
        assert_eq!(list.find_last(|element| *element > 5), Some(&9));
        assert_eq!(list.find_all(|element| *element == 3).to_vec(), vec![3, 3]);
        assert!(list.exists(|element| *element == 9));
        assert!(!list.true_for_all(|element| *element > 3));
    }

    #[rstest]
    fn test_find_index_in_span() {
        let list: TreeList<i32> = [1, 2, 1, 2, 1].into_iter().collect();
        let span = Span::new(2, 5).unwrap();
        assert_eq!(list.find_index_in(span, |element| *element == 2), Ok(Some(3)));
        assert_eq!(list.find_last_index_in(span, |element| *element == 1), Ok(Some(4)));
        assert!(list.find_index_in(Span::new(2, 6).unwrap(), |_| true).is_err());
    }

    #[rstest]
    fn test_binary_search() {
        let list: TreeList<i32> = (0..100).map(|element| element * 3).collect();
        assert_eq!(list.binary_search(&33), Ok(11));
        assert_eq!(list.binary_search(&34), Err(12));
        assert_eq!(list.binary_search_by_key(&6, |element| element / 3), Ok(6));
    }

    // =========================================================================
    // Reordering
    // =========================================================================

    #[rstest]
    fn test_sort_and_reverse_bump_version() {
        let mut list: TreeList<i32> = [3, 1, 2].into_iter().collect();
        let version = list.version();
        list.sort();
        assert_eq!(list.to_vec(), vec![1, 2, 3]);
        list.reverse();
        assert_eq!(list.to_vec(), vec![3, 2, 1]);
        assert_eq!(list.version(), version + 2);
    }

    #[rstest]
    fn test_sort_range_and_reverse_range() {
        let mut list: TreeList<i32> = [9, 8, 7, 6, 5].into_iter().collect();
        list.sort_range_by(Span::new(1, 4).unwrap(), Ord::cmp).unwrap();
        assert_eq!(list.to_vec(), vec![9, 6, 7, 8, 5]);
        list.reverse_range(Span::new(0, 2).unwrap()).unwrap();
        assert_eq!(list.to_vec(), vec![6, 9, 7, 8, 5]);
    }

    #[rstest]
    fn test_sort_by_key_is_stable() {
        let mut list: TreeList<(i32, char)> =
            [(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd')].into_iter().collect();
        list.sort_by_key(|pair| pair.0);
        assert_eq!(list.to_vec(), vec![(1, 'b'), (1, 'd'), (2, 'a'), (2, 'c')]);
    }

    #[rstest]
    fn test_trim_excess_restores_packing() {
        let mut list = list_of(0..64);
        for index in (0..64).step_by(7) {
            list.insert(index, -1).unwrap();
        }
        let before = list.to_vec();
        list.trim_excess();
        assert_eq!(list.validate(ValidationRule::RequirePacked), Ok(()));
        assert_eq!(list.to_vec(), before);

        let version = list.version();
        list.trim_excess();
        assert_eq!(list.version(), version);
    }

    // =========================================================================
    // Conversions
    // =========================================================================

    #[rstest]
    fn test_convert_all_and_get_range() {
        let list = list_of(0..10);
        let doubled = list.convert_all(|element| element * 2);
        assert_eq!(doubled[9], 18);
        let slice = list.get_range(Span::new(3, 6).unwrap()).unwrap();
        assert_eq!(slice.to_vec(), vec![3, 4, 5]);
    }

    #[rstest]
    fn test_copy_to() {
        let list = list_of(0..3);
        let mut target = [0; 5];
        assert_eq!(list.copy_to(&mut target), Ok(()));
        assert_eq!(target, [0, 1, 2, 0, 0]);
        let mut short = [0; 2];
        assert!(list.copy_to(&mut short).is_err());
    }

    #[rstest]
    fn test_display_and_debug() {
        let list = list_of(1..4);
        assert_eq!(format!("{list}"), "[1, 2, 3]");
        assert_eq!(format!("{list:?}"), "[1, 2, 3]");
        assert_eq!(format!("{}", TreeList::<i32>::new()), "[]");
    }

    #[rstest]
    fn test_into_iterator_owned() {
        let list: TreeList<String> = ["a", "b"].into_iter().map(String::from).collect();
        let collected: Vec<String> = list.into_iter().collect();
        assert_eq!(collected, vec!["a".to_string(), "b".to_string()]);
    }

    #[rstest]
    fn test_indexed_list_facade() {
        let mut list = list_of(0..3);
        let facade: &mut dyn IndexedList<i32> = &mut list;
        assert!(!facade.is_read_only());
        facade.insert_item(0, 9).unwrap();
        facade.remove_item_at(3).unwrap();
        assert_eq!(facade.count(), 3);
        assert_eq!(facade.item(0), Ok(&9));
        facade.clear_items().unwrap();
        assert_eq!(list.len(), 0);
    }
}
