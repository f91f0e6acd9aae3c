//! Object-safe indexed-list facade.

use crate::error::CollectionResult;

/// Index-based access shared by every list type.
///
/// The trait is object safe, so code that only needs positional access can
/// take `&mut dyn IndexedList<T>` and accept any of the lists in this crate.
/// Read-only implementors report
/// [`NotSupported`](crate::error::CollectionError::NotSupported) from every
/// mutating method.
///
/// # Examples
///
/// ```rust
/// use canopy::error::CollectionError;
/// use canopy::tree::{ImmutableTreeList, IndexedList, TreeList};
///
/// fn bump_first(list: &mut dyn IndexedList<i32>) -> Result<(), CollectionError> {
///     let first = *list.item(0)?;
///     list.set_item(0, first + 1)
/// }
///
/// let mut list: TreeList<i32> = [1, 2].into_iter().collect();
/// assert_eq!(bump_first(&mut list), Ok(()));
/// assert_eq!(list[0], 2);
///
/// let mut frozen: ImmutableTreeList<i32> = [1, 2].into_iter().collect();
/// assert!(matches!(
///     bump_first(&mut frozen),
///     Err(CollectionError::NotSupported { .. })
/// ));
/// ```
pub trait IndexedList<T> {
    /// Number of elements.
    fn count(&self) -> usize;

    /// Element at `index`.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` if `index >= count()`.
    fn item(&self, index: usize) -> CollectionResult<&T>;

    /// Returns `true` if the mutating methods always fail.
    fn is_read_only(&self) -> bool;

    /// Replaces the element at `index`.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange`, or `NotSupported` for read-only lists.
    fn set_item(&mut self, index: usize, value: T) -> CollectionResult<()>;

    /// Inserts `value` at `index`.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange`, or `NotSupported` for read-only lists.
    fn insert_item(&mut self, index: usize, value: T) -> CollectionResult<()>;

    /// Removes the element at `index`.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange`, or `NotSupported` for read-only lists.
    fn remove_item_at(&mut self, index: usize) -> CollectionResult<()>;

    /// Removes every element.
    ///
    /// # Errors
    ///
    /// `NotSupported` for read-only lists.
    fn clear_items(&mut self) -> CollectionResult<()>;
}
