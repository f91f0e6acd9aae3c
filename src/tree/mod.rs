//! Indexed tree lists.
//!
//! Every collection in this module stores its elements in the leaves of a
//! B-tree whose internal nodes record cumulative element counts. Reaching the
//! element at an index costs O(log n), and so do insertion and removal at an
//! arbitrary index.
//!
//! - [`TreeList`]: a mutable list with in-place updates.
//! - [`ImmutableTreeList`]: a persistent list. Every update returns a new list
//!   that shares all untouched nodes with the old one.
//! - [`ImmutableTreeListBuilder`]: a mutable companion of the persistent list.
//!   It edits nodes it owns in place, copies shared nodes on first touch, and
//!   publishes snapshots with [`to_immutable`](ImmutableTreeListBuilder::to_immutable).
//!
//! # Examples
//!
//! ```rust
//! use canopy::tree::{ImmutableTreeList, TreeList};
//!
//! let mut list: TreeList<i32> = (0..5).collect();
//! list.insert(2, 10).unwrap();
//! assert_eq!(list.to_string(), "[0, 1, 10, 2, 3, 4]");
//!
//! let original: ImmutableTreeList<i32> = [1, 5, 4].into_iter().collect();
//! let updated = original.insert(1, 9).unwrap();
//! assert_eq!(updated.to_string(), "[1, 9, 5, 4]");
//! assert_eq!(original.to_string(), "[1, 5, 4]");
//! ```
//!
//! # Thread Safety
//!
//! With the `arc` feature nodes are shared through `Arc`, which makes
//! [`ImmutableTreeList`] `Send + Sync` for `T: Send + Sync`. Without it they
//! are shared through `Rc`.

/// Reference counter used for shared nodes.
///
/// `Arc` with the `arc` feature, `Rc` otherwise.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod builder;
mod engine;
mod facade;
mod fixed_array;
mod immutable;
mod iter;
mod list;
mod node;
pub(crate) mod queries;
mod validation;

pub use builder::ImmutableTreeListBuilder;
pub use facade::IndexedList;
pub use fixed_array::FixedArray;
pub use immutable::ImmutableTreeList;
pub use iter::{Cursor, CursorSource, InstanceId, Iter, Span, Stamp};
pub use list::TreeList;
pub use node::{DEFAULT_BRANCHING_FACTOR, MINIMUM_BRANCHING_FACTOR};
pub use validation::{InvariantViolation, ValidationRule};

use crate::error::{CollectionError, CollectionResult};

/// Rejects branching factors below [`MINIMUM_BRANCHING_FACTOR`].
pub(crate) const fn check_branching_factor(branching_factor: usize) -> CollectionResult<usize> {
    if branching_factor < MINIMUM_BRANCHING_FACTOR {
        Err(CollectionError::ArgumentOutOfRange {
            parameter: "branching_factor",
            value: branching_factor,
        })
    } else {
        Ok(branching_factor)
    }
}
