//! # canopy
//!
//! Indexed list, set and dictionary collections backed by an
//! order-statistics B-tree, in mutable and persistent forms.
//!
//! ## Overview
//!
//! Every collection stores its elements in the leaves of a tree whose
//! internal nodes record how many elements lie below each child. That turns
//! positional access, insertion and removal into O(log n) operations.
//!
//! - **Mutable list**: [`TreeList`](tree::TreeList), updated in place.
//! - **Persistent list**: [`ImmutableTreeList`](tree::ImmutableTreeList),
//!   where every update returns a new list sharing unchanged nodes with the
//!   old one.
//! - **Builder**: [`ImmutableTreeListBuilder`](tree::ImmutableTreeListBuilder),
//!   batching edits to a persistent list and publishing snapshots in O(1).
//! - **Cursors**: detached, version-checked positions that detect
//!   modification of the list they walk.
//! - **Ordered adapters**: sorted and hashed sets and dictionaries built on
//!   the persistent list.
//!
//! ## Feature Flags
//!
//! - `ordered` (default): sorted and hashed sets and dictionaries
//! - `arc`: share nodes through `Arc`, making snapshots `Send + Sync`
//! - `serde`: `Serialize` / `Deserialize` implementations
//! - `tracing`: structured logging of tree restructuring through `tracing`
//! - `fxhash` / `ahash`: default hasher of the hash adapters
//! - `full`: `ordered` and `serde`
//!
//! ## Example
//!
//! ```rust
//! use canopy::prelude::*;
//!
//! let mut list: TreeList<i32> = (0..10).collect();
//! list.insert(5, 100).unwrap();
//! assert_eq!(list[5], 100);
//!
//! let snapshot: ImmutableTreeList<i32> = list.iter().copied().collect();
//! let mut builder = snapshot.to_builder();
//! builder.remove_at(5).unwrap();
//! assert_eq!(builder.to_immutable().len(), 10);
//! assert_eq!(snapshot.len(), 11);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use canopy::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{CollectionError, CollectionResult};
    pub use crate::tree::*;

    #[cfg(feature = "ordered")]
    pub use crate::ordered::*;
}

pub mod error;
pub mod tree;

#[cfg(feature = "ordered")]
pub mod ordered;

mod tracing_helpers;
