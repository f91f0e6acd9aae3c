//! Error types for the tree collections.
//!
//! Every fallible operation in this crate reports a [`CollectionError`].
//! Validation always happens before any structural change, so an `Err`
//! result means the receiver was left exactly as it was.

/// Represents errors that can occur when working with tree collections.
///
/// # Examples
///
/// ```rust
/// use canopy::error::CollectionError;
/// use canopy::tree::TreeList;
///
/// let list: TreeList<i32> = (0..3).collect();
/// assert_eq!(
///     list.try_get(5),
///     Err(CollectionError::IndexOutOfRange { index: 5, length: 3 })
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// An index argument fell outside `[0, length)`, or `[0, length]` for
    /// insertion points.
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The length of the collection at the time of the call.
        length: usize,
    },
    /// A `(start, count)` pair that is jointly outside the collection.
    InvalidRange {
        /// First index of the requested range.
        start: usize,
        /// Number of elements requested.
        count: usize,
        /// The length of the collection at the time of the call.
        length: usize,
    },
    /// A scalar argument outside the domain accepted by the operation.
    ArgumentOutOfRange {
        /// Name of the rejected parameter.
        parameter: &'static str,
        /// The rejected value.
        value: usize,
    },
    /// The operation is not available through a read-only view.
    NotSupported {
        /// Name of the rejected operation.
        operation: &'static str,
    },
    /// The source of a cursor was structurally modified after the cursor was
    /// created.
    ConcurrentModification {
        /// Version captured when the cursor was created.
        expected: u64,
        /// Version observed on the source.
        actual: u64,
    },
    /// A key that is already present was added to a collection that forbids
    /// duplicates.
    DuplicateKey,
}

impl std::fmt::Display for CollectionError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfRange { index, length } => write!(
                formatter,
                "index {index} is out of range for a collection of length {length}"
            ),
            Self::InvalidRange {
                start,
                count,
                length,
            } => write!(
                formatter,
                "range of {count} elements starting at {start} does not fit a collection of length {length}"
            ),
            Self::ArgumentOutOfRange { parameter, value } => {
                write!(formatter, "argument `{parameter}` is out of range: {value}")
            }
            Self::NotSupported { operation } => {
                write!(formatter, "{operation} is not supported on a read-only list")
            }
            Self::ConcurrentModification { expected, actual } => write!(
                formatter,
                "collection was modified during enumeration (version {expected}, now {actual})"
            ),
            Self::DuplicateKey => write!(formatter, "an element with the same key already exists"),
        }
    }
}

impl std::error::Error for CollectionError {}

/// Result alias used by every fallible collection operation.
pub type CollectionResult<T> = Result<T, CollectionError>;

pub(crate) const fn check_index(index: usize, length: usize) -> CollectionResult<()> {
    if index < length {
        Ok(())
    } else {
        Err(CollectionError::IndexOutOfRange { index, length })
    }
}

pub(crate) const fn check_insertion_point(index: usize, length: usize) -> CollectionResult<()> {
    if index <= length {
        Ok(())
    } else {
        Err(CollectionError::IndexOutOfRange { index, length })
    }
}

pub(crate) const fn check_range(start: usize, count: usize, length: usize) -> CollectionResult<()> {
    match start.checked_add(count) {
        Some(end) if end <= length => Ok(()),
        _ => Err(CollectionError::InvalidRange {
            start,
            count,
            length,
        }),
    }
}
