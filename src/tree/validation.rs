//! Structural self-checks for tree collections.
//!
//! [`validate`](super::TreeList::validate) walks the whole tree and reports
//! the first broken invariant. It is a testing aid: nothing in the normal
//! operation of the collections depends on it.

use std::fmt;

use super::node::{Link, NodeBody};

/// Selects which invariants a validation pass checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValidationRule {
    /// Structural invariants only: node capacities, cumulative counts,
    /// uniform height and the cached length.
    #[default]
    None,
    /// Structural invariants plus packing: every node except the last one on
    /// its level is full.
    RequirePacked,
}

/// A broken tree invariant found by a validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    message: String,
}

impl InvariantViolation {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Describes the broken invariant.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "tree invariant violated: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Height and element count of a checked subtree.
struct Summary {
    height: usize,
    count: usize,
}

pub(crate) fn validate_tree<T, L: Link<T>>(
    root: Option<&L>,
    length: usize,
    branching_factor: usize,
    rule: ValidationRule,
) -> Result<(), InvariantViolation> {
    let Some(root) = root else {
        return if length == 0 {
            Ok(())
        } else {
            Err(InvariantViolation::new(format!(
                "tree without root reports length {length}"
            )))
        };
    };
    let summary = validate_node(root, branching_factor, rule, true)?;
    if summary.count != length {
        return Err(InvariantViolation::new(format!(
            "root holds {} elements but length is {length}",
            summary.count
        )));
    }
    Ok(())
}

fn validate_node<T, L: Link<T>>(
    link: &L,
    branching_factor: usize,
    rule: ValidationRule,
    last_on_level: bool,
) -> Result<Summary, InvariantViolation> {
    let (size, summary) = match link.body() {
        NodeBody::Leaf(leaf) => (
            leaf.len(),
            Summary {
                height: 0,
                count: leaf.len(),
            },
        ),
        NodeBody::Internal(internal) => {
            let mut height = None;
            let last = internal.len().saturating_sub(1);
            for (position, child) in internal.children().iter().enumerate() {
                let child_summary =
                    validate_node(child, branching_factor, rule, last_on_level && position == last)?;
                if child_summary.count != internal.child_count(position) {
                    return Err(InvariantViolation::new(format!(
                        "child {position} holds {} elements but its cumulative count says {}",
                        child_summary.count,
                        internal.child_count(position)
                    )));
                }
                match height {
                    None => height = Some(child_summary.height),
                    Some(expected) if expected != child_summary.height => {
                        return Err(InvariantViolation::new(format!(
                            "children at heights {expected} and {} under one node",
                            child_summary.height
                        )));
                    }
                    Some(_) => {}
                }
            }
            (
                internal.len(),
                Summary {
                    height: height.map_or(0, |height| height + 1),
                    count: internal.count(),
                },
            )
        }
    };

    if size == 0 {
        return Err(InvariantViolation::new("empty node in a non-empty tree"));
    }
    if size > branching_factor {
        return Err(InvariantViolation::new(format!(
            "node holds {size} entries, capacity is {branching_factor}"
        )));
    }
    if rule == ValidationRule::RequirePacked && !last_on_level && size != branching_factor {
        return Err(InvariantViolation::new(format!(
            "node holds {size} of {branching_factor} entries but is not the last on its level"
        )));
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::engine::Tree;
    use crate::tree::node::MutableNode;
    use rstest::rstest;

    type BoxedTree = Tree<u8, Box<MutableNode<u8>>>;

    #[rstest]
    fn test_empty_tree_is_valid() {
        let tree = BoxedTree::new(8);
        assert_eq!(tree.validate(ValidationRule::RequirePacked), Ok(()));
    }

    #[rstest]
    fn test_middle_insert_breaks_packing_only() {
        let mut tree = BoxedTree::from_elements(0..32, 8, ());
        tree.insert(4, 99, ()).unwrap();
        assert_eq!(tree.validate(ValidationRule::None), Ok(()));
        let violation = tree.validate(ValidationRule::RequirePacked).unwrap_err();
        assert!(violation.message().contains("not the last on its level"));
    }

    #[rstest]
    fn test_violation_display() {
        let violation = InvariantViolation::new("broken");
        assert_eq!(format!("{violation}"), "tree invariant violated: broken");
    }
}
