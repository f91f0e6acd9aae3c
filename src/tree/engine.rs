//! Order-statistics tree algorithms shared by every list type.
//!
//! [`Tree`] owns an optional root link plus the cached element count. Reads
//! only need [`Link`]; every write goes through [`LinkMut::edit`] with the
//! caller's owner tag, which is where copy-on-write happens for shared nodes.
//! None of the operations here merge under-full nodes: removal shrinks the
//! touched nodes, unlinks nodes that became empty, and collapses a root left
//! with a single child.

use std::cmp::Ordering;
use std::marker::PhantomData;

use super::iter::RangeIter;
use super::node::{InternalNode, LeafNode, Link, LinkMut, NodeBody};
use super::validation::{self, InvariantViolation, ValidationRule};
use crate::error::{CollectionResult, check_index, check_insertion_point, check_range};
use crate::tracing_helpers::debug_log;

/// Root handle of a tree plus its cached length.
pub(crate) struct Tree<T, L> {
    root: Option<L>,
    length: usize,
    branching_factor: usize,
    marker: PhantomData<T>,
}

impl<T, L: Clone> Clone for Tree<T, L> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            length: self.length,
            branching_factor: self.branching_factor,
            marker: PhantomData,
        }
    }
}

impl<T, L> Tree<T, L> {
    pub(crate) const fn new(branching_factor: usize) -> Self {
        Self {
            root: None,
            length: 0,
            branching_factor,
            marker: PhantomData,
        }
    }

    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub(crate) const fn branching_factor(&self) -> usize {
        self.branching_factor
    }

    #[inline]
    pub(crate) const fn root(&self) -> Option<&L> {
        self.root.as_ref()
    }

    pub(crate) fn clear(&mut self) {
        self.root = None;
        self.length = 0;
    }
}

// =============================================================================
// Reads
// =============================================================================

impl<T, L: Link<T>> Tree<T, L> {
    /// Resolves `index` to its element by routing through cumulative counts.
    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        if index >= self.length {
            return None;
        }
        let mut node = self.root.as_ref()?;
        let mut index = index;
        loop {
            match node.body() {
                NodeBody::Leaf(leaf) => return leaf.get(index),
                NodeBody::Internal(internal) => {
                    let (position, offset) = internal.route(index);
                    node = internal.child(position);
                    index = offset;
                }
            }
        }
    }

    pub(crate) fn iter_range(&self, start: usize, end: usize) -> RangeIter<'_, T, L> {
        RangeIter::new(self.root.as_ref(), start, end.min(self.length))
    }

    pub(crate) fn iter(&self) -> RangeIter<'_, T, L> {
        self.iter_range(0, self.length)
    }

    /// Binary search over `[start, start + count)` of a sequence sorted
    /// consistently with `compare`.
    pub(crate) fn binary_search_by<F>(
        &self,
        start: usize,
        count: usize,
        mut compare: F,
    ) -> CollectionResult<Result<usize, usize>>
    where
        F: FnMut(&T) -> Ordering,
    {
        check_range(start, count, self.length)?;
        let mut low = start;
        let mut high = start + count;
        while low < high {
            let middle = low + (high - low) / 2;
            let Some(element) = self.get(middle) else {
                break;
            };
            match compare(element) {
                Ordering::Less => low = middle + 1,
                Ordering::Greater => high = middle,
                Ordering::Equal => return Ok(Ok(middle)),
            }
        }
        Ok(Err(low))
    }

    pub(crate) fn find_index<P>(&self, start: usize, count: usize, mut predicate: P) -> CollectionResult<Option<usize>>
    where
        P: FnMut(&T) -> bool,
    {
        check_range(start, count, self.length)?;
        Ok(self
            .iter_range(start, start + count)
            .position(|element| predicate(element))
            .map(|offset| start + offset))
    }

    pub(crate) fn find_last_index<P>(&self, start: usize, count: usize, mut predicate: P) -> CollectionResult<Option<usize>>
    where
        P: FnMut(&T) -> bool,
    {
        check_range(start, count, self.length)?;
        let mut found = None;
        for (offset, element) in self.iter_range(start, start + count).enumerate() {
            if predicate(element) {
                found = Some(start + offset);
            }
        }
        Ok(found)
    }

    pub(crate) fn validate(&self, rule: ValidationRule) -> Result<(), InvariantViolation> {
        validation::validate_tree(self.root.as_ref(), self.length, self.branching_factor, rule)
    }

    pub(crate) fn is_packed(&self) -> bool {
        self.validate(ValidationRule::RequirePacked).is_ok()
    }
}

// =============================================================================
// Writes
// =============================================================================

impl<T, L: LinkMut<T>> Tree<T, L> {
    /// Builds a packed tree: every node except the last one on each level is
    /// full.
    pub(crate) fn from_elements<I>(elements: I, branching_factor: usize, owner: L::Owner) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut level: Vec<(L, usize)> = Vec::new();
        let mut leaf = LeafNode::new();
        for element in elements {
            leaf.push(element);
            if leaf.len() == branching_factor {
                let full = std::mem::replace(&mut leaf, LeafNode::new());
                level.push((L::from_body(NodeBody::Leaf(full), owner), branching_factor));
            }
        }
        if !leaf.is_empty() {
            let count = leaf.len();
            level.push((L::from_body(NodeBody::Leaf(leaf), owner), count));
        }

        while level.len() > 1 {
            let mut parents = Vec::with_capacity(level.len().div_ceil(branching_factor));
            let mut internal = InternalNode::new();
            for (child, count) in level {
                internal.push_child(child, count);
                if internal.len() == branching_factor {
                    let full = std::mem::replace(&mut internal, InternalNode::new());
                    let total = full.count();
                    parents.push((L::from_body(NodeBody::Internal(full), owner), total));
                }
            }
            if internal.len() > 0 {
                let total = internal.count();
                parents.push((L::from_body(NodeBody::Internal(internal), owner), total));
            }
            level = parents;
        }

        let (root, length) = level
            .pop()
            .map_or((None, 0), |(root, length)| (Some(root), length));
        Self {
            root,
            length,
            branching_factor,
            marker: PhantomData,
        }
    }

    /// Mutable access to the element at `index`, copying frozen nodes on the
    /// way down.
    pub(crate) fn get_mut(&mut self, index: usize, owner: L::Owner) -> Option<&mut T> {
        if index >= self.length {
            return None;
        }
        let mut node = self.root.as_mut()?;
        let mut index = index;
        loop {
            match node.edit(owner) {
                NodeBody::Leaf(leaf) => return leaf.get_mut(index),
                NodeBody::Internal(internal) => {
                    let (position, offset) = internal.route(index);
                    node = internal.child_mut(position);
                    index = offset;
                }
            }
        }
    }

    pub(crate) fn set(&mut self, index: usize, element: T, owner: L::Owner) -> CollectionResult<T> {
        check_index(index, self.length)?;
        let length = self.length;
        let slot = self
            .get_mut(index, owner)
            .ok_or(crate::error::CollectionError::IndexOutOfRange { index, length })?;
        Ok(std::mem::replace(slot, element))
    }

    pub(crate) fn insert(&mut self, index: usize, element: T, owner: L::Owner) -> CollectionResult<()> {
        check_insertion_point(index, self.length)?;
        let branching_factor = self.branching_factor;
        match self.root.as_mut() {
            None => {
                self.root = Some(L::from_body(NodeBody::Leaf(LeafNode::singleton(element)), owner));
            }
            Some(root) => {
                if let Some((sibling, sibling_count)) =
                    Self::insert_into(root, index, element, owner, branching_factor)
                {
                    self.grow_root(sibling, sibling_count, owner);
                }
            }
        }
        self.length += 1;
        Ok(())
    }

    /// Replaces the root with a new internal node over the old root and the
    /// sibling split off from it.
    fn grow_root(&mut self, sibling: L, sibling_count: usize, owner: L::Owner) {
        if let Some(old_root) = self.root.take() {
            let old_count = self.length + 1 - sibling_count;
            let mut internal = InternalNode::new();
            internal.push_child(old_root, old_count);
            internal.push_child(sibling, sibling_count);
            debug_log!(length = self.length + 1, "root split, tree height increased");
            self.root = Some(L::from_body(NodeBody::Internal(internal), owner));
        }
    }

    /// Inserts below `link`. Returns the new right sibling (and its element
    /// count) when the node had to split.
    fn insert_into(
        link: &mut L,
        index: usize,
        element: T,
        owner: L::Owner,
        branching_factor: usize,
    ) -> Option<(L, usize)> {
        match link.edit(owner) {
            NodeBody::Leaf(leaf) => {
                if leaf.len() < branching_factor {
                    leaf.insert(index, element);
                    return None;
                }
                if index == leaf.len() {
                    // Appending keeps this leaf full and opens a new one.
                    let sibling = LeafNode::singleton(element);
                    return Some((L::from_body(NodeBody::Leaf(sibling), owner), 1));
                }
                let mut right = leaf.split_off(leaf.len() / 2);
                if index <= leaf.len() {
                    leaf.insert(index, element);
                } else {
                    right.insert(index - leaf.len(), element);
                }
                let count = right.len();
                Some((L::from_body(NodeBody::Leaf(right), owner), count))
            }
            NodeBody::Internal(internal) => {
                let (position, offset) = internal.route_insertion(index);
                let split = Self::insert_into(
                    internal.child_mut(position),
                    offset,
                    element,
                    owner,
                    branching_factor,
                );
                internal.increment_from(position);
                let (sibling, sibling_count) = split?;

                if internal.len() < branching_factor {
                    internal.split_child(position, sibling, sibling_count);
                    return None;
                }
                if position + 1 == internal.len() {
                    internal.release_tail(sibling_count);
                    let mut right = InternalNode::new();
                    right.push_child(sibling, sibling_count);
                    return Some((L::from_body(NodeBody::Internal(right), owner), sibling_count));
                }
                let middle = internal.len() / 2;
                let mut right = internal.split_off(middle);
                if position < middle {
                    internal.split_child(position, sibling, sibling_count);
                } else {
                    right.split_child(position - middle, sibling, sibling_count);
                }
                let count = right.count();
                Some((L::from_body(NodeBody::Internal(right), owner), count))
            }
        }
    }

    pub(crate) fn remove_at(&mut self, index: usize, owner: L::Owner) -> CollectionResult<T> {
        check_index(index, self.length)?;
        let length = self.length;
        let root = self
            .root
            .as_mut()
            .ok_or(crate::error::CollectionError::IndexOutOfRange { index, length })?;
        let element = Self::remove_from(root, index, owner);
        self.length -= 1;
        if self.length == 0 {
            self.root = None;
        } else {
            self.collapse_root(owner);
        }
        Ok(element)
    }

    fn remove_from(link: &mut L, index: usize, owner: L::Owner) -> T {
        match link.edit(owner) {
            NodeBody::Leaf(leaf) => leaf.remove(index),
            NodeBody::Internal(internal) => {
                let (position, offset) = internal.route(index);
                let element = Self::remove_from(internal.child_mut(position), offset, owner);
                internal.decrement_from(position);
                if internal.child_count(position) == 0 {
                    internal.remove_child(position);
                }
                element
            }
        }
    }

    /// Drops root levels that have a single child.
    fn collapse_root(&mut self, owner: L::Owner) {
        loop {
            let Some(root) = self.root.as_mut() else {
                return;
            };
            let single_child =
                matches!(root.body(), NodeBody::Internal(internal) if internal.len() == 1);
            if !single_child {
                return;
            }
            let NodeBody::Internal(internal) = root.edit(owner) else {
                return;
            };
            let child = internal.remove_child(0);
            debug_log!(length = self.length, "root collapsed, tree height decreased");
            self.root = Some(child);
        }
    }

    /// Removes `[start, start + count)`. Large removals rebuild the tree from
    /// the surviving elements instead of removing one by one.
    pub(crate) fn remove_range(&mut self, start: usize, count: usize, owner: L::Owner) -> CollectionResult<()> {
        check_range(start, count, self.length)?;
        if count == 0 {
            return Ok(());
        }
        if count == self.length {
            self.clear();
            return Ok(());
        }
        if count > self.length / 2 {
            let branching_factor = self.branching_factor;
            let mut elements = self.take_elements();
            drop(elements.drain(start..start + count));
            debug_log!(removed = count, "range removal rebuilt the tree");
            *self = Self::from_elements(elements, branching_factor, owner);
            return Ok(());
        }
        for _ in 0..count {
            self.remove_at(start, owner)?;
        }
        Ok(())
    }

    pub(crate) fn insert_range<I>(&mut self, index: usize, elements: I, owner: L::Owner) -> CollectionResult<usize>
    where
        I: IntoIterator<Item = T>,
    {
        check_insertion_point(index, self.length)?;
        let mut inserted = 0;
        for element in elements {
            self.insert(index + inserted, element, owner)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Moves every element out, leaving the tree empty. Shared nodes that are
    /// still referenced elsewhere have their elements cloned instead.
    pub(crate) fn take_elements(&mut self) -> Vec<T> {
        let mut elements = Vec::with_capacity(self.length);
        if let Some(root) = self.root.take() {
            Self::drain_into(root, &mut elements);
        }
        self.length = 0;
        elements
    }

    fn drain_into(link: L, elements: &mut Vec<T>) {
        match link.into_body() {
            NodeBody::Leaf(leaf) => elements.extend(leaf.into_elements()),
            NodeBody::Internal(internal) => {
                for child in internal.into_children() {
                    Self::drain_into(child, elements);
                }
            }
        }
    }

    /// Replaces the contents with a packed tree over `elements`.
    pub(crate) fn rebuild<I>(&mut self, elements: I, owner: L::Owner)
    where
        I: IntoIterator<Item = T>,
    {
        *self = Self::from_elements(elements, self.branching_factor, owner);
        debug_log!(length = self.length, "tree rebuilt");
    }

    /// Restores the packing invariant. Returns `false` when the tree was
    /// already packed and nothing changed.
    pub(crate) fn repack(&mut self, owner: L::Owner) -> bool {
        if self.is_packed() {
            return false;
        }
        let elements = self.take_elements();
        self.rebuild(elements, owner);
        true
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::MutableNode;
    use rstest::rstest;

    type BoxedTree = Tree<i32, Box<MutableNode<i32>>>;

    fn collect(tree: &BoxedTree) -> Vec<i32> {
        tree.iter().copied().collect()
    }

    #[rstest]
    fn test_appends_stay_packed() {
        let mut tree = BoxedTree::new(4);
        for element in 0..100 {
            tree.insert(tree.len(), element, ()).unwrap();
        }
        assert_eq!(tree.validate(ValidationRule::RequirePacked), Ok(()));
        assert_eq!(collect(&tree), (0..100).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_front_inserts_split_at_midpoint() {
        let mut tree = BoxedTree::new(4);
        for element in 0..50 {
            tree.insert(0, element, ()).unwrap();
        }
        assert_eq!(tree.validate(ValidationRule::None), Ok(()));
        assert_eq!(collect(&tree), (0..50).rev().collect::<Vec<_>>());
    }

    #[rstest]
    fn test_remove_collapses_root() {
        let mut tree = BoxedTree::from_elements(0..64, 4, ());
        for _ in 0..60 {
            tree.remove_at(0, ()).unwrap();
        }
        assert_eq!(tree.validate(ValidationRule::None), Ok(()));
        assert_eq!(collect(&tree), vec![60, 61, 62, 63]);
        assert!(matches!(tree.root().map(|root| root.body()), Some(NodeBody::Leaf(_))));
    }

    #[rstest]
    fn test_remove_last_element_clears_root() {
        let mut tree = BoxedTree::from_elements([7], 4, ());
        assert_eq!(tree.remove_at(0, ()), Ok(7));
        assert!(tree.root().is_none());
        assert_eq!(tree.len(), 0);
    }

    #[rstest]
    fn test_remove_range_large_rebuilds() {
        let mut tree = BoxedTree::from_elements(0..40, 4, ());
        tree.remove_range(5, 30, ()).unwrap();
        assert_eq!(collect(&tree), (0..5).chain(35..40).collect::<Vec<_>>());
        assert!(tree.is_packed());
    }

    #[rstest]
    fn test_repack_is_idempotent() {
        let mut tree = BoxedTree::from_elements(0..40, 4, ());
        tree.insert(3, 100, ()).unwrap();
        assert!(tree.repack(()));
        assert!(!tree.repack(()));
        assert!(tree.is_packed());
    }

    #[rstest]
    fn test_binary_search_by() {
        let tree = BoxedTree::from_elements((0..40).map(|element| element * 2), 4, ());
        assert_eq!(tree.binary_search_by(0, 40, |element| element.cmp(&10)), Ok(Ok(5)));
        assert_eq!(tree.binary_search_by(0, 40, |element| element.cmp(&11)), Ok(Err(6)));
        assert!(tree.binary_search_by(30, 20, |element| element.cmp(&0)).is_err());
    }

    #[rstest]
    fn test_find_last_index() {
        let tree = BoxedTree::from_elements([1, 2, 1, 2, 1], 4, ());
        assert_eq!(tree.find_last_index(0, 5, |element| *element == 2), Ok(Some(3)));
        assert_eq!(tree.find_last_index(0, 3, |element| *element == 2), Ok(Some(1)));
        assert_eq!(tree.find_index(2, 3, |element| *element == 2), Ok(Some(3)));
    }
}
