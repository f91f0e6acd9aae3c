//! Property-based tests for the tree lists.
//!
//! Every list is driven with random operations alongside a `Vec` and must
//! agree with it element for element while keeping a valid tree shape.

use canopy::tree::{ImmutableTreeList, Span, TreeList, ValidationRule};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Operation {
    Add(i32),
    Insert(usize, i32),
    Set(usize, i32),
    RemoveAt(usize),
    RemoveRange(usize, usize),
    Reverse,
}

fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        3 => any::<i32>().prop_map(Operation::Add),
        3 => (any::<usize>(), any::<i32>()).prop_map(|(index, value)| Operation::Insert(index, value)),
        1 => (any::<usize>(), any::<i32>()).prop_map(|(index, value)| Operation::Set(index, value)),
        2 => any::<usize>().prop_map(Operation::RemoveAt),
        1 => (any::<usize>(), 0..8usize).prop_map(|(start, count)| Operation::RemoveRange(start, count)),
        1 => Just(Operation::Reverse),
    ]
}

/// Applies `operation` to the model, scaling indices into range.
/// Returns `false` if the operation does not apply to an empty model.
fn apply_to_model(model: &mut Vec<i32>, operation: &mut Operation) -> bool {
    match operation {
        Operation::Add(value) => model.push(*value),
        Operation::Insert(index, value) => {
            *index %= model.len() + 1;
            model.insert(*index, *value);
        }
        Operation::Set(index, value) => {
            if model.is_empty() {
                return false;
            }
            *index %= model.len();
            model[*index] = *value;
        }
        Operation::RemoveAt(index) => {
            if model.is_empty() {
                return false;
            }
            *index %= model.len();
            model.remove(*index);
        }
        Operation::RemoveRange(start, count) => {
            *start %= model.len() + 1;
            *count = (*count).min(model.len() - *start);
            drop(model.drain(*start..*start + *count));
        }
        Operation::Reverse => model.reverse(),
    }
    true
}

proptest! {
    /// TreeList agrees with Vec under any sequence of edits.
    #[test]
    fn prop_tree_list_matches_vec(
        branching_factor in 4..12usize,
        operations in prop::collection::vec(operation(), 0..200)
    ) {
        let mut list = TreeList::with_branching_factor(branching_factor).unwrap();
        let mut model = Vec::new();
        for mut operation in operations {
            if !apply_to_model(&mut model, &mut operation) {
                continue;
            }
            match operation {
                Operation::Add(value) => list.add(value),
                Operation::Insert(index, value) => list.insert(index, value).unwrap(),
                Operation::Set(index, value) => {
                    list.set(index, value).unwrap();
                }
                Operation::RemoveAt(index) => {
                    list.remove_at(index).unwrap();
                }
                Operation::RemoveRange(start, count) => list.remove_range(start, count).unwrap(),
                Operation::Reverse => list.reverse(),
            }
            prop_assert_eq!(list.len(), model.len());
        }
        prop_assert_eq!(list.validate(ValidationRule::None), Ok(()));
        prop_assert_eq!(list.to_vec(), model);
    }

    /// Every intermediate ImmutableTreeList keeps its contents.
    #[test]
    fn prop_immutable_versions_are_persistent(
        operations in prop::collection::vec(operation(), 0..80)
    ) {
        let mut history = vec![(ImmutableTreeList::with_branching_factor(4).unwrap(), Vec::new())];
        for mut operation in operations {
            let (list, model) = history.last().cloned().unwrap();
            let mut model = model;
            if !apply_to_model(&mut model, &mut operation) {
                continue;
            }
            let next = match operation {
                Operation::Add(value) => list.add(value),
                Operation::Insert(index, value) => list.insert(index, value).unwrap(),
                Operation::Set(index, value) => list.set(index, value).unwrap(),
                Operation::RemoveAt(index) => list.remove_at(index).unwrap(),
                Operation::RemoveRange(start, count) => list.remove_range(start, count).unwrap(),
                Operation::Reverse => list.reverse(),
            };
            history.push((next, model));
        }
        for (list, model) in &history {
            prop_assert_eq!(list.validate(ValidationRule::None), Ok(()));
            prop_assert_eq!(&list.to_vec(), model);
        }
    }

    /// Appending only ever produces a packed tree.
    #[test]
    fn prop_append_only_is_packed(
        branching_factor in 4..40usize,
        length in 0..600usize
    ) {
        let mut list = TreeList::with_branching_factor(branching_factor).unwrap();
        list.add_range(0..length);
        prop_assert_eq!(list.validate(ValidationRule::RequirePacked), Ok(()));
        prop_assert_eq!(list.len(), length);
    }

    /// trim_excess repacks without reordering.
    #[test]
    fn prop_trim_excess_preserves_order(
        elements in prop::collection::vec(any::<i16>(), 0..300),
        removals in prop::collection::vec(any::<usize>(), 0..100)
    ) {
        let mut list: TreeList<i16> = elements.iter().copied().collect();
        for removal in removals {
            if list.is_empty() {
                break;
            }
            list.remove_at(removal % list.len()).unwrap();
        }
        let before = list.to_vec();
        list.trim_excess();
        prop_assert_eq!(list.validate(ValidationRule::RequirePacked), Ok(()));
        prop_assert_eq!(list.to_vec(), before);
    }

    /// sort agrees with a stable Vec sort.
    #[test]
    fn prop_sort_by_key_is_stable(elements in prop::collection::vec(any::<(u8, u16)>(), 0..200)) {
        let mut list: TreeList<(u8, u16)> = elements.iter().copied().collect();
        let mut model = elements;
        list.sort_by_key(|element| element.0);
        model.sort_by_key(|element| element.0);
        prop_assert_eq!(list.to_vec(), model);
    }

    /// get_range is the slice of the same span.
    #[test]
    fn prop_get_range_is_slice(
        elements in prop::collection::vec(any::<i32>(), 0..200),
        first in any::<usize>(),
        second in any::<usize>()
    ) {
        let list: ImmutableTreeList<i32> = elements.iter().copied().collect();
        let first = first % (elements.len() + 1);
        let second = second % (elements.len() + 1);
        let span = Span::new(first.min(second), first.max(second)).unwrap();
        let range = list.get_range(span).unwrap();
        prop_assert_eq!(range.to_vec(), elements[span.start()..span.end()].to_vec());
    }
}

// =============================================================================
// Random drain
// =============================================================================

/// Linear congruential generator so the drain below is reproducible.
struct Lcg(u64);

impl Lcg {
    fn next_below(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 33) as usize) % bound
    }
}

#[test]
fn test_random_removals_until_empty() {
    for seed in [1, 7, 42] {
        let mut random = Lcg(seed);
        let mut list: TreeList<u32> = (0..320).collect();
        let mut model: Vec<u32> = (0..320).collect();
        while !model.is_empty() {
            let index = random.next_below(model.len());
            assert_eq!(list.remove_at(index), Ok(model.remove(index)));
            assert_eq!(list.validate(ValidationRule::None), Ok(()));
            assert_eq!(list.to_vec(), model);
        }
        assert!(list.is_empty());
        assert_eq!(list.iter().next(), None);
    }
}

#[test]
fn test_random_removals_through_builder() {
    let mut random = Lcg(3);
    let snapshot: ImmutableTreeList<u32> = (0..320).collect();
    let mut builder = snapshot.to_builder();
    let mut model: Vec<u32> = (0..320).collect();
    while !model.is_empty() {
        let index = random.next_below(model.len());
        assert_eq!(builder.remove_at(index), Ok(model.remove(index)));
        assert_eq!(builder.to_vec(), model);
    }
    assert!(builder.to_immutable().ptr_eq(&ImmutableTreeList::empty()));
    assert_eq!(snapshot.len(), 320);
}
