//! Integration tests for ImmutableTreeListBuilder.

use canopy::tree::{ImmutableTreeList, ImmutableTreeListBuilder, Span, ValidationRule};
use rstest::rstest;

#[rstest]
fn test_two_builders_from_one_snapshot_are_independent() {
    let snapshot: ImmutableTreeList<i32> = (0..200).collect();
    let mut left = snapshot.to_builder();
    let mut right = snapshot.to_builder();

    left.set(0, -1).unwrap();
    left.remove_range(100, 50).unwrap();
    right.insert(0, 1000).unwrap();
    right.set(199, -199).unwrap();

    let left = left.to_immutable();
    let right = right.to_immutable();

    assert_eq!(left.len(), 150);
    assert_eq!(left[0], -1);
    assert_eq!(left[100], 150);
    assert_eq!(right.len(), 201);
    assert_eq!(right[0], 1000);
    assert_eq!(right[1], 0);
    assert_eq!(right[200], -199);
    assert_eq!(snapshot.to_vec(), (0..200).collect::<Vec<_>>());
    for list in [&snapshot, &left, &right] {
        assert_eq!(list.validate(ValidationRule::None), Ok(()));
    }
}

#[rstest]
fn test_publish_then_keep_editing() {
    let mut builder = ImmutableTreeListBuilder::with_branching_factor(4).unwrap();
    builder.add_range(0..50);
    let first = builder.to_immutable();

    builder.add(50);
    builder.set(0, 100).unwrap();
    let second = builder.to_immutable();

    assert_eq!(first.len(), 50);
    assert_eq!(first[0], 0);
    assert_eq!(second.len(), 51);
    assert_eq!(second[0], 100);
    assert!(!first.ptr_eq(&second));
}

#[rstest]
fn test_unchanged_builder_publishes_same_snapshot() {
    let snapshot: ImmutableTreeList<i32> = (0..10).collect();
    let mut builder = snapshot.to_builder();
    assert!(builder.to_immutable().ptr_eq(&snapshot));
    assert_eq!(builder.remove_all(|element| *element > 100), 0);
    assert!(!builder.remove(&42));
    assert!(builder.to_immutable().ptr_eq(&snapshot));
}

#[rstest]
fn test_get_mut_copies_frozen_path() {
    let snapshot: ImmutableTreeList<String> = (0..40).map(|element| element.to_string()).collect();
    let mut builder = snapshot.to_builder();
    if let Some(element) = builder.get_mut(25) {
        element.push_str("!!");
    }
    let edited = builder.to_immutable();
    assert_eq!(edited[25], "25!!");
    assert_eq!(snapshot[25], "25");
}

#[rstest]
fn test_bulk_edits() {
    let mut builder: ImmutableTreeListBuilder<i32> = (0..30).collect();
    assert_eq!(builder.remove_all(|element| element % 3 == 0), 10);
    assert!(builder.replace(&1, 100));
    builder
        .sort_range_by(Span::new(0, 5).unwrap(), |left, right| right.cmp(left))
        .unwrap();
    builder.reverse_range(Span::new(15, 20).unwrap()).unwrap();
    builder.insert_range(0, [-1, -2]).unwrap();

    let mut model: Vec<i32> = (0..30).filter(|element| element % 3 != 0).collect();
    model[0] = 100;
    model[0..5].sort_by(|left, right| right.cmp(left));
    model[15..20].reverse();
    model.splice(0..0, [-1, -2]);

    assert_eq!(builder.to_vec(), model);
    builder.trim_excess();
    assert_eq!(builder.validate(ValidationRule::RequirePacked), Ok(()));
    assert_eq!(builder.to_immutable().to_vec(), model);
}

#[rstest]
fn test_clear_publishes_canonical_empty() {
    let mut builder: ImmutableTreeListBuilder<i32> = (0..10).collect();
    builder.clear();
    assert!(builder.is_empty());
    assert!(builder.to_immutable().ptr_eq(&ImmutableTreeList::empty()));
}
