//! Integration tests for version-checked cursors.

use canopy::error::CollectionError;
use canopy::tree::{
    Cursor, CursorSource, ImmutableTreeList, ImmutableTreeListBuilder, Span, TreeList,
    ValidationRule,
};
use rstest::rstest;

fn drain<S>(cursor: &mut Cursor<S>, source: &S) -> Vec<S::Item>
where
    S: CursorSource,
    S::Item: Clone,
{
    let mut seen = Vec::new();
    while let Ok(Some(element)) = cursor.advance(source) {
        seen.push(element.clone());
    }
    seen
}

#[rstest]
fn test_cursor_walks_span() {
    let list: TreeList<i32> = (0..100).collect();
    let mut cursor = list.cursor(Span::new(40, 45).unwrap()).unwrap();
    assert_eq!(cursor.remaining(), 5);
    assert_eq!(cursor.current(&list), Ok(None));
    assert_eq!(drain(&mut cursor, &list), vec![40, 41, 42, 43, 44]);
    assert_eq!(cursor.current(&list), Ok(Some(&44)));
    assert_eq!(cursor.advance(&list), Ok(None));
    assert_eq!(cursor.remaining(), 0);
}

#[rstest]
fn test_cursor_rejects_span_outside_list() {
    let list: TreeList<i32> = (0..3).collect();
    assert!(matches!(
        list.cursor(Span::new(1, 4).unwrap()),
        Err(CollectionError::InvalidRange { .. })
    ));
}

#[rstest]
fn test_structural_change_invalidates_cursor() {
    let mut list: TreeList<i32> = (0..10).collect();
    let mut cursor = list.cursor(Span::full(list.len())).unwrap();
    cursor.advance(&list).unwrap();
    list.remove_at(5).unwrap();
    assert!(matches!(
        cursor.advance(&list),
        Err(CollectionError::ConcurrentModification { .. })
    ));
    assert!(cursor.current(&list).is_err());
    cursor.reset();
    assert!(cursor.advance(&list).is_err());
}

#[rstest]
fn test_set_keeps_cursor_valid() {
    let mut list: TreeList<i32> = (0..5).collect();
    let mut cursor = list.cursor(Span::full(list.len())).unwrap();
    list.set(4, 40).unwrap();
    assert_eq!(drain(&mut cursor, &list), vec![0, 1, 2, 3, 40]);
}

#[rstest]
fn test_reset_replays_span() {
    let list: TreeList<char> = "abc".chars().collect();
    let mut cursor = list.cursor(Span::full(3)).unwrap();
    assert_eq!(drain(&mut cursor, &list), vec!['a', 'b', 'c']);
    cursor.reset();
    assert_eq!(cursor.position(), 0);
    assert_eq!(drain(&mut cursor, &list), vec!['a', 'b', 'c']);
}

#[rstest]
fn test_immutable_cursor_is_never_invalidated() {
    let list: ImmutableTreeList<i32> = (0..6).collect();
    let mut cursor = list.cursor(Span::new(2, 6).unwrap()).unwrap();
    let _updated = list.remove_at(0).unwrap();
    assert_eq!(drain(&mut cursor, &list), vec![2, 3, 4, 5]);
}

#[rstest]
fn test_builder_cursor_tracks_structural_edits() {
    let mut builder: ImmutableTreeListBuilder<i32> = (0..6).collect();
    let mut cursor = builder.cursor(Span::full(6)).unwrap();
    assert_eq!(cursor.advance(&builder), Ok(Some(&0)));
    builder.add(6);
    assert!(matches!(
        cursor.advance(&builder),
        Err(CollectionError::ConcurrentModification { .. })
    ));
}

// =============================================================================
// Invalidation by every structural mutator
// =============================================================================

/// A list built by prepending, so its leaves are only half full.
fn unpacked_list() -> TreeList<i32> {
    let mut list = TreeList::with_branching_factor(4).unwrap();
    for element in 0..40 {
        list.insert(0, element).unwrap();
    }
    list
}

#[rstest]
#[case::add(|list: &mut TreeList<i32>| list.add(40))]
#[case::insert(|list: &mut TreeList<i32>| list.insert(7, 40).unwrap())]
#[case::insert_range(|list: &mut TreeList<i32>| list.insert_range(3, [1, 2]).unwrap())]
#[case::remove_at(|list: &mut TreeList<i32>| { list.remove_at(5).unwrap(); })]
#[case::remove_range(|list: &mut TreeList<i32>| list.remove_range(10, 20).unwrap())]
#[case::remove_all(|list: &mut TreeList<i32>| { list.remove_all(|element| element % 2 == 0); })]
#[case::clear(|list: &mut TreeList<i32>| list.clear())]
#[case::sort(|list: &mut TreeList<i32>| list.sort())]
#[case::reverse(|list: &mut TreeList<i32>| list.reverse())]
#[case::trim_excess(|list: &mut TreeList<i32>| list.trim_excess())]
fn test_structural_mutator_invalidates_cursor(#[case] mutate: fn(&mut TreeList<i32>)) {
    let mut list = unpacked_list();
    assert!(list.validate(ValidationRule::RequirePacked).is_err());
    let mut cursor = list.cursor(Span::full(list.len())).unwrap();
    assert_eq!(cursor.advance(&list), Ok(Some(&39)));

    mutate(&mut list);

    assert!(matches!(
        cursor.advance(&list),
        Err(CollectionError::ConcurrentModification { .. })
    ));
}

// =============================================================================
// Cursors are bound to one instance
// =============================================================================

#[rstest]
fn test_reassigned_list_invalidates_cursor() {
    let mut list: TreeList<i32> = (0..10).collect();
    let mut cursor = list.cursor(Span::full(10)).unwrap();
    assert_eq!(cursor.advance(&list), Ok(Some(&0)));

    list = (100..110).collect();
    assert_eq!(list.version(), 0);
    assert!(matches!(
        cursor.advance(&list),
        Err(CollectionError::ConcurrentModification { .. })
    ));
}

#[rstest]
fn test_cursor_does_not_walk_a_clone() {
    let list: TreeList<i32> = (0..10).collect();
    let copy = list.clone();
    let mut cursor = list.cursor(Span::full(10)).unwrap();
    assert!(cursor.advance(&copy).is_err());
    assert_eq!(cursor.advance(&list), Ok(Some(&0)));
}

#[rstest]
fn test_reassigned_builder_invalidates_cursor() {
    let snapshot: ImmutableTreeList<i32> = (0..10).collect();
    let mut builder = snapshot.to_builder();
    let mut cursor = builder.cursor(Span::full(10)).unwrap();
    assert_eq!(cursor.advance(&builder), Ok(Some(&0)));

    builder = snapshot.to_builder();
    assert!(matches!(
        cursor.advance(&builder),
        Err(CollectionError::ConcurrentModification { .. })
    ));
}

#[rstest]
fn test_publishing_keeps_builder_cursor_valid() {
    let mut builder: ImmutableTreeListBuilder<i32> = (0..4).collect();
    let mut cursor = builder.cursor(Span::full(4)).unwrap();
    assert_eq!(cursor.advance(&builder), Ok(Some(&0)));
    let _snapshot = builder.to_immutable();
    assert_eq!(drain(&mut cursor, &builder), vec![1, 2, 3]);
}
