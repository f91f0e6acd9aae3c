#![cfg(feature = "serde")]

//! Integration tests for serde support.
//!
//! Lists serialize as JSON arrays and dictionaries as JSON objects.

use canopy::tree::{ImmutableTreeList, ImmutableTreeListBuilder, TreeList, ValidationRule};
use rstest::rstest;

// =============================================================================
// Lists
// =============================================================================

#[rstest]
fn test_tree_list_json_roundtrip() {
    let list: TreeList<i32> = (1..=100).collect();
    let json = serde_json::to_string(&list).unwrap();
    let restored: TreeList<i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(list, restored);
    assert_eq!(restored.validate(ValidationRule::RequirePacked), Ok(()));
}

#[rstest]
fn test_tree_list_serializes_as_array() {
    let list: TreeList<&str> = ["a", "b"].into_iter().collect();
    assert_eq!(serde_json::to_string(&list).unwrap(), r#"["a","b"]"#);
}

#[rstest]
fn test_immutable_tree_list_json_roundtrip() {
    let list: ImmutableTreeList<String> = (0..20).map(|element| format!("item-{element}")).collect();
    let json = serde_json::to_string(&list).unwrap();
    let restored: ImmutableTreeList<String> = serde_json::from_str(&json).unwrap();
    assert_eq!(list, restored);
}

#[rstest]
fn test_empty_list_deserializes_to_canonical_empty() {
    let restored: ImmutableTreeList<i32> = serde_json::from_str("[]").unwrap();
    assert!(restored.ptr_eq(&ImmutableTreeList::empty()));
}

#[rstest]
fn test_builder_json_roundtrip() {
    let builder: ImmutableTreeListBuilder<u8> = serde_json::from_str("[3, 1, 2]").unwrap();
    assert_eq!(builder.to_vec(), vec![3, 1, 2]);
    assert_eq!(serde_json::to_string(&builder).unwrap(), "[3,1,2]");
}

#[rstest]
fn test_invalid_json_is_rejected() {
    let result: Result<TreeList<i32>, _> = serde_json::from_str(r#"{"a": 1}"#);
    assert!(result.is_err());
}

// =============================================================================
// Ordered adapters
// =============================================================================

#[cfg(feature = "ordered")]
mod ordered {
    use canopy::ordered::{
        ImmutableHashTreeDictionary, ImmutableHashTreeSet, ImmutableSortedTreeDictionary,
        ImmutableSortedTreeSet,
    };
    use rstest::rstest;

    #[rstest]
    fn test_sorted_set_deserialization_sorts_and_dedups() {
        let set: ImmutableSortedTreeSet<i32> = serde_json::from_str("[5, 1, 5, 3]").unwrap();
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![1, 3, 5]);
        assert_eq!(serde_json::to_string(&set).unwrap(), "[1,3,5]");
    }

    #[rstest]
    fn test_sorted_dictionary_serializes_as_object() {
        let dictionary: ImmutableSortedTreeDictionary<String, i32> =
            [("b".to_string(), 2), ("a".to_string(), 1)].into_iter().collect();
        let json = serde_json::to_string(&dictionary).unwrap();
        assert_eq!(json, r#"{"a":1,"b":2}"#);
        let restored: ImmutableSortedTreeDictionary<String, i32> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(dictionary, restored);
    }

    #[rstest]
    fn test_hash_adapters_json_roundtrip() {
        let set: ImmutableHashTreeSet<u32> = (0..50).collect();
        let restored: ImmutableHashTreeSet<u32> =
            serde_json::from_str(&serde_json::to_string(&set).unwrap()).unwrap();
        assert_eq!(set, restored);

        let dictionary: ImmutableHashTreeDictionary<String, bool> =
            [("x".to_string(), true), ("y".to_string(), false)].into_iter().collect();
        let restored: ImmutableHashTreeDictionary<String, bool> =
            serde_json::from_str(&serde_json::to_string(&dictionary).unwrap()).unwrap();
        assert_eq!(dictionary, restored);
    }
}
