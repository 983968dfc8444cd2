use orchestrator_state::{apply, find, NodePatch, NodeType, PatchError, Tree, ValueNode};
use proptest::prelude::*;
use proptest::sample::Index;
use serde_json::json;

fn int(v: i64) -> ValueNode {
    ValueNode::scalar(NodeType::Int, json!(v))
}

fn build(groups: &[Vec<i64>]) -> Tree {
    let fields = groups.iter().enumerate().map(|(i, values)| {
        let group = ValueNode::object(
            NodeType::DataService,
            [
                (
                    "items".to_string(),
                    ValueNode::list(values.iter().copied().map(int)),
                ),
                ("total".to_string(), int(values.iter().sum())),
            ],
        );
        (format!("group{i}"), group)
    });
    Tree::new(ValueNode::object(NodeType::DataService, fields)).unwrap()
}

fn groups_strategy() -> impl Strategy<Value = Vec<Vec<i64>>> {
    prop::collection::vec(prop::collection::vec(-1000i64..1000, 0..6), 1..5)
}

fn list_len(tree: &Tree, group: usize) -> usize {
    find(tree, &format!("group{group}.items").parse().unwrap())
        .unwrap()
        .value
        .as_list()
        .unwrap()
        .len()
}

proptest! {
    #[test]
    fn prop_patch_with_current_fields_is_noop(groups in groups_strategy(), g in any::<Index>(), e in any::<Index>()) {
        let tree = build(&groups);
        let g = g.index(groups.len());
        let path = if groups[g].is_empty() {
            format!("group{g}.total")
        } else {
            format!("group{g}.items[{}]", e.index(groups[g].len()))
        };
        let current = find(&tree, &path.parse().unwrap()).unwrap();
        let next = apply(&tree, &path, &NodePatch::from(current)).unwrap();
        prop_assert_eq!(next, tree);
    }

    #[test]
    fn prop_patch_only_touches_target_subtree(groups in groups_strategy(), g in any::<Index>(), v in any::<i64>()) {
        let tree = build(&groups);
        let before = tree.clone();
        let g = g.index(groups.len());
        let next = apply(&tree, &format!("group{g}.total"), &NodePatch::new().with("value", json!(v))).unwrap();

        prop_assert_eq!(&tree, &before);
        for (name, node) in tree.fields() {
            if name != &format!("group{g}") {
                prop_assert_eq!(&next.fields()[name.as_str()], node);
            }
        }
        let group = &next.fields()[format!("group{g}").as_str()];
        prop_assert_eq!(group.field("items"), tree.fields()[format!("group{g}").as_str()].field("items"));
        prop_assert_eq!(group.field("total").and_then(|n| n.value.as_scalar()), Some(&json!(v)));
    }

    #[test]
    fn prop_lists_grow_only_at_append_slot(groups in groups_strategy(), g in any::<Index>(), v in any::<i64>()) {
        let tree = build(&groups);
        let g = g.index(groups.len());
        let len = groups[g].len();

        let grown = apply(&tree, &format!("group{g}.items[{len}]"), &int(v).into()).unwrap();
        prop_assert_eq!(list_len(&grown, g), len + 1);

        let err = apply(&tree, &format!("group{g}.items[{}]", len + 1), &int(v).into()).unwrap_err();
        let is_out_of_range = matches!(err, PatchError::IndexOutOfRange { .. });
        prop_assert!(is_out_of_range);
        prop_assert_eq!(list_len(&tree, g), len);
    }

    #[test]
    fn prop_traversal_is_strict(groups in groups_strategy(), g in any::<Index>()) {
        let tree = build(&groups);
        let g = g.index(groups.len());
        let len = groups[g].len();

        let past_end = format!("group{g}.items[{len}].value");
        prop_assert!(apply(&tree, &past_end, &int(1).into()).is_err());
        prop_assert!(apply(&tree, "missing.items[0]", &int(1).into()).is_err());
        let missing_group = format!("group{}.items[0]", groups.len());
        prop_assert!(apply(&tree, &missing_group, &int(1).into()).is_err());
    }
}
