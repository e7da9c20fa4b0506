//! Property tests: coverage and ordering of recursive delete over random trees.

use proptest::prelude::*;
use std::collections::HashMap;
use ztree::{CreateMode, DeletionStatus, HierarchicalStore, MemoryStore, NodePath, TreeDeleter};

/// Random tree as a parent index per node; node 0 is the subtree root
fn tree_shape() -> impl Strategy<Value = Vec<usize>> {
    (1usize..40).prop_flat_map(|size| {
        (1..size)
            .map(|i| (0..i).boxed())
            .collect::<Vec<_>>()
    })
}

fn materialize(store: &MemoryStore, parents: &[usize]) -> Vec<NodePath> {
    let root = NodePath::parse("/t").unwrap();
    store.create(&root, b"", CreateMode::Persistent).unwrap();
    let mut paths = vec![root];
    for (i, parent) in parents.iter().enumerate() {
        let path = paths[*parent].join(&format!("n{}", i + 1)).unwrap();
        store.create(&path, b"", CreateMode::Persistent).unwrap();
        paths.push(path);
    }
    paths
}

proptest! {
    #[test]
    fn every_node_deleted_once_children_first(parents in tree_shape()) {
        let store = MemoryStore::new();
        let paths = materialize(&store, &parents);

        let report = TreeDeleter::new(&store).delete_tree(&paths[0]);

        prop_assert_eq!(report.outcomes().len(), paths.len());
        let position: HashMap<&NodePath, usize> = report
            .outcomes()
            .iter()
            .enumerate()
            .map(|(idx, outcome)| (&outcome.path, idx))
            .collect();
        prop_assert_eq!(position.len(), paths.len());
        for (child, parent) in parents.iter().enumerate() {
            let child_pos = position[&paths[child + 1]];
            let parent_pos = position[&paths[*parent]];
            prop_assert!(child_pos < parent_pos);
        }
        prop_assert!(report
            .outcomes()
            .iter()
            .all(|o| o.status == DeletionStatus::Deleted));
        prop_assert_eq!(store.node_count(), 1);
        prop_assert_eq!(store.exists(&paths[0]).unwrap(), None);
    }

    #[test]
    fn rerun_after_full_delete_is_not_found(parents in tree_shape()) {
        let store = MemoryStore::new();
        let paths = materialize(&store, &parents);
        let deleter = TreeDeleter::new(&store);
        deleter.delete_tree(&paths[0]);

        let again = deleter.delete_tree(&paths[0]);

        prop_assert_eq!(again.outcomes().len(), 1);
        prop_assert_eq!(&again.outcomes()[0].status, &DeletionStatus::NotFound);
    }
}
