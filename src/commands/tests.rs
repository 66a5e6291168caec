//! Command Integration Tests
//!
//! End-to-end runs of the tree commands against SQLite.

#[cfg(test)]
mod tests {
    use crate::commands::*;
    use crate::config::EngineConfig;
    use crate::domain::{
        CascadePolicy, DomainError, DomainResult, LifecycleViolation, NewNode, NodeId, ScopeId,
        StructuralViolation, TreeNode,
    };
    use crate::repository::init_db;
    use crate::AppState;
    use std::path::PathBuf;
    use std::sync::Arc;

    const CATEGORY: &str = "category";
    const MASTER: &str = "master_category";
    const TENANT: Option<ScopeId> = Some(1);

    fn setup_state() -> AppState {
        let mut config = EngineConfig::default();
        config.database_path = PathBuf::from(":memory:");
        let db_state = init_db(&config.database_path).expect("Failed to init test DB");
        AppState::new(db_state, config)
    }

    async fn add(state: &AppState, parent_id: Option<NodeId>, name: &str) -> TreeNode {
        create_node(
            state,
            CATEGORY,
            NewNode::new(TENANT, parent_id, name, name.to_lowercase()),
        )
        .await
        .expect("Failed to create")
    }

    async fn add_global(state: &AppState, parent_id: Option<NodeId>, name: &str) -> TreeNode {
        create_node(state, MASTER, NewNode::new(None, parent_id, name, name.to_lowercase()))
            .await
            .expect("Failed to create")
    }

    async fn child_order(state: &AppState, parent_id: Option<NodeId>) -> Vec<(NodeId, i32)> {
        get_children(state, CATEGORY, TENANT, parent_id)
            .await
            .unwrap()
            .into_iter()
            .map(|n| (n.id, n.priority))
            .collect()
    }

    async fn fetch(state: &AppState, id: NodeId) -> TreeNode {
        get_node(state, CATEGORY, TENANT, id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_move_before_first_sibling() {
        let state = setup_state();
        let r = add(&state, None, "R").await;
        let c1 = add(&state, Some(r.id), "C1").await;
        let c2 = add(&state, Some(r.id), "C2").await;

        move_node(&state, CATEGORY, TENANT, c2.id, Some(r.id), None)
            .await
            .expect("Move failed");

        assert_eq!(child_order(&state, Some(r.id)).await, vec![(c2.id, 1), (c1.id, 2)]);
    }

    #[tokio::test]
    async fn test_reparent_rewrites_paths_and_closes_gap() {
        let state = setup_state();
        let shoes = add(&state, None, "Shoes").await;
        let boots = add(&state, Some(shoes.id), "Boots").await;
        let heels = add(&state, Some(shoes.id), "Heels").await;
        let winter = add(&state, Some(boots.id), "Winter").await;
        let sale = add(&state, None, "Sale").await;

        let touched = move_node(&state, CATEGORY, TENANT, boots.id, Some(sale.id), None)
            .await
            .unwrap();
        assert!(touched.iter().any(|n| n.id == winter.id));

        let boots = fetch(&state, boots.id).await;
        let winter = fetch(&state, winter.id).await;
        assert_eq!(boots.path, format!("{}/{}", sale.id, boots.id));
        assert_eq!(winter.path, format!("{}/{}/{}", sale.id, boots.id, winter.id));
        assert_eq!(winter.depth, 3);
        assert_eq!(child_order(&state, Some(shoes.id)).await, vec![(heels.id, 1)]);
    }

    #[tokio::test]
    async fn test_cycle_rejected_and_nothing_written() {
        let state = setup_state();
        let a = add(&state, None, "A").await;
        let b = add(&state, Some(a.id), "B").await;
        let c = add(&state, Some(b.id), "C").await;

        let err = move_node(&state, CATEGORY, TENANT, a.id, Some(c.id), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Structural(StructuralViolation::Cycle { .. })));

        let a_after = fetch(&state, a.id).await;
        assert_eq!(a_after.parent_id, None);
        assert_eq!(a_after.path, a.path);
        assert_eq!(fetch(&state, c.id).await.path, c.path);
    }

    #[tokio::test]
    async fn test_depth_limit_on_move() {
        let state = setup_state();
        // host chain depth 1..3
        let mut host = None;
        for i in 0..3 {
            host = Some(add(&state, host.map(|n: TreeNode| n.id), &format!("H{}", i)).await);
        }
        let host = host.unwrap();

        // subtree of four levels
        let top = add(&state, None, "S0").await;
        let mut last = top.clone();
        for i in 1..4 {
            last = add(&state, Some(last.id), &format!("S{}", i)).await;
        }

        let err = move_node(&state, CATEGORY, TENANT, top.id, Some(host.id), None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::Structural(StructuralViolation::DepthExceeded {
                node_id: top.id,
                depth: 7,
                max_depth: 6,
            })
        );
        assert_eq!(fetch(&state, last.id).await.depth, 4);

        // global hierarchies are unbounded
        let mut node = add_global(&state, None, "G0").await;
        for i in 1..10 {
            node = add_global(&state, Some(node.id), &format!("G{}", i)).await;
        }
        assert_eq!(node.depth, 10);
    }

    #[tokio::test]
    async fn test_manual_cascade_is_hierarchy_default() {
        let state = setup_state();
        let a = add(&state, None, "A").await;
        let a1 = add(&state, Some(a.id), "A1").await;

        let err = set_active(&state, CATEGORY, TENANT, a.id, false, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Lifecycle(LifecycleViolation::ActiveChildren { .. })));
        assert!(fetch(&state, a.id).await.is_active);

        set_active(&state, CATEGORY, TENANT, a1.id, false, None).await.unwrap();
        set_active(&state, CATEGORY, TENANT, a.id, false, None).await.unwrap();
        assert!(!fetch(&state, a.id).await.is_active);

        // caller can override the hierarchy default
        let b = add(&state, None, "B").await;
        add(&state, Some(b.id), "B1").await;
        let automatic = Some(CascadePolicy::Automatic);
        let touched = set_active(&state, CATEGORY, TENANT, b.id, false, automatic)
            .await
            .unwrap();
        assert_eq!(touched.len(), 2);
    }

    #[tokio::test]
    async fn test_automatic_cascade_and_reactivation() {
        let state = setup_state();
        let a = add_global(&state, None, "A").await;
        let a1 = add_global(&state, Some(a.id), "A1").await;
        let a11 = add_global(&state, Some(a1.id), "A11").await;

        let touched = set_active(&state, MASTER, None, a.id, false, None).await.unwrap();
        let mut ids: Vec<_> = touched.iter().map(|n| n.id).collect();
        ids.sort();
        assert_eq!(ids, vec![a.id, a1.id, a11.id]);

        let err = set_active(&state, MASTER, None, a11.id, true, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Lifecycle(LifecycleViolation::InactiveAncestor { .. })));

        set_active(&state, MASTER, None, a.id, true, None).await.unwrap();
        set_active(&state, MASTER, None, a1.id, true, None).await.unwrap();
        set_active(&state, MASTER, None, a11.id, true, None).await.unwrap();

        // inactive nodes are left out of subtrees
        let tree = get_subtree(&state, MASTER, None, a.id).await.unwrap();
        assert_eq!(tree.node_count(), 3);
    }

    #[tokio::test]
    async fn test_associations_block_manual_deactivation() {
        let state = setup_state().with_associations(|node: &TreeNode| -> DomainResult<bool> {
            Ok(node.code == "shoes")
        });
        let shoes = add(&state, None, "Shoes").await;
        let hats = add(&state, None, "Hats").await;

        let err = set_active(&state, CATEGORY, TENANT, shoes.id, false, None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::Lifecycle(LifecycleViolation::HasAssociations { node_id: shoes.id })
        );
        set_active(&state, CATEGORY, TENANT, hats.id, false, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_subtree_and_breadcrumb() {
        let state = setup_state();
        let r = add(&state, None, "R").await;
        let a = add(&state, Some(r.id), "A").await;
        let b = add(&state, Some(r.id), "B").await;
        let a1 = add(&state, Some(a.id), "A1").await;
        set_active(&state, CATEGORY, TENANT, b.id, false, None).await.unwrap();

        let tree = get_subtree(&state, CATEGORY, TENANT, r.id).await.unwrap();
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].node.id, a.id);
        assert_eq!(tree.children[0].children[0].node.id, a1.id);

        let crumbs: Vec<_> = get_ancestors(&state, CATEGORY, TENANT, a1.id)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert_eq!(crumbs, vec!["R", "A"]);

        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["name"], "R");
        assert_eq!(json["children"][0]["name"], "A");
    }

    #[tokio::test]
    async fn test_rename_and_request_errors() {
        let state = setup_state();
        let r = add(&state, None, "R").await;

        let renamed = rename_node(&state, CATEGORY, TENANT, r.id, Some("Root".into()), None)
            .await
            .unwrap();
        assert_eq!(renamed.name, "Root");
        assert_eq!(fetch(&state, r.id).await.name, "Root");

        let err = rename_node(&state, CATEGORY, TENANT, r.id, None, Some(" ".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        assert!(matches!(
            get_node(&state, "brand", TENANT, r.id).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            get_node(&state, CATEGORY, None, r.id).await,
            Err(DomainError::InvalidInput(_))
        ));
        assert!(get_node(&state, CATEGORY, Some(2), r.id).await.unwrap().is_none());
        assert!(matches!(
            move_node(&state, CATEGORY, TENANT, r.id, Some(404), None).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_moves_keep_priorities_dense() {
        let state = Arc::new(setup_state());
        let left = add(&state, None, "Left").await;
        let right = add(&state, None, "Right").await;
        let mut kids = Vec::new();
        for i in 0..8 {
            kids.push(add(&state, Some(left.id), &format!("K{}", i)).await);
        }

        let mut handles = Vec::new();
        for (i, kid) in kids.iter().enumerate() {
            let state = Arc::clone(&state);
            let target = if i % 2 == 0 { right.id } else { left.id };
            let kid_id = kid.id;
            handles.push(tokio::spawn(async move {
                move_node(&state, CATEGORY, TENANT, kid_id, Some(target), None).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for parent in [None, Some(left.id), Some(right.id)] {
            let priorities: Vec<i32> = child_order(&state, parent)
                .await
                .into_iter()
                .map(|(_, p)| p)
                .collect();
            assert_eq!(priorities, (1..=priorities.len() as i32).collect::<Vec<_>>());
        }
        assert_eq!(child_order(&state, Some(right.id)).await.len(), 4);
    }

    #[tokio::test]
    async fn test_on_disk_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = EngineConfig::default();
        config.database_path = dir.path().join("tree.db");

        let id = {
            let state = AppState::open(config.clone()).unwrap();
            add(&state, None, "Persisted").await.id
        };

        let state = AppState::open(config).unwrap();
        let node = fetch(&state, id).await;
        assert_eq!(node.name, "Persisted");
        assert_eq!(node.path, id.to_string());
    }
}
