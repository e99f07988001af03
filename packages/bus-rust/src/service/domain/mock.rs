//! In-memory implementations of the node manager contracts.

use anyhow::bail;

use crate::service::context::ExecutionContext;

use super::params::{
    CreateListCommandParams, DisplayNodeTreeCommandParams, Node, NodeCommandResult, NodeTree,
    ShowNodeQueryParams, TreeStats, ValidationError,
};
use super::services::{ListService, NodeService, TreeService};

/// Id given to every list created by [`MockListService`].
pub const MOCK_LIST_ID: i64 = 42;

fn node(id: i64, title: &str, description: &str) -> Node {
    Node {
        id,
        title: title.to_string(),
        description: description.to_string(),
    }
}

/// Serves a fixed three-node tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockTreeService;

impl MockTreeService {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TreeService for MockTreeService {
    fn display_tree(
        &self,
        _ctx: &ExecutionContext,
        params: &DisplayNodeTreeCommandParams,
    ) -> anyhow::Result<NodeTree> {
        if params.max_depth <= 0 {
            bail!("max depth must be positive, got {}", params.max_depth);
        }
        let mut nodes = vec![
            node(1, "Root Node", "The root of the tree"),
            node(2, "Child Node 1", "First child"),
            node(3, "Child Node 2", "Second child"),
        ];
        let total_nodes = nodes.len();
        let keep = usize::try_from(params.max_depth)
            .map_or(total_nodes, |depth| depth.saturating_add(1));
        nodes.truncate(keep);
        Ok(NodeTree {
            nodes,
            stats: TreeStats {
                total_nodes,
                max_depth: 2,
            },
        })
    }
}

/// Accepts any titled list and assigns it [`MOCK_LIST_ID`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MockListService;

impl MockListService {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ListService for MockListService {
    fn create_list(
        &self,
        _ctx: &ExecutionContext,
        params: &CreateListCommandParams,
    ) -> anyhow::Result<NodeCommandResult> {
        if params.title.is_empty() {
            return Ok(NodeCommandResult {
                node: Node::default(),
                errors: vec![ValidationError::new("Title", "Title is required")],
            });
        }
        Ok(NodeCommandResult {
            node: node(MOCK_LIST_ID, &params.title, &params.description),
            errors: Vec::new(),
        })
    }
}

/// Synthesizes a node for any positive reference.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockNodeService;

impl MockNodeService {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl NodeService for MockNodeService {
    fn show_node(&self, _ctx: &ExecutionContext, params: &ShowNodeQueryParams) -> anyhow::Result<Node> {
        let reference = params.reference;
        if reference <= 0 {
            bail!("invalid node reference: {reference}");
        }
        Ok(Node {
            id: reference,
            title: format!("Node {reference}"),
            description: format!("This is node with ID {reference}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ExecutionContext {
        ExecutionContext::background()
    }

    fn tree(max_depth: i64) -> DisplayNodeTreeCommandParams {
        DisplayNodeTreeCommandParams {
            root_reference: "root".into(),
            max_depth,
        }
    }

    #[test]
    fn tree_is_truncated_to_depth_plus_one() {
        let service = MockTreeService::new();
        assert_eq!(service.display_tree(&ctx(), &tree(1)).unwrap().nodes.len(), 2);
        let full = service.display_tree(&ctx(), &tree(5)).unwrap();
        assert_eq!(full.nodes.len(), 3);
        assert_eq!(full.nodes[0].title, "Root Node");
        assert_eq!(
            full.stats,
            TreeStats {
                total_nodes: 3,
                max_depth: 2
            }
        );
    }

    #[test]
    fn tree_rejects_non_positive_depth() {
        let err = MockTreeService::new().display_tree(&ctx(), &tree(0)).unwrap_err();
        assert_eq!(err.to_string(), "max depth must be positive, got 0");
    }

    #[test]
    fn empty_title_is_a_validation_result() {
        let result = MockListService::new()
            .create_list(&ctx(), &CreateListCommandParams::default())
            .unwrap();
        assert!(!result.is_valid());
        assert_eq!(result.errors, vec![ValidationError::new("Title", "Title is required")]);
        assert_eq!(result.node, Node::default());
    }

    #[test]
    fn titled_list_gets_mock_id() {
        let params = CreateListCommandParams {
            title: "Test List".into(),
            description: "d".into(),
            parent_id: None,
        };
        let result = MockListService::new().create_list(&ctx(), &params).unwrap();
        assert!(result.is_valid());
        assert_eq!(result.node, node(42, "Test List", "d"));
    }

    #[test]
    fn show_node_synthesizes_or_rejects() {
        let service = MockNodeService::new();
        let found = service
            .show_node(&ctx(), &ShowNodeQueryParams { reference: 7 })
            .unwrap();
        assert_eq!(found, node(7, "Node 7", "This is node with ID 7"));

        let err = service
            .show_node(&ctx(), &ShowNodeQueryParams { reference: -1 })
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid node reference: -1");
    }
}
